use anyhow::Context;
use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::TrackResolver;
use crate::audio::track::Track;
use crate::error::{PlaybackError, Result};

/// Resolver basado en `yt-dlp`
pub struct YtDlpResolver {
    binary: String,
    timeout: Duration,
    // Limitar procesos concurrentes para evitar rate limiting
    rate_limiter: Semaphore,
}

/// Información extraída de yt-dlp
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    original_url: Option<String>,
    duration: Option<f64>,
    entries: Option<Vec<YtDlpInfo>>,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            rate_limiter: Semaphore::new(3),
        }
    }

    /// Las URLs se pasan tal cual; el resto se busca en YouTube
    fn search_term(query: &str) -> String {
        let query = query.trim();
        match url::Url::parse(query) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => query.to_string(),
            _ => format!("ytsearch1:{}", query),
        }
    }

    /// Convierte la salida JSON de yt-dlp en un Track
    fn track_from_json(query: &str, json: &str) -> Result<Track> {
        let info: YtDlpInfo = serde_json::from_str(json)
            .map_err(|e| PlaybackError::resolution(query, format!("respuesta inválida de yt-dlp: {}", e)))?;

        // Búsquedas y playlists devuelven `entries`; nos quedamos con la primera
        let info = match info.entries {
            Some(entries) => entries
                .into_iter()
                .next()
                .ok_or_else(|| PlaybackError::resolution(query, "sin resultados"))?,
            None => info,
        };

        let display_url = info
            .webpage_url
            .or(info.original_url)
            .unwrap_or_else(|| query.to_string());

        let track = Track::new(
            info.title.unwrap_or_default(),
            info.url.unwrap_or_default(),
            display_url,
        )
        .ok_or_else(|| PlaybackError::resolution(query, "sin URL reproducible"))?;

        Ok(match info.duration {
            Some(secs) if secs.is_finite() && secs > 0.0 => {
                track.with_duration(Duration::from_secs_f64(secs))
            }
            _ => track,
        })
    }

    async fn run(&self, query: &str) -> anyhow::Result<String> {
        let _permit = self.rate_limiter.acquire().await?;
        let term = Self::search_term(query);

        debug!("📊 Ejecutando yt-dlp para: {}", term);

        let output = Command::new(&self.binary)
            .args([
                "--dump-single-json",
                "--no-playlist",
                "--format",
                "bestaudio/best",
                "--no-check-certificates",
                "--force-ipv4",
                "--quiet",
                "--no-warnings",
                term.as_str(),
            ])
            .kill_on_drop(true)
            .output()
            .await
            .context("Error al ejecutar yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp error: {}", error.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Verifica que yt-dlp esté disponible
    pub async fn verify(&self) -> anyhow::Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .context("yt-dlp no está instalado")?;

        if !output.status.success() {
            anyhow::bail!("yt-dlp no responde");
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<Track> {
        info!("🔍 Resolviendo: {}", query);

        let stdout = match tokio::time::timeout(self.timeout, self.run(query)).await {
            Ok(Ok(stdout)) => stdout,
            Ok(Err(e)) => {
                warn!("❌ yt-dlp falló para {}: {}", query, e);
                return Err(PlaybackError::resolution(query, e));
            }
            Err(_) => {
                warn!("⏱️ Timeout resolviendo {}", query);
                return Err(PlaybackError::resolution(
                    query,
                    format!("tiempo de espera agotado ({}s)", self.timeout.as_secs()),
                ));
            }
        };

        Self::track_from_json(query, &stdout)
    }
}
