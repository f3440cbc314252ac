use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::audio::session::{SessionSettings, MAX_VOLUME, MIN_VOLUME};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub guild_id: Option<u64>, // Para comandos de desarrollo
    pub command_prefix: String,

    // Audio
    pub default_volume: f32,
    pub max_queue_size: usize,
    pub max_batch_size: usize,

    // Resolución
    pub ytdlp_path: String,
    pub resolve_timeout: u64, // En segundos

    // Cache
    pub cache_size: usize,
    pub cache_ttl: u64, // En segundos
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            // Discord
            discord_token: lookup("DISCORD_TOKEN")
                .filter(|t| !t.trim().is_empty())
                .context("DISCORD_TOKEN no está definido")?,
            guild_id: lookup("GUILD_ID").and_then(|s| s.parse().ok()),
            command_prefix: lookup("COMMAND_PREFIX")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.command_prefix),

            // Audio
            default_volume: parse_or(&lookup, "DEFAULT_VOLUME", defaults.default_volume)?,
            max_queue_size: parse_or(&lookup, "MAX_QUEUE_SIZE", defaults.max_queue_size)?,
            max_batch_size: parse_or(&lookup, "MAX_BATCH_SIZE", defaults.max_batch_size)?,

            // Resolución
            ytdlp_path: lookup("YTDLP_PATH").unwrap_or(defaults.ytdlp_path),
            resolve_timeout: parse_or(&lookup, "RESOLVE_TIMEOUT", defaults.resolve_timeout)?,

            // Cache
            cache_size: parse_or(&lookup, "CACHE_SIZE", defaults.cache_size)?,
            cache_ttl: parse_or(&lookup, "CACHE_TTL", defaults.cache_ttl)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Volume must be between 0.0 and 2.0
    /// - Queue, batch and cache sizes must be greater than 0
    /// - The resolve timeout must be at least one second
    pub fn validate(&self) -> Result<()> {
        if !(MIN_VOLUME..=MAX_VOLUME).contains(&self.default_volume) {
            anyhow::bail!(
                "Default volume must be between {} and {}, got: {}",
                MIN_VOLUME,
                MAX_VOLUME,
                self.default_volume
            );
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.max_batch_size == 0 {
            anyhow::bail!("Max batch size must be greater than 0");
        }

        if self.resolve_timeout == 0 {
            anyhow::bail!("Resolve timeout must be at least 1 second");
        }

        if self.cache_size == 0 {
            anyhow::bail!("Cache size must be greater than 0");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Sensitive values like the token are left out.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: prefix '{}' (Guild: {})\n  \
            Audio: {}% vol, {} queue, {} per batch\n  \
            Resolver: {} ({}s timeout)\n  \
            Cache: {} entries, {}s TTL",
            self.command_prefix,
            self.guild_id.map_or("global".to_string(), |id| id.to_string()),
            (self.default_volume * 100.0) as u32,
            self.max_queue_size,
            self.max_batch_size,
            self.ytdlp_path,
            self.resolve_timeout,
            self.cache_size,
            self.cache_ttl
        )
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            default_volume: self.default_volume,
            max_queue_size: self.max_queue_size,
        }
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválido: {}", key, raw)),
        _ => Ok(default),
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (el token no tiene default)
            discord_token: String::new(),
            guild_id: None,
            command_prefix: "$".to_string(),

            default_volume: 0.5,
            max_queue_size: 1000,
            max_batch_size: 25,

            ytdlp_path: "yt-dlp".to_string(),
            resolve_timeout: 30,

            cache_size: 200,
            cache_ttl: 1800, // 30 minutos
        }
    }
}
