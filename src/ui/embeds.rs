use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};
use std::time::Duration;

use crate::audio::queue;
use crate::audio::session::{EnqueueReport, SessionStatus, SkipOutcome};
use crate::audio::track::Track;
use crate::error::PlaybackError;

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const WARNING_ORANGE: Colour = Colour::from_rgb(255, 193, 7);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Cadence";

const ITEMS_PER_PAGE: usize = 10;

/// Anuncio de la pista que empieza a sonar
pub fn create_now_playing_embed(track: &Track) -> CreateEmbed {
    CreateEmbed::default()
        .title("🎵 Reproduciendo Ahora")
        .description(format!("**{}**", track.title()))
        .url(track.display_url())
        .color(colors::MUSIC_PURPLE)
        .field("⏱️ Duración", duration_label(track.duration()), true)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed para mostrar que se agregó una canción
pub fn create_track_added_embed(track: &Track) -> CreateEmbed {
    CreateEmbed::default()
        .title("✅ Canción Agregada")
        .description(format!(
            "**{}** se ha agregado a la cola de reproducción",
            track.title()
        ))
        .url(track.display_url())
        .color(colors::SUCCESS_GREEN)
        .field("⏱️ Duración", duration_label(track.duration()), true)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(
            "🎵 Se reproducirá automáticamente si no hay música sonando",
        ))
}

/// Resultado de un envío de varias canciones
pub fn create_batch_added_embed(report: &EnqueueReport) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("📥 Canciones Agregadas")
        .description(format!("**{}** canciones agregadas a la cola", report.queued.len()))
        .color(if report.failed.is_empty() && report.overflow == 0 {
            colors::SUCCESS_GREEN
        } else {
            colors::WARNING_ORANGE
        });

    if !report.queued.is_empty() {
        let list = report
            .queued
            .iter()
            .take(ITEMS_PER_PAGE)
            .enumerate()
            .map(|(i, t)| format!("**{}**. {}", i + 1, t.title()))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("🎶 Agregadas", list, false);
    }

    if !report.failed.is_empty() {
        embed = embed.field("⚠️ No encontradas", report.failed.len().to_string(), true);
    }

    if report.overflow > 0 {
        embed = embed.field("📦 Sin espacio en la cola", report.overflow.to_string(), true);
    }

    embed
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed para mostrar la cola de reproducción
pub fn create_queue_embed(status: &SessionStatus, page: usize) -> CreateEmbed {
    if status.now_playing.is_none() && status.queue.is_empty() {
        return CreateEmbed::default()
            .title("📋 Cola de Reproducción")
            .description("😴 **La cola está vacía**")
            .color(colors::NEUTRAL_GRAY)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
            .timestamp(Timestamp::now());
    }

    // Entre dos pistas, o tras un fallo de conexión, puede haber cola sin pista actual
    let mut embed = match &status.now_playing {
        Some(current) => {
            let state = if status.paused { "⏸️" } else { "▶️" };
            CreateEmbed::default()
                .title(format!("{} Reproduciendo: {}", state, current.title()))
                .url(current.display_url())
        }
        None => CreateEmbed::default().title("📋 Cola de Reproducción"),
    }
    .color(colors::INFO_BLUE);

    let queue_page = queue::page(&status.queue, page, ITEMS_PER_PAGE);

    if queue_page.items.is_empty() {
        embed = embed.description("No hay más canciones en cola");
    } else {
        let description = queue_page
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let duration = item
                    .duration()
                    .map(|d| format!(" `[{}]`", format_duration(d)))
                    .unwrap_or_default();
                format!(
                    "**{}**. [{}]({}){}",
                    queue_page.first_position + i,
                    item.title(),
                    item.display_url(),
                    duration
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.description(description);
    }

    let mut info = format!(
        "**Total:** {} canciones • **Volumen:** {}%",
        status.queue.len(),
        volume_percent(status.volume)
    );
    let total: Duration = status.queue.iter().filter_map(|t| t.duration()).sum();
    if total > Duration::ZERO {
        info.push_str(&format!(" • **Duración:** {}", format_duration(total)));
    }
    embed = embed.field("Información", info, false);

    // Paginación
    if queue_page.total_pages > 1 {
        embed = embed.footer(CreateEmbedFooter::new(format!(
            "Página {} de {} • Cadence",
            queue_page.current_page, queue_page.total_pages
        )));
    } else {
        embed = embed.footer(CreateEmbedFooter::new(STANDARD_FOOTER));
    }

    embed.timestamp(Timestamp::now())
}

pub fn create_skip_embed(outcome: &SkipOutcome) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title(format!("⏭️ Saltado: {}", outcome.stopped.title()))
        .url(outcome.stopped.display_url())
        .color(colors::INFO_BLUE);

    if outcome.dropped > 0 {
        embed = embed.description(format!(
            "También se quitaron **{}** canciones de la cola",
            outcome.dropped
        ));
    }

    embed
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed de volumen con indicador visual
pub fn create_volume_embed(volume: f32) -> CreateEmbed {
    let percent = volume_percent(volume);
    let status_emoji = if percent == 0 {
        "🔈"
    } else if percent <= 50 {
        "🔉"
    } else {
        "🔊"
    };

    CreateEmbed::default()
        .title(format!("{} Volumen: {}%", status_emoji, percent))
        .field("📊 Nivel", create_volume_bar(volume), false)
        .color(colors::INFO_BLUE)
        .footer(CreateEmbedFooter::new("💡 Rango 0-200 (100 = normal)"))
        .timestamp(Timestamp::now())
}

/// Barra visual: cada segmento es un 10%
fn create_volume_bar(volume: f32) -> String {
    let segments = 20;
    let filled = ((volume / 2.0) * segments as f32).round().clamp(0.0, segments as f32) as usize;
    let empty = segments - filled;

    format!("`[{}{}]`", "█".repeat(filled), "▒".repeat(empty))
}

/// Crea un embed de ayuda general
pub fn create_help_embed(prefix: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("🎵 Cadence - Comandos")
        .color(colors::INFO_BLUE)
        .description(format!(
            "Disponibles como `/comando` o con el prefijo `{}`",
            prefix
        ))
        .field(
            "🎵 Reproducción",
            format!(
                "• `{p}play <canción o URLs>` - Agrega a la cola (sin argumento reanuda)\n\
                • `{p}pause` - Pausa la reproducción\n\
                • `{p}resume` - Reanuda la reproducción\n\
                • `{p}skip [cantidad]` - Salta canciones\n\
                • `{p}clear` - Detiene y limpia la cola\n\
                • `{p}reset` - Reinicia el stream actual",
                p = prefix
            ),
            false,
        )
        .field(
            "📜 Cola y Audio",
            format!(
                "• `{p}queue [página]` - Muestra la cola\n\
                • `{p}volume [0-200]` - Ajusta o muestra el volumen\n\
                • `{p}ping` - Comprueba que el bot responde",
                p = prefix
            ),
            false,
        )
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
        .timestamp(Timestamp::now())
}

/// Crea un embed de error
pub fn create_error_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("❌ {}", title))
        .description(description)
        .color(colors::ERROR_RED)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed de éxito
pub fn create_success_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("✅ {}", title))
        .description(description)
        .color(colors::SUCCESS_GREEN)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed de información
pub fn create_info_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("ℹ️ {}", title))
        .description(description)
        .color(colors::INFO_BLUE)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Traduce un error del núcleo a un mensaje para el usuario
pub fn create_playback_error_embed(error: &PlaybackError) -> CreateEmbed {
    let title = match error {
        PlaybackError::InvalidArgument(_) => "Argumento inválido",
        PlaybackError::NothingPlaying => "Nada reproduciéndose",
        PlaybackError::NotPaused => "No está pausado",
        PlaybackError::Resolution { .. } => "Canción no encontrada",
        PlaybackError::Connect(_) => "Error de conexión",
        PlaybackError::Transport(_) => "Error de reproducción",
        PlaybackError::QueueFull(_) => "Cola llena",
    };
    create_error_embed(title, &error.to_string())
}

fn duration_label(duration: Option<Duration>) -> String {
    duration
        .map(format_duration)
        .unwrap_or_else(|| "🔴 En vivo".to_string())
}

fn volume_percent(volume: f32) -> u32 {
    (volume * 100.0).round() as u32
}

/// Formatea una duración en formato legible
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
