//! # Bot Module
//!
//! Discord command surface for Cadence.
//!
//! The bot is built around the [`CadenceBot`] struct which implements
//! Serenity's [`EventHandler`] trait. It translates prefix commands
//! (`$play`, `$skip 2`, ...) and slash commands into calls on the guild's
//! [`PlaybackSession`](crate::audio::session::PlaybackSession) and renders the
//! outcome as an embed. It never touches voice connections itself: those are
//! owned by the session worker through the registry's transport.

use serenity::{
    all::{Context, EventHandler, Interaction, Message, Ready, VoiceState},
    async_trait,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

pub mod commands;
pub mod handlers;
pub mod presence;

use crate::{
    audio::registry::SessionRegistry, cache::TrackCache, config::Config, sources::TrackResolver,
};
use presence::DiscordPresence;

/// Main Discord bot handler.
///
/// ## Fields
///
/// - `config`: Bot configuration (prefix, limits)
/// - `registry`: one playback session per guild
/// - `resolver`: turns queries into playable tracks
/// - `cache`: resolver cache, purged by the maintenance task
/// - `presence`: "Listening to" activity and announcements
pub struct CadenceBot {
    config: Arc<Config>,
    registry: Arc<SessionRegistry>,
    resolver: Arc<dyn TrackResolver>,
    cache: TrackCache,
    presence: Arc<DiscordPresence>,
    maintenance_started: AtomicBool,
}

impl CadenceBot {
    pub fn new(
        config: Config,
        registry: Arc<SessionRegistry>,
        resolver: Arc<dyn TrackResolver>,
        cache: TrackCache,
        presence: Arc<DiscordPresence>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            resolver,
            cache,
            presence,
            maintenance_started: AtomicBool::new(false),
        }
    }

    async fn register_commands(&self, ctx: &Context) -> anyhow::Result<()> {
        match self.config.guild_id {
            Some(guild_id) => {
                commands::register_guild_commands(ctx, guild_id.into()).await?;
                info!("✅ Comandos registrados en guild {}", guild_id);
            }
            None => {
                commands::register_global_commands(ctx).await?;
                info!("✅ Comandos globales registrados");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for CadenceBot {
    /// Registers commands, attaches the presence sink and starts the
    /// maintenance task (only on the first `ready`).
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        self.presence.attach(ctx.clone());

        // Registrar comandos
        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }

        // Iniciar tareas de mantenimiento
        if !self.maintenance_started.swap(true, Ordering::SeqCst) {
            let cache = self.cache.clone();
            let registry = self.registry.clone();
            tokio::spawn(async move {
                maintenance_tasks(cache, registry).await;
            });
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if let Err(e) = handlers::handle_message(&ctx, &msg, self).await {
            error!("Error manejando mensaje: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command_interaction) = interaction {
            if let Err(e) = handlers::handle_command(&ctx, command_interaction, self).await {
                error!("Error manejando comando: {:?}", e);
            }
        }
    }

    /// When the bot is removed from voice externally the session is torn down
    /// so its worker releases the dead connection.
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || old.is_none() || new.channel_id.is_some() {
            return;
        }

        let Some(guild_id) = new.guild_id else {
            return;
        };
        info!("🔌 Bot desconectado en guild {}", guild_id);

        if !self.registry.remove(guild_id).await {
            debug!("Sin sesión activa en guild {}", guild_id);
        }
    }
}

/// Runs every hour: purges expired resolver entries and logs cache stats.
async fn maintenance_tasks(cache: TrackCache, registry: Arc<SessionRegistry>) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600)); // Cada hora

    loop {
        interval.tick().await;

        // Limpiar caché viejo
        cache.cleanup_old_entries();

        let metrics = cache.metrics();
        info!(
            "🧹 Mantenimiento: {} entradas en caché ({:.0}% aciertos), {} sesiones",
            cache.len(),
            metrics.hit_rate() * 100.0,
            registry.len()
        );
    }
}
