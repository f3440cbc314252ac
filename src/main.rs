use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

mod audio;
mod bot;
mod cache;
mod config;
mod error;
mod sources;
mod ui;

use crate::audio::registry::SessionRegistry;
use crate::audio::songbird_transport::SongbirdTransport;
use crate::bot::{presence::DiscordPresence, CadenceBot};
use crate::cache::TrackCache;
use crate::config::Config;
use crate::sources::{CachingResolver, YtDlpResolver};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cadence=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Cadence v{}", env!("CARGO_PKG_VERSION"));

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    // Resolver con caché
    let cache = TrackCache::new(config.cache_size, config.cache_ttl());
    let ytdlp = YtDlpResolver::new(config.ytdlp_path.clone(), config.resolve_timeout());
    match ytdlp.verify().await {
        Ok(version) => info!("✅ yt-dlp {}", version),
        Err(e) => error!("❌ {:?}", e),
    }
    let resolver = Arc::new(CachingResolver::new(ytdlp, cache.clone()));

    // Transporte de voz y sesiones
    let manager = Songbird::serenity();
    let transport = Arc::new(SongbirdTransport::new(manager.clone()));
    let presence = Arc::new(DiscordPresence::new());
    let registry = Arc::new(SessionRegistry::new(
        transport,
        presence.clone(),
        config.session_settings(),
    ));

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord_token.clone();
    let handler = CadenceBot::new(config, registry, resolver, cache, presence);

    // Construir cliente
    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .register_songbird_with(manager)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Error al registrar Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Señal de shutdown recibida, cerrando...");
        shard_manager.shutdown_all().await;
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check() -> Result<()> {
    // Verificar dependencias críticas
    let ytdlp_path = std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string());
    let resolver = YtDlpResolver::new(ytdlp_path, std::time::Duration::from_secs(10));

    match resolver.verify().await {
        Ok(_) => {
            println!("OK");
            Ok(())
        }
        Err(e) => anyhow::bail!("Dependencias faltantes: {}", e),
    }
}
