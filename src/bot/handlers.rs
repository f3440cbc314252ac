use anyhow::Result;
use serenity::{
    builder::{
        CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage,
        EditInteractionResponse,
    },
    model::{
        application::CommandInteraction,
        channel::Message,
        id::{ChannelId, GuildId, UserId},
    },
    prelude::Context,
};
use tracing::info;

use crate::{
    audio::{session::EnqueueReport, transport::VoiceTarget},
    bot::{commands::Command, CadenceBot},
    error::PlaybackError,
    ui::embeds,
};

/// Quién invocó el comando y desde dónde
#[derive(Debug, Clone, Copy)]
pub struct Invocation {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub channel_id: ChannelId,
}

/// Maneja comandos con prefijo
pub async fn handle_message(ctx: &Context, msg: &Message, bot: &CadenceBot) -> Result<()> {
    if msg.author.bot {
        return Ok(());
    }
    let Some(parsed) = Command::parse_prefix(&msg.content, &bot.config.command_prefix) else {
        return Ok(());
    };
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    info!(
        "📝 Comando {} usado por {} en guild {}",
        msg.content.split_whitespace().next().unwrap_or_default(),
        msg.author.name,
        guild_id
    );

    let embed = match parsed {
        Ok(command) => {
            let invocation = Invocation {
                guild_id,
                user_id: msg.author.id,
                channel_id: msg.channel_id,
            };
            execute(ctx, bot, invocation, command).await
        }
        Err(e) => embeds::create_playback_error_embed(&e),
    };

    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;

    Ok(())
}

/// Maneja comandos slash
pub async fn handle_command(
    ctx: &Context,
    command: CommandInteraction,
    bot: &CadenceBot,
) -> Result<()> {
    let guild_id = command
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Comando usado fuera de un servidor"))?;

    info!(
        "📝 Comando /{} usado por {} en guild {}",
        command.data.name, command.user.name, guild_id
    );

    let text = command
        .data
        .options
        .iter()
        .find_map(|opt| opt.value.as_str());
    let number = command
        .data
        .options
        .iter()
        .find_map(|opt| opt.value.as_i64());

    let parsed = match Command::from_parts(&command.data.name, text, number) {
        Some(parsed) => parsed,
        None => {
            command
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .content("❌ Comando no reconocido")
                            .ephemeral(true),
                    ),
                )
                .await?;
            return Ok(());
        }
    };

    // Defer la respuesta ya que resolver puede tomar tiempo
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;

    let embed = match parsed {
        Ok(parsed) => {
            let invocation = Invocation {
                guild_id,
                user_id: command.user.id,
                channel_id: command.channel_id,
            };
            execute(ctx, bot, invocation, parsed).await
        }
        Err(e) => embeds::create_playback_error_embed(&e),
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().embed(embed))
        .await?;

    Ok(())
}

/// Ejecuta un comando contra la sesión de la guild y devuelve la respuesta
pub async fn execute(
    ctx: &Context,
    bot: &CadenceBot,
    invocation: Invocation,
    command: Command,
) -> CreateEmbed {
    bot.presence
        .remember_channel(invocation.guild_id, invocation.channel_id);

    match command {
        Command::Play(queries) if queries.is_empty() => handle_resume(bot, invocation).await,
        Command::Play(queries) => handle_play(ctx, bot, invocation, queries).await,
        Command::Queue { page } => handle_queue(bot, invocation, page).await,
        Command::Pause => handle_pause(bot, invocation).await,
        Command::Resume => handle_resume(bot, invocation).await,
        Command::Skip(amount) => handle_skip(bot, invocation, amount).await,
        Command::Clear => handle_clear(bot, invocation).await,
        Command::Reset => handle_reset(bot, invocation).await,
        Command::Volume(level) => handle_volume(bot, invocation, level).await,
        Command::Ping => embeds::create_info_embed("Pong!", "🏓 El bot está en línea"),
        Command::Help => embeds::create_help_embed(&bot.config.command_prefix),
    }
}

// Handlers específicos para cada comando

async fn handle_play(
    ctx: &Context,
    bot: &CadenceBot,
    invocation: Invocation,
    queries: Vec<String>,
) -> CreateEmbed {
    // Verificar que el usuario esté en un canal de voz
    let voice_channel_id =
        match get_user_voice_channel(ctx, invocation.guild_id, invocation.user_id) {
            Ok(channel_id) => channel_id,
            Err(e) => return embeds::create_error_embed("Sin canal de voz", &e.to_string()),
        };

    if queries.len() > bot.config.max_batch_size {
        return embeds::create_playback_error_embed(&PlaybackError::InvalidArgument(format!(
            "máximo {} canciones por envío",
            bot.config.max_batch_size
        )));
    }

    let session = bot.registry.get_or_create(invocation.guild_id);
    session
        .set_target(VoiceTarget {
            guild_id: invocation.guild_id,
            channel_id: voice_channel_id,
        })
        .await;

    match session.submit(bot.resolver.as_ref(), &queries).await {
        Ok(report) => play_reply(&report),
        Err(e) => embeds::create_playback_error_embed(&e),
    }
}

fn play_reply(report: &EnqueueReport) -> CreateEmbed {
    match (report.queued.as_slice(), report.failed.first()) {
        ([track], None) if report.overflow == 0 => embeds::create_track_added_embed(track),
        ([], Some(error)) if report.failed.len() == 1 && report.overflow == 0 => {
            embeds::create_playback_error_embed(error)
        }
        _ => embeds::create_batch_added_embed(report),
    }
}

async fn handle_queue(bot: &CadenceBot, invocation: Invocation, page: usize) -> CreateEmbed {
    let Some(session) = bot.registry.get(invocation.guild_id) else {
        return embeds::create_info_embed("Cola de Reproducción", "😴 **La cola está vacía**");
    };
    embeds::create_queue_embed(&session.status().await, page)
}

async fn handle_pause(bot: &CadenceBot, invocation: Invocation) -> CreateEmbed {
    let session = bot.registry.get_or_create(invocation.guild_id);
    match session.pause().await {
        Ok(()) => embeds::create_success_embed("Pausado", "⏸️ Reproducción pausada"),
        Err(e) => embeds::create_playback_error_embed(&e),
    }
}

async fn handle_resume(bot: &CadenceBot, invocation: Invocation) -> CreateEmbed {
    let session = bot.registry.get_or_create(invocation.guild_id);
    match session.resume().await {
        Ok(()) => embeds::create_success_embed("Reanudado", "▶️ Reproducción reanudada"),
        Err(e) => embeds::create_playback_error_embed(&e),
    }
}

async fn handle_skip(bot: &CadenceBot, invocation: Invocation, amount: i64) -> CreateEmbed {
    let session = bot.registry.get_or_create(invocation.guild_id);
    match session.skip(amount).await {
        Ok(outcome) => embeds::create_skip_embed(&outcome),
        Err(e) => embeds::create_playback_error_embed(&e),
    }
}

async fn handle_clear(bot: &CadenceBot, invocation: Invocation) -> CreateEmbed {
    let session = bot.registry.get_or_create(invocation.guild_id);
    match session.clear().await {
        Ok(removed) => embeds::create_success_embed(
            "Cola limpiada",
            &format!("⏹️ Reproducción detenida, {} canciones quitadas", removed),
        ),
        Err(e) => embeds::create_playback_error_embed(&e),
    }
}

/// Pausa y reanuda la pista actual para reiniciar el stream
async fn handle_reset(bot: &CadenceBot, invocation: Invocation) -> CreateEmbed {
    let session = bot.registry.get_or_create(invocation.guild_id);
    let result = match session.pause().await {
        Ok(()) => session.resume().await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => embeds::create_success_embed("Reset", "🔄 Stream reiniciado"),
        Err(e) => embeds::create_playback_error_embed(&e),
    }
}

async fn handle_volume(bot: &CadenceBot, invocation: Invocation, level: Option<i64>) -> CreateEmbed {
    let session = bot.registry.get_or_create(invocation.guild_id);

    let Some(level) = level else {
        return embeds::create_volume_embed(session.volume().await);
    };

    let volume = level as f32 / 100.0;
    match session.set_volume(volume).await {
        Ok(()) => embeds::create_volume_embed(volume),
        Err(e) => embeds::create_playback_error_embed(&e),
    }
}

// Funciones auxiliares

fn get_user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Result<ChannelId> {
    let guild = guild_id
        .to_guild_cached(&ctx.cache)
        .ok_or_else(|| anyhow::anyhow!("Guild no encontrada en caché"))?;

    let channel_id = guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or_else(|| anyhow::anyhow!("Debes estar en un canal de voz"))?;

    Ok(channel_id)
}
