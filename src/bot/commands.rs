use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{application::CommandOptionType, id::GuildId},
    prelude::Context,
};

use crate::error::PlaybackError;

/// Comando ya interpretado, independiente de si llegó con prefijo o como slash
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Sin consultas equivale a `resume`
    Play(Vec<String>),
    Queue { page: usize },
    Pause,
    Resume,
    Skip(i64),
    Clear,
    Reset,
    /// Porcentaje 0-200; `None` muestra el volumen actual
    Volume(Option<i64>),
    Ping,
    Help,
}

impl Command {
    /// Interpreta un mensaje de texto. `None` si no es un comando nuestro.
    pub fn parse_prefix(content: &str, prefix: &str) -> Option<Result<Self, PlaybackError>> {
        let rest = content.trim().strip_prefix(prefix)?;
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        let args = (!args.is_empty()).then_some(args);

        Self::from_parts(&name.to_lowercase(), args, None)
    }

    /// Construye el comando a partir del nombre y sus argumentos (texto o entero)
    pub fn from_parts(
        name: &str,
        text: Option<&str>,
        number: Option<i64>,
    ) -> Option<Result<Self, PlaybackError>> {
        let command = match name {
            "play" | "p" => Ok(Self::Play(text.map(split_queries).unwrap_or_default())),
            "queue" | "q" => int_arg(text, number).map(|page| Self::Queue {
                page: page.map_or(1, |p| usize::try_from(p).unwrap_or(1).max(1)),
            }),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "skip" | "s" => int_arg(text, number).map(|n| Self::Skip(n.unwrap_or(1))),
            "clear" | "stop" => Ok(Self::Clear),
            "reset" => Ok(Self::Reset),
            "volume" | "vol" => int_arg(text, number).map(Self::Volume),
            "ping" => Ok(Self::Ping),
            "help" => Ok(Self::Help),
            _ => return None,
        };
        Some(command)
    }
}

/// Separa la entrada de `play` en consultas.
///
/// Several whitespace-separated URLs form a batch; anything else is a single
/// search query, spaces included.
pub fn split_queries(input: &str) -> Vec<String> {
    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }

    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() > 1 && parts.iter().all(|p| is_url(p)) {
        parts.into_iter().map(str::to_string).collect()
    } else {
        vec![input.to_string()]
    }
}

fn is_url(candidate: &str) -> bool {
    url::Url::parse(candidate).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

fn int_arg(text: Option<&str>, number: Option<i64>) -> Result<Option<i64>, PlaybackError> {
    if number.is_some() {
        return Ok(number);
    }
    match text {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PlaybackError::InvalidArgument(format!("`{}` no es un número", raw.trim()))),
    }
}

/// Registra comandos globales
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    for command in all_commands() {
        ctx.http.create_global_command(&command).await?;
    }
    Ok(())
}

/// Registra comandos para una guild específica (desarrollo)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;
    Ok(())
}

pub fn all_commands() -> Vec<CreateCommand> {
    vec![
        play_command(),
        queue_command(),
        CreateCommand::new("pause").description("Pausa la reproducción actual"),
        CreateCommand::new("resume").description("Reanuda la reproducción pausada"),
        skip_command(),
        CreateCommand::new("clear").description("Detiene la reproducción y limpia la cola"),
        CreateCommand::new("reset").description("Reinicia el stream de la canción actual"),
        volume_command(),
        CreateCommand::new("ping").description("Comprueba que el bot responde"),
        CreateCommand::new("help").description("Muestra los comandos disponibles"),
    ]
}

fn play_command() -> CreateCommand {
    CreateCommand::new("play")
        .description("Reproduce una canción o varias URLs (sin argumento reanuda)")
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "query",
            "URL(s) o término de búsqueda",
        ))
}

fn queue_command() -> CreateCommand {
    CreateCommand::new("queue")
        .description("Muestra la cola de reproducción")
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "page", "Página a mostrar")
                .min_int_value(1),
        )
}

fn skip_command() -> CreateCommand {
    CreateCommand::new("skip")
        .description("Salta a la siguiente canción")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                "amount",
                "Número de canciones a saltar",
            )
            .min_int_value(1),
        )
}

fn volume_command() -> CreateCommand {
    CreateCommand::new("volume")
        .description("Ajusta o muestra el volumen")
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "level", "Volumen (0-200)")
                .min_int_value(0)
                .max_int_value(200),
        )
}
