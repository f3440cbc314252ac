use dashmap::DashMap;
use parking_lot::RwLock;
use serenity::{
    all::{ActivityData, ChannelId, Context, GuildId},
    builder::{CreateEmbed, CreateMessage},
};
use tracing::{debug, warn};

use crate::audio::track::Track;
use crate::audio::transport::PlaybackObserver;
use crate::error::PlaybackError;
use crate::ui::embeds;

/// Presencia del bot y anuncios en el canal de texto de cada guild.
///
/// Discord calls are spawned onto the runtime; the session never waits for
/// them and a failed message is only logged.
#[derive(Default)]
pub struct DiscordPresence {
    ctx: RwLock<Option<Context>>,
    channels: DashMap<GuildId, ChannelId>,
}

impl DiscordPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Se llama desde `ready`, cuando ya existe un contexto
    pub fn attach(&self, ctx: Context) {
        *self.ctx.write() = Some(ctx);
    }

    /// Canal de texto donde se anunciará lo que suene en la guild
    pub fn remember_channel(&self, guild_id: GuildId, channel_id: ChannelId) {
        self.channels.insert(guild_id, channel_id);
    }

    pub fn channel_for(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.channels.get(&guild_id).map(|c| *c.value())
    }

    fn post(&self, guild_id: GuildId, embed: CreateEmbed) {
        let Some(ctx) = self.ctx.read().clone() else {
            debug!("Sin contexto todavía, anuncio descartado");
            return;
        };
        let Some(channel_id) = self.channel_for(guild_id) else {
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = channel_id
                .send_message(&ctx, CreateMessage::new().embed(embed))
                .await
            {
                warn!("⚠️ No se pudo enviar anuncio a {}: {:?}", channel_id, e);
            }
        });
    }
}

impl PlaybackObserver for DiscordPresence {
    fn announce(&self, guild_id: GuildId, track: &Track) {
        if let Some(ctx) = self.ctx.read().as_ref() {
            ctx.set_activity(Some(ActivityData::listening(track.title())));
        }
        self.post(guild_id, embeds::create_now_playing_embed(track));
    }

    fn clear_announcement(&self, _guild_id: GuildId) {
        if let Some(ctx) = self.ctx.read().as_ref() {
            ctx.set_activity(None);
        }
    }

    fn report_error(&self, guild_id: GuildId, error: &PlaybackError) {
        self.post(guild_id, embeds::create_playback_error_embed(error));
    }
}
