use anyhow::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::thread_rng;
use serenity::{
    builder::CreateMessage,
    http::Http,
    model::id::{ChannelId, GuildId},
};
use songbird::{tracks::TrackHandle, Call, Event, EventContext, EventHandler as VoiceEventHandler, TrackEvent};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    audio::queue::{GuildQueue, QueueInfo, QueueItem},
    sources::TrackSource,
    ui::embeds,
};

/// What happened to a track handed to [`AudioPlayer::enqueue`].
#[derive(Debug, Clone)]
pub enum EnqueueOutcome {
    /// The guild was idle, so the track started right away.
    Started(QueueItem),
    /// The track waits behind others at this 1-based position.
    Queued(usize),
}

/// Per-guild queues and the songbird track currently playing in each guild.
///
/// Every transition (enqueue, skip, natural track end) runs under the guild's
/// transition lock, so a track end racing a `/skip` advances the queue once.
#[derive(Clone)]
pub struct AudioPlayer {
    queues: Arc<DashMap<GuildId, Arc<Mutex<GuildQueue>>>>,
    current_tracks: Arc<DashMap<GuildId, TrackHandle>>,
    transitions: Arc<DashMap<GuildId, Arc<tokio::sync::Mutex<()>>>>,
    max_queue_size: usize,
    http_client: reqwest::Client,
}

impl AudioPlayer {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            queues: Arc::new(DashMap::new()),
            current_tracks: Arc::new(DashMap::new()),
            transitions: Arc::new(DashMap::new()),
            max_queue_size,
            http_client: reqwest::Client::new(),
        }
    }

    /// Agrega a la cola y reproduce si no hay nada sonando
    pub async fn enqueue(
        &self,
        guild_id: GuildId,
        source: TrackSource,
        announce_channel: ChannelId,
        call: Arc<tokio::sync::Mutex<Call>>,
        http: Arc<Http>,
    ) -> Result<EnqueueOutcome> {
        let transition = self.transition_lock(guild_id);
        let _guard = transition.lock().await;
        let queue = self.get_or_create_queue(guild_id);

        let (position, to_start) = {
            let mut q = queue.lock();
            let position = q.push(source)?;
            q.set_announce_channel(announce_channel);
            let to_start = if q.is_idle() { q.advance().cloned() } else { None };
            (position, to_start)
        };

        match to_start {
            Some(item) => {
                self.start_track(guild_id, &item, call, http).await;
                Ok(EnqueueOutcome::Started(item))
            }
            None => Ok(EnqueueOutcome::Queued(position)),
        }
    }

    /// Reproduce la siguiente canción en la cola
    ///
    /// Returns the entry that started, or `None` when the queue ran out.
    /// Callers must hold the guild's transition lock.
    async fn play_next(
        &self,
        guild_id: GuildId,
        call: Arc<tokio::sync::Mutex<Call>>,
        http: Arc<Http>,
    ) -> Result<Option<QueueItem>> {
        let next = match self.queues.get(&guild_id) {
            Some(queue) => queue.lock().advance().cloned(),
            None => None,
        };

        match next {
            Some(item) => {
                self.start_track(guild_id, &item, call, http).await;
                Ok(Some(item))
            }
            None => {
                self.stop_current(guild_id);
                debug!("Cola vacía para guild {}", guild_id);
                Ok(None)
            }
        }
    }

    /// Salta a la siguiente canción
    pub async fn skip(
        &self,
        guild_id: GuildId,
        call: Arc<tokio::sync::Mutex<Call>>,
        http: Arc<Http>,
    ) -> Result<Option<QueueItem>> {
        let transition = self.transition_lock(guild_id);
        let _guard = transition.lock().await;
        let next = self.play_next(guild_id, call, http).await?;
        info!("⏭️ Track saltado en guild {}", guild_id);
        Ok(next)
    }

    /// Mezcla las canciones pendientes
    pub fn shuffle(&self, guild_id: GuildId) -> usize {
        match self.queues.get(&guild_id) {
            Some(queue) => queue.lock().shuffle(&mut thread_rng()),
            None => 0,
        }
    }

    /// Detiene la reproducción y elimina la cola del guild
    pub fn stop(&self, guild_id: GuildId) {
        if let Some((_, queue)) = self.queues.remove(&guild_id) {
            queue.lock().clear();
        }
        self.stop_current(guild_id);

        info!("⏹️ Reproducción detenida en guild {}", guild_id);
    }

    pub fn queue_info(&self, guild_id: GuildId) -> QueueInfo {
        self.queues
            .get(&guild_id)
            .map(|queue| queue.lock().snapshot())
            .unwrap_or_default()
    }

    /// Called from the songbird event handler when a track ends or fails.
    ///
    /// Events from tracks that were already replaced (skip) or stopped are
    /// ignored, so a queue never advances twice for one transition.
    async fn on_track_end(
        &self,
        guild_id: GuildId,
        ended: &TrackHandle,
        failed: bool,
        call: Arc<tokio::sync::Mutex<Call>>,
        http: Arc<Http>,
    ) -> Result<()> {
        let (channel, finished, next) = {
            let transition = self.transition_lock(guild_id);
            let _guard = transition.lock().await;

            let was_current = self
                .current_tracks
                .remove_if(&guild_id, |_, current| current.uuid() == ended.uuid())
                .is_some();

            if !was_current {
                debug!("Evento de track obsoleto ignorado en guild {}", guild_id);
                return Ok(());
            }

            let (channel, finished) = match self.queues.get(&guild_id) {
                Some(queue) => {
                    let q = queue.lock();
                    (q.announce_channel(), q.current().cloned())
                }
                None => return Ok(()),
            };

            let next = self.play_next(guild_id, call, http.clone()).await?;
            (channel, finished, next)
        };

        if failed {
            if let (Some(channel), Some(item)) = (channel, finished.as_ref()) {
                let message = CreateMessage::new().embed(embeds::create_playback_error_embed(item));
                if let Err(e) = channel.send_message(&http, message).await {
                    error!("Error al avisar fallo de reproducción: {:?}", e);
                }
            }
        }

        if let Some(next) = next {
            if let Some(channel) = channel {
                let message = CreateMessage::new().embed(embeds::create_now_playing_embed(&next));
                if let Err(e) = channel.send_message(&http, message).await {
                    error!("Error al enviar mensaje now playing: {:?}", e);
                }
            }
        }

        Ok(())
    }

    async fn start_track(
        &self,
        guild_id: GuildId,
        item: &QueueItem,
        call: Arc<tokio::sync::Mutex<Call>>,
        http: Arc<Http>,
    ) {
        info!("🎵 Reproduciendo: {} en guild {}", item.title, guild_id);

        let input = item.source.input(self.http_client.clone());
        let track_handle = {
            let mut call_lock = call.lock().await;
            call_lock.play_input(input)
        };

        for (event, failed) in [(TrackEvent::End, false), (TrackEvent::Error, true)] {
            let handler = TrackEndHandler {
                player: self.clone(),
                guild_id,
                call: call.clone(),
                http: http.clone(),
                failed,
            };
            if let Err(e) = track_handle.add_event(Event::Track(event), handler) {
                warn!("Error al agregar event handler: {}", e);
            }
        }

        if let Some(previous) = self.current_tracks.insert(guild_id, track_handle) {
            let _ = previous.stop();
        }
    }

    fn stop_current(&self, guild_id: GuildId) {
        if let Some((_, track)) = self.current_tracks.remove(&guild_id) {
            let _ = track.stop();
        }
    }

    fn transition_lock(&self, guild_id: GuildId) -> Arc<tokio::sync::Mutex<()>> {
        self.transitions.entry(guild_id).or_default().clone()
    }

    fn get_or_create_queue(&self, guild_id: GuildId) -> Arc<Mutex<GuildQueue>> {
        self.queues
            .entry(guild_id)
            .or_insert_with(|| Arc::new(Mutex::new(GuildQueue::new(self.max_queue_size))))
            .clone()
    }
}

/// Handler para cuando termina o falla una canción
struct TrackEndHandler {
    player: AudioPlayer,
    guild_id: GuildId,
    call: Arc<tokio::sync::Mutex<Call>>,
    http: Arc<Http>,
    failed: bool,
}

#[async_trait::async_trait]
impl VoiceEventHandler for TrackEndHandler {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(track_list) = ctx {
            for (state, handle) in *track_list {
                if self.failed {
                    warn!(
                        "❌ Error en track para guild {}: {:?}",
                        self.guild_id, state.playing
                    );
                }

                if let Err(e) = self
                    .player
                    .on_track_end(
                        self.guild_id,
                        handle,
                        self.failed,
                        self.call.clone(),
                        self.http.clone(),
                    )
                    .await
                {
                    error!("Error al reproducir siguiente track: {:?}", e);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::model::id::UserId;

    // An unconnected call never drives its tracks, so no end events fire.
    fn idle_call() -> Arc<tokio::sync::Mutex<Call>> {
        Arc::new(tokio::sync::Mutex::new(Call::standalone(
            GuildId::new(1),
            UserId::new(2),
        )))
    }

    fn current_handle(player: &AudioPlayer, guild: GuildId) -> Option<TrackHandle> {
        player.current_tracks.get(&guild).map(|track| track.clone())
    }

    fn track(title: &str) -> TrackSource {
        TrackSource::new(title.to_string(), format!("https://youtu.be/{}", title), UserId::new(1))
    }

    #[test]
    fn test_stop_then_queue_is_empty() {
        let player = AudioPlayer::new(10);
        let guild = GuildId::new(1);
        {
            let queue = player.get_or_create_queue(guild);
            let mut q = queue.lock();
            q.push(track("t1")).unwrap();
            q.push(track("t2")).unwrap();
            q.advance();
        }
        assert!(!player.queue_info(guild).is_empty());

        player.stop(guild);

        assert!(player.queue_info(guild).is_empty());
        assert!(player.queue_info(guild).current.is_none());
    }

    #[test]
    fn test_guild_queues_are_independent() {
        let player = AudioPlayer::new(10);
        player
            .get_or_create_queue(GuildId::new(1))
            .lock()
            .push(track("t1"))
            .unwrap();

        assert_eq!(player.queue_info(GuildId::new(1)).items.len(), 1);
        assert!(player.queue_info(GuildId::new(2)).is_empty());
        assert_eq!(player.shuffle(GuildId::new(2)), 0);
    }

    #[tokio::test]
    async fn test_enqueue_starts_first_and_queues_the_rest() {
        let player = AudioPlayer::new(10);
        let guild = GuildId::new(1);
        let (call, http) = (idle_call(), Arc::new(Http::new("")));
        let channel = ChannelId::new(3);

        let first = player
            .enqueue(guild, track("t1"), channel, call.clone(), http.clone())
            .await
            .unwrap();
        let second = player
            .enqueue(guild, track("t2"), channel, call.clone(), http.clone())
            .await
            .unwrap();
        let third = player
            .enqueue(guild, track("t3"), channel, call.clone(), http.clone())
            .await
            .unwrap();

        assert!(matches!(first, EnqueueOutcome::Started(ref item) if item.title == "t1"));
        assert!(matches!(second, EnqueueOutcome::Queued(1)));
        assert!(matches!(third, EnqueueOutcome::Queued(2)));
        assert!(current_handle(&player, guild).is_some());
    }

    #[tokio::test]
    async fn test_skip_advances_and_stale_end_is_ignored() {
        let player = AudioPlayer::new(10);
        let guild = GuildId::new(1);
        let (call, http) = (idle_call(), Arc::new(Http::new("")));
        for title in ["t1", "t2", "t3"] {
            player
                .enqueue(guild, track(title), ChannelId::new(3), call.clone(), http.clone())
                .await
                .unwrap();
        }
        let first_handle = current_handle(&player, guild).unwrap();

        let skipped_to = player.skip(guild, call.clone(), http.clone()).await.unwrap();
        assert_eq!(skipped_to.unwrap().title, "t2");
        let skipped_to = player.skip(guild, call.clone(), http.clone()).await.unwrap();
        assert_eq!(skipped_to.unwrap().title, "t3");

        let info = player.queue_info(guild);
        assert_eq!(info.current.as_ref().unwrap().title, "t3");
        assert!(info.items.is_empty());
        let playing = current_handle(&player, guild).unwrap();
        assert_ne!(playing.uuid(), first_handle.uuid());

        // Late end event for t1 must not advance past t3.
        player
            .on_track_end(guild, &first_handle, false, call.clone(), http.clone())
            .await
            .unwrap();

        let info = player.queue_info(guild);
        assert_eq!(info.current.unwrap().title, "t3");
        assert!(info.items.is_empty());
        assert_eq!(current_handle(&player, guild).map(|t| t.uuid()), Some(playing.uuid()));
    }

    #[tokio::test]
    async fn test_skip_on_last_track_empties_playback() {
        let player = AudioPlayer::new(10);
        let guild = GuildId::new(1);
        let (call, http) = (idle_call(), Arc::new(Http::new("")));
        player
            .enqueue(guild, track("t1"), ChannelId::new(3), call.clone(), http.clone())
            .await
            .unwrap();

        let next = player.skip(guild, call, http).await.unwrap();

        assert!(next.is_none());
        assert!(current_handle(&player, guild).is_none());
        assert!(player.queue_info(guild).is_empty());
    }
}
