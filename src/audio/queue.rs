use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng};
use serenity::model::id::{ChannelId, UserId};
use std::{collections::VecDeque, time::Duration};
use tracing::info;

use crate::sources::TrackSource;

#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub source: TrackSource,
    pub title: String,
    pub url: String,
    pub requested_by: UserId,
    pub duration: Option<Duration>,
    pub added_at: DateTime<Utc>,
}

impl From<TrackSource> for QueueItem {
    fn from(source: TrackSource) -> Self {
        Self {
            title: source.title().to_string(),
            url: source.url().to_string(),
            requested_by: source.requested_by(),
            duration: source.duration(),
            added_at: Utc::now(),
            source,
        }
    }
}

/// One guild's playback queue: the now-playing entry plus pending entries in
/// FIFO order.
#[derive(Debug)]
pub struct GuildQueue {
    current: Option<QueueItem>,
    pending: VecDeque<QueueItem>,
    max_size: usize,
    announce_channel: Option<ChannelId>,
}

impl GuildQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            current: None,
            pending: VecDeque::new(),
            max_size,
            announce_channel: None,
        }
    }

    /// Appends a track and returns its 1-based position among pending entries.
    pub fn push(&mut self, source: TrackSource) -> Result<usize> {
        if self.pending.len() >= self.max_size {
            anyhow::bail!("The queue is full (max {} tracks)", self.max_size);
        }

        let item = QueueItem::from(source);
        info!("➕ Agregado a la cola: {}", item.title);
        self.pending.push_back(item);

        Ok(self.pending.len())
    }

    /// Moves the next pending entry into the now-playing slot.
    ///
    /// The previous now-playing entry is dropped. When nothing is pending the
    /// queue ends up idle and `None` is returned.
    pub fn advance(&mut self) -> Option<&QueueItem> {
        self.current = self.pending.pop_front();
        match &self.current {
            Some(item) => info!("➡️ Siguiente en cola: {}", item.title),
            None => info!("📭 Cola vacía, no hay siguiente track"),
        }
        self.current.as_ref()
    }

    /// Randomizes pending entries; the now-playing entry is untouched.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        self.pending.make_contiguous().shuffle(rng);
        info!("🔀 Cola mezclada ({} canciones)", self.pending.len());
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.pending.clear();
        info!("🗑️ Cola limpiada");
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.current.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    pub fn announce_channel(&self) -> Option<ChannelId> {
        self.announce_channel
    }

    pub fn set_announce_channel(&mut self, channel_id: ChannelId) {
        self.announce_channel = Some(channel_id);
    }

    pub fn snapshot(&self) -> QueueInfo {
        QueueInfo {
            current: self.current.clone(),
            items: self.pending.iter().cloned().collect(),
            total_duration: self.total_duration(),
        }
    }

    fn total_duration(&self) -> Duration {
        self.current
            .iter()
            .chain(self.pending.iter())
            .filter_map(|item| item.duration)
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueueInfo {
    pub current: Option<QueueItem>,
    pub items: Vec<QueueItem>,
    pub total_duration: Duration,
}

impl QueueInfo {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.items.is_empty()
    }

    /// Obtiene una página específica de la cola
    pub fn get_page(&self, page: usize, items_per_page: usize) -> QueuePage {
        let safe_page = page.max(1);
        let start = (safe_page - 1) * items_per_page;
        let end = (start + items_per_page).min(self.items.len());
        let total_pages = self.items.len().div_ceil(items_per_page).max(1);

        QueuePage {
            items: if start < self.items.len() {
                self.items[start..end].to_vec()
            } else {
                Vec::new()
            },
            first_position: start + 1,
            current_page: safe_page,
            total_pages,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueuePage {
    pub items: Vec<QueueItem>,
    pub first_position: usize,
    pub current_page: usize,
    pub total_pages: usize,
}
