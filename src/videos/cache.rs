use super::models::{VideoRecord, DETAIL_RETRY_LIMIT};
use crate::upstream::{FeedItem, VideoDetail};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// All known videos keyed by id.
///
/// Records live for the process lifetime; the only form of eviction is the
/// terminal `is_normal = false` exclusion. Insertion order is kept so scans
/// with a random offset are well defined.
#[derive(Debug, Default)]
pub struct VideoCache {
    records: HashMap<String, VideoRecord>,
    order: Vec<String>,
    favorite_ids: HashSet<String>,
}

impl VideoCache {
    /// Create a cache seeded with the persisted favorite ids.
    pub fn new<I: IntoIterator<Item = String>>(favorites: I) -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            favorite_ids: favorites.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&VideoRecord> {
        self.records.get(id)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &VideoRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Insert or merge one feed item seen on `instance`.
    ///
    /// Mutable fields are overwritten; first-seen metadata is preserved. A
    /// video reappearing from a different instance than the one it was first
    /// seen on latches `seen_on_multiple_instances`.
    pub fn upsert(&mut self, item: &FeedItem, instance: &str) {
        match self.records.get_mut(&item.video_id) {
            Some(record) => {
                record.title = item.title.clone();
                record.author = item.author.clone();
                record.author_id = item.author_id.clone();
                record.length_seconds = item.length_seconds;
                record.published_at = item.published;
                record.view_count = item.view_count;
                if record.first_seen_instance != instance {
                    record.seen_on_multiple_instances = true;
                }
            }
            None => {
                self.order.push(item.video_id.clone());
                self.records.insert(
                    item.video_id.clone(),
                    VideoRecord {
                        id: item.video_id.clone(),
                        title: item.title.clone(),
                        author: item.author.clone(),
                        author_id: item.author_id.clone(),
                        length_seconds: item.length_seconds,
                        published_at: item.published,
                        view_count: item.view_count,
                        description: String::new(),
                        retry_count: 0,
                        is_normal: true,
                        manually_updated: false,
                        priority_update: false,
                        favorite: self.favorite_ids.contains(&item.video_id),
                        first_seen_instance: instance.to_string(),
                        seen_on_multiple_instances: false,
                    },
                );
            }
        }
    }

    /// Record an API-reported failure for one video's detail fetch.
    pub fn record_detail_error(&mut self, id: &str) {
        let Some(record) = self.records.get_mut(id) else {
            return;
        };
        record.retry_count += 1;
        if record.retry_count >= DETAIL_RETRY_LIMIT && record.is_normal {
            record.is_normal = false;
            info!("video {} excluded after {} api errors", id, record.retry_count);
        }
    }

    /// Apply a successful detail fetch.
    pub fn record_detail_success(&mut self, id: &str, detail: &VideoDetail) {
        let Some(record) = self.records.get_mut(id) else {
            return;
        };
        record.title = detail.title.clone();
        record.description = detail.description.clone();
        record.published_at = detail.published;
        record.view_count = detail.view_count;
        record.author = detail.author.clone();
        record.author_id = detail.author_id.clone();
        record.length_seconds = detail.length_seconds;
        record.manually_updated = true;
        record.priority_update = false;
    }

    /// Flag a video for an out-of-band detail refresh. Idempotent.
    pub fn request_priority_refresh(&mut self, id: &str) {
        if let Some(record) = self.records.get_mut(id) {
            record.priority_update = true;
        }
    }

    /// Choose one video for a detail refresh: any pending priority request
    /// first, otherwise the first stale record scanning from `start` with a
    /// single wraparound.
    pub fn detail_candidate(&self, start: usize) -> Option<&str> {
        if let Some(id) = self.order.iter().find(|id| {
            self.records
                .get(*id)
                .is_some_and(|r| r.priority_update && r.is_normal)
        }) {
            return Some(id.as_str());
        }
        if self.order.is_empty() {
            return None;
        }
        let len = self.order.len();
        (0..len)
            .map(|offset| &self.order[(start + offset) % len])
            .find(|id| {
                self.records
                    .get(*id)
                    .is_some_and(|r| !r.manually_updated && r.is_normal)
            })
            .map(String::as_str)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorite_ids.contains(id)
    }

    /// Flip the favorite flag for an id, cached record or not.
    pub fn set_favorite(&mut self, id: &str, favorite: bool) {
        if favorite {
            self.favorite_ids.insert(id.to_string());
        } else {
            self.favorite_ids.remove(id);
        }
        if let Some(record) = self.records.get_mut(id) {
            record.favorite = favorite;
        }
    }
}
