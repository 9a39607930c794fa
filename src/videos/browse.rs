use super::cache::VideoCache;
use std::collections::HashSet;
use tracing::warn;

/// Derived, ordered, deduplicated id sequences backing the UI feeds.
#[derive(Debug, Default)]
pub struct BrowseLists {
    popular: Vec<String>,
    subscriptions: Vec<String>,
    search_videos: Vec<String>,
    /// Channel search has no specified upstream shape yet; the list exists
    /// as an extension point and stays empty.
    search_channels: Vec<String>,
}

impl BrowseLists {
    pub fn popular(&self) -> &[String] {
        &self.popular
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn search_videos(&self) -> &[String] {
        &self.search_videos
    }

    pub fn search_channels(&self) -> &[String] {
        &self.search_channels
    }

    /// Merge one instance's popular feed into the popular list.
    ///
    /// The union of the existing list and the fetched ids is unordered, so
    /// the ordering is recomputed wholesale from the cache rather than
    /// merged in place.
    pub fn merge_popular(&mut self, fetched: &[String], cache: &VideoCache) {
        let mut seen: HashSet<String> = self.popular.iter().cloned().collect();
        let mut merged = self.popular.clone();
        for id in fetched {
            if seen.insert(id.clone()) {
                merged.push(id.clone());
            }
        }
        self.popular = order_by_publish_date(merged, cache);
    }

    /// Recompute the subscriptions feed from every cached upload of the
    /// subscribed channels.
    pub fn rebuild_subscriptions(&mut self, subscribed: &HashSet<String>, cache: &VideoCache) {
        let ids = cache
            .iter()
            .filter(|record| subscribed.contains(&record.author_id))
            .map(|record| record.id.clone())
            .collect();
        self.subscriptions = order_by_publish_date(ids, cache);
    }

    /// Replace the search results list with a fresh batch of ids.
    pub fn set_search_videos(&mut self, ids: Vec<String>, cache: &VideoCache) {
        let mut seen = HashSet::new();
        let mut deduped = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.insert(id.clone()) {
                deduped.push(id);
            }
        }
        self.search_videos = order_by_publish_date(deduped, cache);
    }
}

/// Publish-date-descending ordering over ids resolved through the cache.
///
/// An id missing from the cache is a consistency violation: logged and
/// skipped, never fatal. Excluded records are purged.
fn order_by_publish_date(ids: Vec<String>, cache: &VideoCache) -> Vec<String> {
    let mut entries: Vec<(String, i64)> = Vec::with_capacity(ids.len());
    for id in ids {
        match cache.get(&id) {
            Some(record) if record.is_normal => entries.push((id, record.published_at)),
            Some(_) => {}
            None => warn!("browse list references unknown video {}", id),
        }
    }
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().map(|(id, _)| id).collect()
}
