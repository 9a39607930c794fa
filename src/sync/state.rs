use crate::channels::ChannelTracker;
use crate::instances::InstanceRegistry;
use crate::prefs::{PrefError, PrefFile, PreferenceStore};
use crate::videos::{BrowseLists, VideoCache};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lifecycle phase of the scheduler, exposed for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Bootstrapping,
    Steady,
    /// No usable instances; the UI shows "no content available" rather than
    /// failing.
    Degraded,
}

/// What kind of results a search should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Videos,
    Channels,
}

/// One queued search, dispatched by the scheduler on its next tick.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub kind: SearchKind,
}

/// Every piece of mutable engine state.
///
/// Guarded by a single lock so UI-triggered writes stay linearizable with
/// scheduler writes; the scheduler fetches outside the lock and applies
/// results under short write sections.
pub struct EngineState {
    pub instances: InstanceRegistry,
    pub videos: VideoCache,
    pub channels: ChannelTracker,
    pub browse: BrowseLists,
    /// Subscribed channel ids in registration order.
    pub subscribed_channels: Vec<String>,
    pub banned_channels: HashSet<String>,
    pub banned_instances: HashSet<String>,
    /// A browse surface is visible; popular feeds refresh only while set.
    pub browse_active: bool,
    pub pending_search: Option<SearchRequest>,
    pub phase: SyncPhase,
}

pub type SharedState = Arc<RwLock<EngineState>>;

impl Default for EngineState {
    fn default() -> Self {
        Self {
            instances: InstanceRegistry::new(),
            videos: VideoCache::default(),
            channels: ChannelTracker::default(),
            browse: BrowseLists::default(),
            subscribed_channels: Vec::new(),
            banned_channels: HashSet::new(),
            banned_instances: HashSet::new(),
            browse_active: false,
            pending_search: None,
            phase: SyncPhase::Bootstrapping,
        }
    }
}

impl EngineState {
    /// Build the initial state from persisted preferences.
    pub fn load(prefs: &dyn PreferenceStore) -> Result<Self, PrefError> {
        let favorites = prefs.list(PrefFile::Favorites)?;
        let subscribed_channels = prefs.list(PrefFile::Subscriptions)?;
        let banned_channels = prefs.list(PrefFile::BannedChannels)?.into_iter().collect();
        let banned_instances = prefs.list(PrefFile::BannedInstances)?.into_iter().collect();
        Ok(Self {
            videos: VideoCache::new(favorites),
            subscribed_channels,
            banned_channels,
            banned_instances,
            ..Self::default()
        })
    }

    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Subscribed channel ids as a set, for feed filtering.
    pub fn subscribed_set(&self) -> HashSet<String> {
        self.subscribed_channels.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::FilePreferenceStore;
    use tempfile::TempDir;

    #[test]
    fn test_load_pulls_all_preference_lists() {
        let temp_dir = TempDir::new().unwrap();
        let prefs = FilePreferenceStore::new(temp_dir.path()).unwrap();
        prefs.append(PrefFile::Favorites, "aaaaaaaaaaa").unwrap();
        prefs.append(PrefFile::Subscriptions, "UC111").unwrap();
        prefs.append(PrefFile::Subscriptions, "UC222").unwrap();
        prefs.append(PrefFile::BannedChannels, "UCbad").unwrap();
        prefs.append(PrefFile::BannedInstances, "bad.example.org").unwrap();

        let state = EngineState::load(&prefs).unwrap();

        assert!(state.videos.is_favorite("aaaaaaaaaaa"));
        assert_eq!(state.subscribed_channels, vec!["UC111", "UC222"]);
        assert!(state.banned_channels.contains("UCbad"));
        assert!(state.banned_instances.contains("bad.example.org"));
        assert_eq!(state.phase, SyncPhase::Bootstrapping);
        assert!(!state.browse_active);
    }

    #[test]
    fn test_load_from_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let prefs = FilePreferenceStore::new(temp_dir.path()).unwrap();

        let state = EngineState::load(&prefs).unwrap();

        assert!(state.subscribed_channels.is_empty());
        assert!(state.banned_instances.is_empty());
        assert!(state.videos.is_empty());
    }
}
