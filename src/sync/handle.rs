use super::state::{SearchKind, SearchRequest, SharedState, SyncPhase};
use crate::instances::Instance;
use crate::prefs::{PrefError, PrefFile, PreferenceStore};
use crate::videos::VideoRecord;
use std::sync::Arc;
use tracing::warn;

/// Command and read surface handed to the terminal UI.
///
/// All writes go through the same lock as the scheduler's, so they are
/// linearizable with background updates.
#[derive(Clone)]
pub struct EngineHandle {
    state: SharedState,
    prefs: Arc<dyn PreferenceStore>,
}

impl EngineHandle {
    pub fn new(state: SharedState, prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { state, prefs }
    }

    pub async fn popular(&self) -> Vec<String> {
        self.state.read().await.browse.popular().to_vec()
    }

    pub async fn subscriptions(&self) -> Vec<String> {
        self.state.read().await.browse.subscriptions().to_vec()
    }

    pub async fn search_results(&self) -> Vec<String> {
        self.state.read().await.browse.search_videos().to_vec()
    }

    pub async fn video(&self, id: &str) -> Option<VideoRecord> {
        self.state.read().await.videos.get(id).cloned()
    }

    /// Instance by position, for the settings view.
    pub async fn instance_at(&self, index: usize) -> Option<Instance> {
        self.state.read().await.instances.get(index).cloned()
    }

    pub async fn instance_count(&self) -> usize {
        self.state.read().await.instances.len()
    }

    pub async fn phase(&self) -> SyncPhase {
        self.state.read().await.phase
    }

    /// Toggle a video's favorite flag, persisting the change. Returns the
    /// new state.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool, PrefError> {
        let mut guard = self.state.write().await;
        let favored = !guard.videos.is_favorite(id);
        guard.videos.set_favorite(id, favored);
        if favored {
            self.prefs.append(PrefFile::Favorites, id)?;
        } else {
            self.prefs.remove(PrefFile::Favorites, id)?;
        }
        Ok(favored)
    }

    /// Subscribe or unsubscribe a channel, persisting the change and
    /// rebuilding the subscriptions feed. Returns true when now subscribed.
    pub async fn toggle_subscribe(&self, channel_id: &str) -> Result<bool, PrefError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let was_subscribed = state.subscribed_channels.iter().any(|c| c == channel_id);
        if was_subscribed {
            state.subscribed_channels.retain(|c| c != channel_id);
            self.prefs.remove(PrefFile::Subscriptions, channel_id)?;
        } else {
            state.subscribed_channels.push(channel_id.to_string());
            self.prefs.append(PrefFile::Subscriptions, channel_id)?;
        }

        state
            .channels
            .sync(&state.subscribed_channels, &state.banned_channels);
        let subscribed = state.subscribed_set();
        state.browse.rebuild_subscriptions(&subscribed, &state.videos);
        Ok(!was_subscribed)
    }

    /// Ban an instance by name; persisted, and effective immediately.
    pub async fn ban_instance(&self, name: &str) -> Result<(), PrefError> {
        let mut guard = self.state.write().await;
        guard.banned_instances.insert(name.to_string());
        guard.instances.ban(name);
        self.prefs.append(PrefFile::BannedInstances, name)?;
        Ok(())
    }

    /// Ask for an out-of-band detail refresh of one video.
    pub async fn request_priority_refresh(&self, id: &str) {
        self.state.write().await.videos.request_priority_refresh(id);
    }

    /// Queue a search; the scheduler dispatches it on its next tick.
    pub async fn submit_search(&self, query: &str, kind: SearchKind) {
        if kind == SearchKind::Channels {
            // No upstream response shape is defined for channel search yet.
            warn!("channel search is not implemented, ignoring query {:?}", query);
            return;
        }
        self.state.write().await.pending_search = Some(SearchRequest {
            query: query.to_string(),
            kind,
        });
    }

    /// Tell the scheduler whether a browse surface is visible.
    pub async fn set_browse_active(&self, active: bool) {
        self.state.write().await.browse_active = active;
    }
}
