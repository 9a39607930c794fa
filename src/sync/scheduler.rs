use super::state::{SearchRequest, SharedState, SyncPhase};
use crate::config::SyncSettings;
use crate::instances::directory;
use crate::upstream::{DetailOutcome, FeedItem, FetchError, InstanceClient, Transport};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Minimum spacing between directory fetch attempts once the registry has
/// gone stale, so a down directory endpoint is not hit every tick.
const DIRECTORY_RETRY_SPACING_SECS: i64 = 60;

/// Drives directory, popular, channel, search and detail refreshes on a
/// fixed tick, honoring cooldowns, jitter and the shutdown token.
///
/// The scheduler is the sole background writer of engine state. Network
/// fetches run outside the lock; results are applied under short write
/// sections so UI commands interleave cleanly.
pub struct SyncScheduler {
    state: SharedState,
    transport: Arc<dyn Transport>,
    settings: SyncSettings,
    shutdown: CancellationToken,
    /// Epoch of the last directory fetch attempt, successful or not.
    last_directory_attempt: i64,
    degraded_failures: u32,
}

fn epoch_now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl SyncScheduler {
    pub fn new(
        state: SharedState,
        transport: Arc<dyn Transport>,
        settings: SyncSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            state,
            transport,
            settings,
            shutdown,
            last_directory_attempt: 0,
            degraded_failures: 0,
        }
    }

    fn client(&self) -> InstanceClient<'_> {
        InstanceClient::new(self.transport.as_ref())
    }

    /// Run until the shutdown token fires.
    pub async fn run(mut self) {
        info!("sync scheduler starting");
        self.bootstrap().await;

        let mut ticker = tokio::time::interval(Duration::from_millis(self.settings.tick_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let phase = self.state.read().await.phase;
                    match phase {
                        SyncPhase::Steady => self.steady_tick().await,
                        _ => self.degraded_tick().await,
                    }
                }
                _ = self.shutdown.cancelled() => {
                    info!("sync scheduler stopping");
                    break;
                }
            }
        }
    }

    async fn bootstrap(&mut self) {
        let phase = match self.refresh_directory().await {
            Ok(count) if count > 0 => {
                info!("bootstrapped with {} instances", count);
                SyncPhase::Steady
            }
            Ok(_) => {
                warn!("directory returned no usable instances");
                SyncPhase::Degraded
            }
            Err(e) => {
                warn!("initial directory refresh failed: {}", e);
                SyncPhase::Degraded
            }
        };
        self.state.write().await.phase = phase;
    }

    /// Keep retrying the directory, pausing after a burst of consecutive
    /// failures so retries cannot storm a dead endpoint.
    async fn degraded_tick(&mut self) {
        match self.refresh_directory().await {
            Ok(count) if count > 0 => {
                info!("directory recovered with {} instances", count);
                self.degraded_failures = 0;
                self.state.write().await.phase = SyncPhase::Steady;
            }
            result => {
                if let Err(e) = result {
                    debug!("directory still unreachable: {}", e);
                }
                self.degraded_failures += 1;
                if self.degraded_failures >= self.settings.degraded_failure_limit {
                    self.degraded_failures = 0;
                    let pause = Duration::from_secs(self.settings.degraded_pause_secs);
                    tokio::select! {
                        _ = tokio::time::sleep(pause) => {}
                        _ = self.shutdown.cancelled() => {}
                    }
                }
            }
        }
    }

    /// One steady-state pass: directory freshness, local policy, one popular
    /// feed, one channel, one queued search, one video detail.
    async fn steady_tick(&mut self) {
        let now = epoch_now();

        // Directory freshness. A failed refresh keeps the stale registry.
        let directory_stale = {
            let state = self.state.read().await;
            state.instances.directory_age(now) > self.settings.directory_max_age_secs
        };
        if directory_stale && now - self.last_directory_attempt >= DIRECTORY_RETRY_SPACING_SECS {
            match self.refresh_directory().await {
                Ok(0) => {
                    warn!("directory rebuild produced no instances");
                    self.state.write().await.phase = SyncPhase::Degraded;
                    return;
                }
                Ok(_) => {}
                Err(e) => warn!("directory refresh failed, keeping stale registry: {}", e),
            }
        }

        // Local policy for instances the last rebuild introduced.
        {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            state.instances.apply_local_policy(&state.banned_instances);
        }

        // One popular feed, only while a browse surface is visible.
        let popular_due = {
            let state = self.state.read().await;
            if state.browse_active {
                state.instances.next_popular_due(now)
            } else {
                None
            }
        };
        if let Some(instance) = popular_due {
            self.refresh_popular(&instance, now).await;
        }

        // One subscribed channel, when due.
        let channel_due = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            state
                .channels
                .sync(&state.subscribed_channels, &state.banned_channels);
            state
                .channels
                .next_due(now, self.settings.channel_poll_secs)
                .map(str::to_string)
        };
        if let Some(channel_id) = channel_due {
            self.refresh_channel(&channel_id, now).await;
        }

        // One queued search, dispatched synchronously.
        let search = self.state.write().await.pending_search.take();
        if let Some(request) = search {
            self.dispatch_search(request, now).await;
        }

        // One video detail refresh.
        let candidate = {
            let state = self.state.read().await;
            let len = state.videos.len();
            if len == 0 {
                None
            } else {
                let start = rand::rng().random_range(0..len);
                state.videos.detail_candidate(start).map(str::to_string)
            }
        };
        if let Some(id) = candidate {
            if let Err(e) = self.refresh_video_detail(&id, now).await {
                debug!("detail refresh of {} failed: {}", id, e);
            }
        }
    }

    /// Fetch and rebuild the instance registry. No partial replace: a fetch
    /// or parse failure leaves the previous registry untouched.
    async fn refresh_directory(&mut self) -> Result<usize, FetchError> {
        let now = epoch_now();
        self.last_directory_attempt = now;
        let payload = self.client().fetch_directory(&self.settings.directory_url).await?;
        let instances = directory::parse_directory(&payload)?;
        let count = instances.len();
        self.state.write().await.instances.rebuild(instances, now);
        Ok(count)
    }

    /// Pick one eligible instance starting from a random index.
    async fn select_instance(&self, now: i64) -> Option<String> {
        let state = self.state.read().await;
        let len = state.instances.len();
        if len == 0 {
            return None;
        }
        let start = rand::rng().random_range(0..len);
        state.instances.select_from(start, now)
    }

    /// Fetch one instance's popular feed and fold it into the cache and the
    /// popular list. The instance is rescheduled either way: a short random
    /// jitter after success, a longer window after failure.
    async fn refresh_popular(&self, instance: &str, now: i64) {
        match self.client().fetch_popular(instance).await {
            Ok(items) => {
                let next = now + rand::rng().random_range(0..=self.settings.popular_jitter_max_secs);
                let mut guard = self.state.write().await;
                let state = &mut *guard;
                for item in &items {
                    state.videos.upsert(item, instance);
                }
                let ids: Vec<String> = items.iter().map(|i| i.video_id.clone()).collect();
                state.browse.merge_popular(&ids, &state.videos);
                state.instances.schedule_popular(instance, next);
                debug!("popular feed from {}: {} items", instance, items.len());
            }
            Err(e) => {
                warn!("popular refresh from {} failed: {}", instance, e);
                let next = now
                    + rand::rng().random_range(
                        self.settings.popular_backoff_min_secs
                            ..=self.settings.popular_backoff_max_secs,
                    );
                let mut guard = self.state.write().await;
                if e.is_instance_fault() {
                    guard
                        .instances
                        .penalize(instance, now, self.settings.instance_cooldown_secs);
                }
                guard.instances.schedule_popular(instance, next);
            }
        }
    }

    /// Refresh one subscribed channel's uploads. The tracker is stamped
    /// unconditionally so a broken channel cannot monopolize the scheduler.
    async fn refresh_channel(&self, channel_id: &str, now: i64) {
        let outcome = match self.select_instance(now).await {
            None => Err((None, FetchError::NoInstances)),
            Some(instance) => match self.client().fetch_channel_videos(&instance, channel_id).await
            {
                Ok(items) => Ok((instance, items)),
                Err(e) => Err((Some(instance), e)),
            },
        };

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        match outcome {
            Ok((instance, items)) => {
                let uploads: Vec<&FeedItem> =
                    items.iter().filter(|i| i.is_plain_video()).collect();
                for item in &uploads {
                    state.videos.upsert(item, &instance);
                }
                let subscribed = state.subscribed_set();
                state.browse.rebuild_subscriptions(&subscribed, &state.videos);
                debug!("channel {}: {} uploads via {}", channel_id, uploads.len(), instance);
            }
            Err((instance, e)) => {
                warn!("channel {} refresh failed: {}", channel_id, e);
                if let Some(name) = instance {
                    if e.is_instance_fault() {
                        state
                            .instances
                            .penalize(&name, now, self.settings.instance_cooldown_secs);
                    }
                }
            }
        }
        state.channels.mark_attempt(channel_id, now);
    }

    /// Dispatch one queued video search.
    async fn dispatch_search(&self, request: SearchRequest, now: i64) {
        let Some(instance) = self.select_instance(now).await else {
            warn!("search {:?} dropped: no eligible instance", request.query);
            return;
        };
        match self.client().search_videos(&instance, &request.query).await {
            Ok(items) => {
                let mut guard = self.state.write().await;
                let state = &mut *guard;
                let mut ids = Vec::new();
                for item in items.iter().filter(|i| i.is_plain_video()) {
                    state.videos.upsert(item, &instance);
                    ids.push(item.video_id.clone());
                }
                info!("search {:?}: {} results via {}", request.query, ids.len(), instance);
                state.browse.set_search_videos(ids, &state.videos);
            }
            Err(e) => {
                warn!("search {:?} via {} failed: {}", request.query, instance, e);
                if e.is_instance_fault() {
                    self.state
                        .write()
                        .await
                        .instances
                        .penalize(&instance, now, self.settings.instance_cooldown_secs);
                }
            }
        }
    }

    /// Fetch full detail for one video, rotating through instances until one
    /// answers or none are left.
    ///
    /// Every transport failure cools the contacted instance down, which also
    /// removes it from this pass's selection, so the loop finishes within
    /// one rotation of the registry.
    async fn refresh_video_detail(&self, id: &str, now: i64) -> Result<(), FetchError> {
        loop {
            if self.shutdown.is_cancelled() {
                return Ok(());
            }
            let Some(instance) = self.select_instance(now).await else {
                return Err(FetchError::NoInstances);
            };
            match self.client().fetch_video_detail(&instance, id).await {
                Ok(DetailOutcome::Detail(detail)) => {
                    self.state.write().await.videos.record_detail_success(id, &detail);
                    debug!("detail for {} via {}", id, instance);
                    return Ok(());
                }
                Ok(DetailOutcome::ApiError(message)) => {
                    debug!("api error for video {}: {}", id, message);
                    self.state.write().await.videos.record_detail_error(id);
                    return Ok(());
                }
                Err(e) if e.is_instance_fault() => {
                    self.state
                        .write()
                        .await
                        .instances
                        .penalize(&instance, now, self.settings.instance_cooldown_secs);
                    if matches!(e, FetchError::Parse(_)) {
                        // A malformed body means the operation is abandoned
                        // for this tick rather than retried elsewhere.
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
