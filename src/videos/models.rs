/// Number of per-video API errors after which a record is permanently
/// excluded from scheduling and display.
pub const DETAIL_RETRY_LIMIT: u32 = 5;

/// One known video and its refresh state.
#[derive(Debug, Clone)]
pub struct VideoRecord {
    /// Opaque 11-character id, unique within the cache.
    pub id: String,
    pub title: String,
    pub author: String,
    pub author_id: String,
    pub length_seconds: i64,
    pub published_at: i64,
    pub view_count: i64,
    pub description: String,
    /// Per-video API errors seen so far.
    pub retry_count: u32,
    /// False marks a live/premium/unsupported item. Terminal once cleared.
    pub is_normal: bool,
    /// Full detail has been fetched at least once.
    pub manually_updated: bool,
    /// An out-of-band detail refresh is pending.
    pub priority_update: bool,
    pub favorite: bool,
    /// Popular-feed instance this video was first seen on. Never overwritten.
    pub first_seen_instance: String,
    pub seen_on_multiple_instances: bool,
}
