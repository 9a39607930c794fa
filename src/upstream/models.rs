//! Payload models for the consumed instance API endpoints.

use serde::Deserialize;

/// One entry of a popular, channel or search feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub length_seconds: i64,
    #[serde(default)]
    pub published: i64,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub live_now: bool,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub is_upcoming: bool,
}

impl FeedItem {
    /// Live, premium and upcoming items cannot be served by the normal
    /// video endpoints and are kept out of the cache.
    pub fn is_plain_video(&self) -> bool {
        !(self.live_now || self.premium || self.is_upcoming)
    }
}

/// Wrapper shape of the channel videos endpoint.
#[derive(Debug, Deserialize)]
pub struct ChannelVideos {
    #[serde(default)]
    pub videos: Vec<FeedItem>,
}

/// The fields requested from the video detail endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published: i64,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub length_seconds: i64,
}

/// Error payload instances answer with for individual videos.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Result of a detail fetch that reached the instance.
#[derive(Debug)]
pub enum DetailOutcome {
    Detail(VideoDetail),
    ApiError(String),
}
