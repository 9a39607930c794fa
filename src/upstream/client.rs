//! Typed fetchers for the instance API endpoints.
//!
//! URLs are built from the instance host name the way the directory
//! advertises it; parsing failures are reported separately from transport
//! failures so callers can tell the two apart.

use super::models::{ApiErrorBody, ChannelVideos, DetailOutcome, FeedItem, VideoDetail};
use super::transport::Transport;
use super::FetchError;

/// Field list requested from the video detail endpoint.
pub const DETAIL_FIELDS: &str =
    "title,description,published,viewCount,author,authorId,lengthSeconds";

/// Thin endpoint wrapper over a transport.
pub struct InstanceClient<'a> {
    transport: &'a dyn Transport,
}

impl<'a> InstanceClient<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    async fn get_checked(&self, url: &str) -> Result<String, FetchError> {
        let response = self.transport.get(url).await?;
        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }
        Ok(response.body)
    }

    /// Fetch the global instance directory as raw JSON.
    pub async fn fetch_directory(&self, directory_url: &str) -> Result<serde_json::Value, FetchError> {
        let body = self.get_checked(directory_url).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Fetch one instance's popular feed.
    pub async fn fetch_popular(&self, instance: &str) -> Result<Vec<FeedItem>, FetchError> {
        let url = format!("https://{}/api/v1/popular", instance);
        let body = self.get_checked(&url).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Fetch the latest uploads of one channel.
    pub async fn fetch_channel_videos(
        &self,
        instance: &str,
        channel_id: &str,
    ) -> Result<Vec<FeedItem>, FetchError> {
        let url = format!("https://{}/api/v1/channels/{}/videos", instance, channel_id);
        let body = self.get_checked(&url).await?;
        let wrapper: ChannelVideos =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;
        Ok(wrapper.videos)
    }

    /// Fetch full detail for one video.
    ///
    /// Per-video failures come back as a well-formed error payload, with or
    /// without a success status, so the body is inspected before the status.
    pub async fn fetch_video_detail(
        &self,
        instance: &str,
        video_id: &str,
    ) -> Result<DetailOutcome, FetchError> {
        let url = format!(
            "https://{}/api/v1/videos/{}?fields={}",
            instance, video_id, DETAIL_FIELDS
        );
        let response = self.transport.get(&url).await?;
        if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&response.body) {
            return Ok(DetailOutcome::ApiError(err.error));
        }
        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }
        let detail: VideoDetail =
            serde_json::from_str(&response.body).map_err(|e| FetchError::Parse(e.to_string()))?;
        Ok(DetailOutcome::Detail(detail))
    }

    /// Search one instance for videos matching a query.
    pub async fn search_videos(
        &self,
        instance: &str,
        query: &str,
    ) -> Result<Vec<FeedItem>, FetchError> {
        let url = format!(
            "https://{}/api/v1/search?q={}&type=video",
            instance,
            urlencoding::encode(query)
        );
        let body = self.get_checked(&url).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}
