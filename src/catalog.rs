#![forbid(unsafe_code)]

//! Typed access to the four YouTube Data API v3 calls the harvester makes.
//!
//! [`VideoCatalog`] exposes exactly one method per call shape and returns the
//! decoded wire payload untouched. Interpretation (first match wins, empty
//! channel lists, count defaults) lives with the stage that needs it, so the
//! stages can be exercised against an in-memory catalog.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Settings;
use crate::error::{HarvestError, Result};

/// Largest page / batch size the Data API accepts.
pub const MAX_RESULTS_PER_CALL: usize = 50;

pub trait VideoCatalog {
    /// `search.list` restricted to channels.
    fn search_channels(&self, query: &str, max_results: usize) -> Result<SearchListResponse>;

    /// `channels.list` with `contentDetails` for a single channel id.
    fn channel_content_details(&self, channel_id: &str) -> Result<ChannelListResponse>;

    /// `playlistItems.list` with `contentDetails`, one page at a time.
    fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse>;

    /// `videos.list` with `snippet,statistics` for at most
    /// [`MAX_RESULTS_PER_CALL`] ids.
    fn videos(&self, video_ids: &[&str]) -> Result<VideoListResponse>;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub snippet: SearchSnippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub channel_id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelResource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResource {
    pub id: String,
    pub content_details: ChannelContentDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedPlaylists {
    pub uploads: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub content_details: PlaylistItemContentDetails,
}

/// `videoPublishedAt` is absent for uploads that are private or deleted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    pub video_id: String,
    #[serde(default)]
    pub video_published_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoResource {
    pub id: String,
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: String,
}

/// Statistics arrive as decimal strings; hidden counters are omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

/// Blocking Data API client. One instance (and one connection pool) is
/// shared by every stage of a run.
pub struct DataApiClient {
    agent: ureq::Agent,
    api_base: String,
    api_key: String,
}

impl DataApiClient {
    pub fn new(settings: &Settings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("channel-harvest/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            api_base: settings.api_base.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{endpoint}", self.api_base);
        debug!(endpoint, ?params, "calling Data API");
        let mut request = self.agent.get(&url);
        for (name, value) in params {
            request = request.query(name, value);
        }
        let response = request.query("key", &self.api_key).call()?;
        response.into_json::<T>().map_err(|err| {
            HarvestError::upstream(format!("decoding {endpoint} response: {err}"))
        })
    }
}

impl VideoCatalog for DataApiClient {
    fn search_channels(&self, query: &str, max_results: usize) -> Result<SearchListResponse> {
        let max_results = max_results.to_string();
        self.get_json(
            "search",
            &[
                ("part", "snippet"),
                ("q", query),
                ("type", "channel"),
                ("maxResults", max_results.as_str()),
            ],
        )
    }

    fn channel_content_details(&self, channel_id: &str) -> Result<ChannelListResponse> {
        self.get_json("channels", &[("part", "contentDetails"), ("id", channel_id)])
    }

    fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse> {
        let max_results = MAX_RESULTS_PER_CALL.to_string();
        let mut params = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get_json("playlistItems", &params)
    }

    fn videos(&self, video_ids: &[&str]) -> Result<VideoListResponse> {
        if video_ids.len() > MAX_RESULTS_PER_CALL {
            return Err(HarvestError::InvalidInput(format!(
                "videos.list accepts at most {MAX_RESULTS_PER_CALL} ids, got {}",
                video_ids.len()
            )));
        }
        let ids = video_ids.join(",");
        self.get_json("videos", &[("part", "snippet,statistics"), ("id", ids.as_str())])
    }
}
