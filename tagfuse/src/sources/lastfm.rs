//! Last.fm API client
//!
//! Implements [`CommunityTagSource`] over the Last.fm `track.getTopTags` /
//! `artist.getTopTags` endpoints. The API reports some errors inside an
//! HTTP 200 body (`error` code + `message`); those map to
//! `TagSourceError::Api` just like non-2xx statuses. An empty `tag` array
//! is a legitimate empty result, not an error.

use crate::error::TagSourceError;
use crate::types::{CommunityTagSource, RawTag};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const LASTFM_BASE_URL: &str = "http://ws.audioscrobbler.com/2.0/";
const USER_AGENT: &str = "tagfuse/0.1.0";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Last.fm top-tags response envelope
///
/// Success and error payloads share one shape: `toptags` on success,
/// `error`/`message` on failure.
#[derive(Debug, Deserialize)]
struct TopTagsResponse {
    toptags: Option<TopTagsBody>,
    error: Option<u16>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopTagsBody {
    #[serde(default)]
    tag: Vec<WireTag>,
}

#[derive(Debug, Deserialize)]
struct WireTag {
    name: String,
    /// Annotation count; absent on some tag listings
    count: Option<u32>,
}

/// Last.fm API client
pub struct LastfmClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl LastfmClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, TagSourceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TagSourceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
        })
    }

    async fn fetch_top_tags(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<RawTag>, TagSourceError> {
        debug!(method = method, "Querying Last.fm API");

        let response = self
            .http_client
            .get(LASTFM_BASE_URL)
            .query(&[
                ("method", method),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("autocorrect", "1"),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| TagSourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TagSourceError::Api(status.as_u16(), body));
        }

        let parsed: TopTagsResponse = response
            .json()
            .await
            .map_err(|e| TagSourceError::Parse(e.to_string()))?;

        tags_from_response(parsed)
    }
}

/// Convert a parsed response envelope into raw tags
///
/// Tags without a count carry no usable weight and are dropped.
fn tags_from_response(response: TopTagsResponse) -> Result<Vec<RawTag>, TagSourceError> {
    if let Some(code) = response.error {
        return Err(TagSourceError::Api(
            code,
            response.message.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let body = response
        .toptags
        .ok_or_else(|| TagSourceError::Parse("response has neither toptags nor error".to_string()))?;

    Ok(body
        .tag
        .into_iter()
        .filter_map(|tag| tag.count.map(|count| RawTag::new(tag.name, count)))
        .collect())
}

#[async_trait::async_trait]
impl CommunityTagSource for LastfmClient {
    async fn track_top_tags(
        &self,
        artist: &str,
        track: &str,
    ) -> Result<Vec<RawTag>, TagSourceError> {
        self.fetch_top_tags("track.getTopTags", &[("artist", artist), ("track", track)])
            .await
    }

    async fn artist_top_tags(&self, artist: &str) -> Result<Vec<RawTag>, TagSourceError> {
        self.fetch_top_tags("artist.getTopTags", &[("artist", artist)])
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
