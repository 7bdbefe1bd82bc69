// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::ApiError;
use crate::http::HttpClient;

use super::parse::{Envelope, Episode, Podcast};

/// Podcast Index API v1.0
pub const DEFAULT_BASE_URL: &str = "https://api.podcastindex.org/api/1.0";

const SEARCH_BY_TERM: &str = "/search/byterm";
const PODCAST_BY_FEED_ID: &str = "/podcasts/byfeedid";
const EPISODES_BY_FEED_ID: &str = "/episodes/byfeedid";
const EPISODES_BY_FEED_URL: &str = "/episodes/byfeedurl";

const EPISODE_KEYS: &[&str] = &["episodes", "items"];

/// Signed client for the Podcast Index REST API
///
/// Every request carries freshly generated auth headers. The underlying
/// [`HttpClient`] holds the connection pool; [`close`](Self::close) releases
/// it.
pub struct PodcastIndexClient<C> {
    http: C,
    credentials: Credentials,
    base_url: String,
}

impl<C: HttpClient> PodcastIndexClient<C> {
    pub fn new(http: C, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (no trailing slash)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the underlying HTTP client
    pub fn http_client(&self) -> &C {
        &self.http
    }

    /// Search podcasts by term, returning only the top-ranked match
    pub async fn search_podcasts(&self, term: &str) -> Result<Option<Podcast>, ApiError> {
        self.fetch_first(SEARCH_BY_TERM, &[("q", term), ("max", "1")], &["feeds"])
            .await
    }

    /// Look up a single podcast by its numeric feed ID
    pub async fn podcast_by_feed_id(&self, feed_id: &str) -> Result<Option<Podcast>, ApiError> {
        self.fetch_first(PODCAST_BY_FEED_ID, &[("id", feed_id)], &["feed", "feeds"])
            .await
    }

    /// Most recent episode of the feed with the given numeric ID
    pub async fn episodes_by_feed_id(&self, feed_id: &str) -> Result<Option<Episode>, ApiError> {
        self.fetch_first(
            EPISODES_BY_FEED_ID,
            &[("id", feed_id), ("max", "1")],
            EPISODE_KEYS,
        )
        .await
    }

    /// Most recent episode of the feed with the given URL
    pub async fn episodes_by_feed_url(
        &self,
        feed_url: &str,
    ) -> Result<Option<Episode>, ApiError> {
        self.fetch_first(
            EPISODES_BY_FEED_URL,
            &[("url", feed_url), ("max", "1")],
            EPISODE_KEYS,
        )
        .await
    }

    /// Probe the API with a throwaway search to validate credentials
    pub async fn test_connection(&self) -> Result<(), ApiError> {
        self.search_podcasts("test").await.map(|_| ())
    }

    /// Release the connection pool
    pub fn close(self) {
        debug!(base_url = %self.base_url, "closing Podcast Index client");
    }

    fn endpoint_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        Ok(Url::parse_with_params(
            &format!("{}{}", self.base_url, path),
            params,
        )?)
    }

    async fn fetch_first<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        keys: &[&str],
    ) -> Result<Option<T>, ApiError> {
        let url = self.endpoint_url(path, params)?;
        let headers = self
            .credentials
            .auth_headers(Utc::now().timestamp())
            .to_header_list();

        debug!(%url, "GET");
        let response = self
            .http
            .get(url.as_str(), &headers)
            .await
            .map_err(|e| ApiError::Transport {
                url: url.to_string(),
                source: e,
            })?;

        if !response.is_success() {
            return Err(ApiError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let decode = |source| ApiError::Decode {
            url: url.to_string(),
            source,
        };
        let envelope: Envelope = serde_json::from_slice(&response.body).map_err(decode)?;
        let result = envelope.first(keys).map_err(decode)?;

        if result.is_none() {
            debug!(%url, "no result");
        }
        Ok(result)
    }
}
