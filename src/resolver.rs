// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{Episode, PodcastIndexClient};
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::tracked::TrackedId;

/// Resolves the latest episode for one tracked identifier
pub struct EpisodeResolver<C> {
    client: Arc<PodcastIndexClient<C>>,
    id: TrackedId,
}

impl<C> Clone for EpisodeResolver<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            id: self.id.clone(),
        }
    }
}

impl<C> EpisodeResolver<C> {
    pub fn new(client: Arc<PodcastIndexClient<C>>, id: TrackedId) -> Self {
        Self { client, id }
    }

    pub fn id(&self) -> &TrackedId {
        &self.id
    }
}

impl<C: HttpClient> EpisodeResolver<C> {
    /// Latest episode, or `None` when the API has nothing for this identifier
    pub async fn latest_episode(&self) -> Result<Option<Episode>, ApiError> {
        match &self.id {
            TrackedId::FeedId(feed_id) => self.latest_by_feed_id(feed_id).await,
            TrackedId::SearchTerm(term) => self.latest_by_search(term).await,
        }
    }

    async fn latest_by_feed_id(&self, feed_id: &str) -> Result<Option<Episode>, ApiError> {
        // Podcast metadata is optional here: the episode is what matters
        let podcast = match self.client.podcast_by_feed_id(feed_id).await {
            Ok(Some(podcast)) => Some(podcast),
            Ok(None) => {
                warn!(feed_id, "no podcast feed found for ID");
                None
            }
            Err(e) => {
                warn!(feed_id, error = %e, "failed to fetch podcast feed by ID");
                None
            }
        };

        let Some(mut episode) = self.client.episodes_by_feed_id(feed_id).await? else {
            warn!(feed_id, "no episodes found for podcast ID");
            return Ok(None);
        };

        if let Some(podcast) = podcast {
            episode.podcast_title = podcast.title;
            episode.feed_url = podcast.feed_url;
        }
        episode.podcast_id = Some(feed_id.to_string());
        episode.search_term = feed_id.to_string();

        debug!(feed_id, title = %episode.title, "resolved latest episode");
        Ok(Some(episode))
    }

    async fn latest_by_search(&self, term: &str) -> Result<Option<Episode>, ApiError> {
        let podcast = match self.client.search_podcasts(term).await? {
            Some(podcast) if !podcast.feed_url.is_empty() => podcast,
            _ => {
                warn!(term, "no podcast found for search term");
                return Ok(None);
            }
        };

        let Some(mut episode) = self.client.episodes_by_feed_url(&podcast.feed_url).await? else {
            warn!(term, feed_url = %podcast.feed_url, "no episodes found for podcast");
            return Ok(None);
        };

        episode.podcast_title = podcast.title;
        episode.feed_url = podcast.feed_url;
        episode.search_term = term.to_string();

        debug!(term, title = %episode.title, "resolved latest episode");
        Ok(Some(episode))
    }
}
