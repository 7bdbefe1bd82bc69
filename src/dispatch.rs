// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::PodcastIndexClient;
use crate::error::ActionError;
use crate::http::HttpClient;
use crate::playback::{PlayMedia, PlaybackSink};
use crate::resolver::EpisodeResolver;
use crate::tracked::TrackedId;

pub const SEARCH_AND_PLAY: &str = "search_and_play";
pub const ADD_SEARCH_TERM: &str = "add_search_term";
pub const REMOVE_SEARCH_TERM: &str = "remove_search_term";

/// Every action name an integration registers
pub const ACTIONS: [&str; 3] = [SEARCH_AND_PLAY, ADD_SEARCH_TERM, REMOVE_SEARCH_TERM];

/// Data for `search_and_play`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchAndPlay {
    #[serde(default, alias = "entity_id")]
    pub sink_id: Option<String>,
    #[serde(default)]
    pub search_term: Option<String>,
    /// Percentage in `0..=100`
    #[serde(default)]
    pub volume: Option<f64>,
}

/// Data for `add_search_term` and `remove_search_term`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TermChange {
    #[serde(default)]
    pub search_term: Option<String>,
    /// Entry id or display name; the first entry when absent
    #[serde(default)]
    pub target_config: Option<String>,
}

/// A decoded inbound action
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SearchAndPlay(SearchAndPlay),
    AddSearchTerm(TermChange),
    RemoveSearchTerm(TermChange),
}

impl Action {
    pub fn parse(name: &str, data: Value) -> Result<Self, ActionError> {
        let data = if data.is_null() {
            Value::Object(Default::default())
        } else {
            data
        };
        let invalid = |source| ActionError::InvalidPayload {
            action: name.to_string(),
            source,
        };

        match name {
            SEARCH_AND_PLAY => serde_json::from_value(data)
                .map(Self::SearchAndPlay)
                .map_err(invalid),
            ADD_SEARCH_TERM => serde_json::from_value(data)
                .map(Self::AddSearchTerm)
                .map_err(invalid),
            REMOVE_SEARCH_TERM => serde_json::from_value(data)
                .map(Self::RemoveSearchTerm)
                .map_err(invalid),
            other => Err(ActionError::Unknown(other.to_string())),
        }
    }
}

/// Treat absent, empty and blank inputs alike
pub(crate) fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolve the latest episode for `request.search_term` and play it on the sink
///
/// Every failure ends in a log line; nothing is returned to the caller.
pub async fn search_and_play<C: HttpClient>(
    client: &Arc<PodcastIndexClient<C>>,
    sink: &dyn PlaybackSink,
    request: SearchAndPlay,
) {
    let Some(sink_id) = required(request.sink_id) else {
        warn!("search_and_play: no sink_id provided");
        return;
    };
    let Some(term) = required(request.search_term) else {
        warn!("search_and_play: no search_term provided");
        return;
    };

    let volume = match request.volume {
        Some(percent) if !(0.0..=100.0).contains(&percent) => {
            warn!(percent, "search_and_play: volume must be between 0 and 100");
            return;
        }
        Some(percent) => Some((percent / 100.0) as f32),
        None => None,
    };

    let resolver = EpisodeResolver::new(Arc::clone(client), TrackedId::parse(&term));
    let episode = match resolver.latest_episode().await {
        Ok(Some(episode)) if !episode.audio_url.is_empty() => episode,
        Ok(_) => {
            warn!(%term, "no audio URL found for search term");
            return;
        }
        Err(e) => {
            error!(%term, error = %e, "failed to resolve latest episode");
            return;
        }
    };

    if let Err(e) = sink.unjoin(&sink_id).await {
        debug!(sink = %sink_id, error = %e, "could not ungroup sink");
    }
    if let Some(level) = volume
        && let Err(e) = sink.set_volume(&sink_id, level).await
    {
        warn!(sink = %sink_id, level, error = %e, "failed to set volume");
    }

    match sink
        .play_media(PlayMedia::audio(&sink_id, &episode.audio_url))
        .await
    {
        Ok(()) => {
            info!(%term, sink = %sink_id, title = %episode.title, "playing latest episode")
        }
        Err(e) => error!(%term, sink = %sink_id, error = %e, "failed to start playback"),
    }
}
