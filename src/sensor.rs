//! Rendering of snapshots into the published sensor state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::Episode;
use crate::scheduler::Snapshot;

/// Value published when no episode could be resolved
pub const NOT_FOUND: &str = "No episode found";

pub const ICON: &str = "mdi:podcast";

/// Attribute bundle attached to a published sensor value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeAttributes {
    pub title: String,
    pub description: String,
    pub publish_date: Option<String>,
    pub duration: Option<String>,
    pub audio_url: String,
    pub podcast_title: String,
    pub episode_number: Option<i64>,
    pub season_number: Option<i64>,
    pub search_or_id: String,
    pub feed_url: String,
    pub hours_since_publish: Option<f64>,
    pub podcast_icon: String,
    pub guid: String,
    pub link: String,
}

/// Published state for one tracked identifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub icon: &'static str,
    pub value: String,
    pub available: bool,
    /// `None` when there is no episode to describe
    pub attributes: Option<EpisodeAttributes>,
}

impl SensorState {
    pub fn render(entry_name: &str, term: &str, snapshot: &Snapshot, now: DateTime<Utc>) -> Self {
        let episode = snapshot.episode.as_ref();

        let label = episode
            .map(|e| e.podcast_title.as_str())
            .filter(|title| !title.is_empty())
            .unwrap_or(term);

        Self {
            unique_id: unique_id(entry_name, term),
            name: format!("{entry_name} {label} Latest Episode"),
            icon: ICON,
            value: episode
                .map(|e| e.title.clone())
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            available: snapshot.last_update_success,
            attributes: episode.map(|e| EpisodeAttributes::from_episode(e, term, now)),
        }
    }
}

impl EpisodeAttributes {
    pub fn from_episode(episode: &Episode, term: &str, now: DateTime<Utc>) -> Self {
        let published = publish_time(episode.publish_date);

        Self {
            title: episode.title.clone(),
            description: episode.description.clone(),
            publish_date: published.map(|dt| dt.to_rfc3339()),
            duration: (episode.duration > 0).then(|| format_duration(episode.duration)),
            audio_url: episode.audio_url.clone(),
            podcast_title: episode.podcast_title.clone(),
            episode_number: episode.episode_number,
            season_number: episode.season_number,
            search_or_id: term.to_string(),
            feed_url: episode.feed_url.clone(),
            hours_since_publish: published.map(|dt| hours_between(dt, now)),
            podcast_icon: episode.image.clone(),
            guid: episode.guid.clone(),
            link: episode.link.clone(),
        }
    }
}

/// `"{name}_{term}_latest_episode"`, lower-cased with spaces as underscores
pub fn unique_id(entry_name: &str, term: &str) -> String {
    let slug = |s: &str| s.to_lowercase().replace(' ', "_");
    format!("{}_{}_latest_episode", slug(entry_name), slug(term))
}

fn publish_time(timestamp: i64) -> Option<DateTime<Utc>> {
    if timestamp == 0 {
        return None;
    }
    DateTime::from_timestamp(timestamp, 0)
}

fn hours_between(published: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = (now - published).num_seconds() as f64 / 3600.0;
    (hours * 10.0).round() / 10.0
}

/// Human-readable duration: `H:MM:SS`, prefixed by `N day(s), ` past 24 hours
pub fn format_duration(seconds: i64) -> String {
    let days = seconds.div_euclid(86_400);
    let rest = seconds.rem_euclid(86_400);
    let clock = format!("{}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);

    match days {
        0 => clock,
        1 | -1 => format!("{days} day, {clock}"),
        _ => format!("{days} days, {clock}"),
    }
}
