// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A podcast feed as returned by the search and lookup endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podcast {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(
        default,
        rename(deserialize = "url"),
        deserialize_with = "null_as_default"
    )]
    pub feed_url: String,
    #[serde(
        default,
        rename(deserialize = "link"),
        deserialize_with = "null_as_default"
    )]
    pub website: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(
        default,
        rename(deserialize = "lastUpdateTime"),
        deserialize_with = "null_as_default"
    )]
    pub last_updated: i64,
}

/// A single episode, normalized from the episodes endpoints
///
/// `feed_url`, `podcast_id` and `search_term` are never read from the API;
/// the resolver stamps them after the lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(
        default,
        rename(deserialize = "datePublished"),
        deserialize_with = "null_as_default"
    )]
    pub publish_date: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: i64,
    #[serde(
        default,
        rename(deserialize = "enclosureUrl"),
        deserialize_with = "null_as_default"
    )]
    pub audio_url: String,
    #[serde(
        default,
        rename(deserialize = "feedTitle"),
        deserialize_with = "null_as_default"
    )]
    pub podcast_title: String,
    #[serde(default, rename(deserialize = "episode"))]
    pub episode_number: Option<i64>,
    #[serde(default, rename(deserialize = "season"))]
    pub season_number: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub guid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(
        default,
        rename(deserialize = "feedImage"),
        deserialize_with = "null_as_default"
    )]
    pub image: String,
    #[serde(skip_deserializing)]
    pub feed_url: String,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub podcast_id: Option<String>,
    #[serde(skip_deserializing)]
    pub search_term: String,
}

/// Response envelope shared by all endpoints
///
/// The result lives under an endpoint-specific key and may be an array or a
/// single object.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    status: Value,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl Envelope {
    pub(crate) fn is_ok(&self) -> bool {
        matches!(&self.status, Value::String(status) if status == "true")
    }

    /// First entry of the first non-empty result field among `keys`
    ///
    /// A failed status or an absent/empty result is `Ok(None)`.
    pub(crate) fn first<T: DeserializeOwned>(
        mut self,
        keys: &[&str],
    ) -> Result<Option<T>, serde_json::Error> {
        if !self.is_ok() {
            return Ok(None);
        }

        let Some(value) = keys
            .iter()
            .filter_map(|key| self.fields.remove(*key))
            .find(|value| !is_empty(value))
        else {
            return Ok(None);
        };

        Ok(match serde_json::from_value::<OneOrMany<T>>(value)? {
            OneOrMany::Many(items) => items.into_iter().next(),
            OneOrMany::One(item) => Some(item),
        })
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
