// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::error::ConfigError;
use crate::tracked::TrackedTerms;

pub const DEFAULT_NAME: &str = "PodcastIndex";

const SECRET_API_KEY: &str = "podcast_index_api_key";
const SECRET_API_SECRET: &str = "podcast_index_api_secret";

/// Persisted configuration of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Comma-separated search terms and feed IDs
    pub search_or_id: String,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

impl EntryConfig {
    pub fn new(name: impl Into<String>, terms: &TrackedTerms) -> Self {
        Self {
            name: name.into(),
            search_or_id: terms.to_list_string(),
        }
    }

    pub fn tracked_terms(&self) -> Result<TrackedTerms, ConfigError> {
        TrackedTerms::parse_list(&self.search_or_id)
    }

    /// Same entry with a replaced identifier list
    pub fn with_terms(&self, terms: &TrackedTerms) -> Self {
        Self::new(self.name.clone(), terms)
    }
}

/// Storage for an entry's configuration
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<EntryConfig, ConfigError>;

    fn save(&self, config: &EntryConfig) -> Result<(), ConfigError>;
}

/// Entry configuration stored as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<EntryConfig, ConfigError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::ReadFailed {
            path: self.path.clone(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: self.path.clone(),
            source: e,
        })
    }

    fn save(&self, config: &EntryConfig) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, json).map_err(|e| ConfigError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Read API credentials from a YAML secrets file
///
/// A missing file or missing keys yield `Ok(None)`; only unreadable or
/// malformed files are errors.
pub fn load_secrets(path: &Path) -> Result<Option<Credentials>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let secrets: Option<HashMap<String, serde_yaml::Value>> = serde_yaml::from_str(&content)
        .map_err(|e| ConfigError::SecretsParseFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    let Some(secrets) = secrets else {
        return Ok(None);
    };

    let get = |key: &str| {
        secrets
            .get(key)
            .and_then(|value| value.as_str())
            .map(str::to_string)
    };

    Ok(Credentials::from_parts(
        get(SECRET_API_KEY),
        get(SECRET_API_SECRET),
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::Mutex;

    use tempfile::tempdir;

    /// In-memory store that records every save
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub(crate) config: Mutex<Option<EntryConfig>>,
        pub(crate) saves: Mutex<usize>,
    }

    impl MemoryStore {
        pub(crate) fn with(name: &str, search_or_id: &str) -> Self {
            Self {
                config: Mutex::new(Some(EntryConfig {
                    name: name.to_string(),
                    search_or_id: search_or_id.to_string(),
                })),
                saves: Mutex::new(0),
            }
        }
    }

    impl ConfigStore for MemoryStore {
        fn load(&self) -> Result<EntryConfig, ConfigError> {
            self.config
                .lock()
                .unwrap()
                .clone()
                .ok_or(ConfigError::NoTrackedTerms)
        }

        fn save(&self, config: &EntryConfig) -> Result<(), ConfigError> {
            *self.config.lock().unwrap() = Some(config.clone());
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn json_store_write_and_read() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("entry.json"));
        let terms = TrackedTerms::parse_list("rust,920666").unwrap();

        store.save(&EntryConfig::new("My Pods", &terms)).unwrap();
        let read_back = store.load().unwrap();

        assert_eq!(read_back.name, "My Pods");
        assert_eq!(read_back.tracked_terms().unwrap(), terms);
    }

    #[test]
    fn json_store_defaults_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entry.json");
        std::fs::write(&path, r#"{"search_or_id":"news"}"#).unwrap();

        let config = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(config.name, DEFAULT_NAME);
    }

    #[test]
    fn json_store_reports_missing_and_malformed_files() {
        let dir = tempdir().unwrap();

        let missing = JsonFileStore::new(dir.path().join("missing.json")).load();
        assert!(matches!(missing, Err(ConfigError::ReadFailed { .. })));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        let malformed = JsonFileStore::new(&path).load();
        assert!(matches!(malformed, Err(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn secrets_file_provides_credentials() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.yaml");
        std::fs::write(
            &path,
            "podcast_index_api_key: KEY\npodcast_index_api_secret: SECRET\nother: 1\n",
        )
        .unwrap();

        let credentials = load_secrets(&path).unwrap().unwrap();
        assert_eq!(credentials, Credentials::new("KEY", "SECRET"));
    }

    #[test]
    fn secrets_file_missing_or_incomplete_is_none() {
        let dir = tempdir().unwrap();
        assert!(load_secrets(&dir.path().join("nope.yaml")).unwrap().is_none());

        let path = dir.path().join("secrets.yaml");
        std::fs::write(&path, "podcast_index_api_key: KEY\n").unwrap();
        assert!(load_secrets(&path).unwrap().is_none());

        std::fs::write(&path, "").unwrap();
        assert!(load_secrets(&path).unwrap().is_none());
    }

    #[test]
    fn malformed_secrets_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.yaml");
        std::fs::write(&path, "key: [unclosed").unwrap();
        assert!(matches!(
            load_secrets(&path),
            Err(ConfigError::SecretsParseFailed { .. })
        ));
    }
}
