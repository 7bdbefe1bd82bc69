use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to the Podcast Index API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// True for network-level failures and non-2xx responses
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }
}

/// Errors that can occur when reading or writing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON in {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse secrets file {path}: {source}")]
    SecretsParseFailed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] serde_json::Error),

    #[error("No search term or podcast ID configured")]
    NoTrackedTerms,

    #[error("Search term or podcast ID '{0}' is listed more than once")]
    DuplicateTerm(String),
}

/// Errors that keep an entry from starting
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Podcast Index API credentials not found")]
    CredentialsMissing,

    #[error("Podcast Index API not ready: {0}")]
    NotReady(#[source] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Entry '{0}' is already set up")]
    DuplicateEntry(String),
}

/// Rejected changes to the tracked identifier list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    #[error("'{0}' is already tracked")]
    Duplicate(String),

    #[error("'{0}' is not tracked")]
    NotTracked(String),

    #[error("Cannot remove '{0}': at least one search term or ID must remain")]
    LastRemaining(String),

    #[error("Search term or ID must not be empty")]
    Empty,

    #[error("'{0}' cannot be stored: no commas or surrounding whitespace allowed")]
    Unstorable(String),
}

/// Errors reported by a playback sink
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to launch player '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sink '{sink_id}' rejected the command: {reason}")]
    Rejected { sink_id: String, reason: String },
}

/// Reasons an add/remove of a tracked identifier did not take effect
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error(transparent)]
    Term(#[from] TermError),

    #[error("'{0}' did not resolve to any episode")]
    Unresolved(String),

    #[error("Test resolution failed: {0}")]
    Api(#[from] ApiError),

    #[error("Failed to persist tracked identifiers: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to restart polling: {0}")]
    Restart(#[source] SetupError),
}

/// Errors decoding an inbound action call
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Unknown action '{0}'")]
    Unknown(String),

    #[error("Invalid data for action '{action}': {source}")]
    InvalidPayload {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}
