pub mod api;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod integration;
pub mod playback;
pub mod resolver;
pub mod scheduler;
pub mod sensor;
pub mod tracked;

// Re-export main types for convenience
pub use api::{Episode, Podcast, PodcastIndexClient};
pub use auth::Credentials;
pub use config::{ConfigStore, EntryConfig, JsonFileStore, load_secrets};
pub use dispatch::{Action, SearchAndPlay, TermChange};
pub use error::{
    ActionError, ApiError, ConfigError, SetupError, SinkError, TermError, UpdateError,
};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use integration::{EntryContext, EntrySetup, Integration};
pub use playback::{CommandSink, PlayMedia, PlaybackSink};
pub use resolver::EpisodeResolver;
pub use scheduler::{DEFAULT_SCAN_INTERVAL, PollScheduler, Snapshot};
pub use sensor::{EpisodeAttributes, SensorState};
pub use tracked::{TrackedId, TrackedTerms};
