mod client;
mod parse;

pub use client::{DEFAULT_BASE_URL, PodcastIndexClient};
pub use parse::{Episode, Podcast};

#[cfg(test)]
pub(crate) use client::tests::{MockHttpClient, client as mock_client};
