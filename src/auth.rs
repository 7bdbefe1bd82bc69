// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use sha1::{Digest, Sha1};

/// User agent sent with every API request
pub const USER_AGENT: &str = concat!("podlatest/", env!("CARGO_PKG_VERSION"));

/// Podcast Index API key and secret
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Build credentials only if both halves are present and non-empty
    pub fn from_parts(api_key: Option<String>, api_secret: Option<String>) -> Option<Self> {
        match (api_key, api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(Self::new(key, secret))
            }
            _ => None,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Signed headers for a request issued at `timestamp` (unix seconds)
    pub fn auth_headers(&self, timestamp: i64) -> AuthHeaders {
        let timestamp = timestamp.to_string();
        let mut hasher = Sha1::new();
        hasher.update(self.api_key.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hasher.update(timestamp.as_bytes());

        AuthHeaders {
            authorization: hex::encode(hasher.finalize()),
            api_key: self.api_key.clone(),
            timestamp,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Authentication headers valid for one request only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub authorization: String,
    pub api_key: String,
    pub timestamp: String,
}

impl AuthHeaders {
    pub fn to_header_list(&self) -> Vec<(&'static str, String)> {
        vec![
            ("User-Agent", USER_AGENT.to_string()),
            ("Authorization", self.authorization.clone()),
            ("X-Auth-Key", self.api_key.clone()),
            ("X-Auth-Date", self.timestamp.clone()),
        ]
    }
}
