use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, TermError};

/// A tracked search term or numeric Podcast Index feed ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackedId {
    FeedId(String),
    SearchTerm(String),
}

impl TrackedId {
    /// Classify a raw identifier: all-ASCII-digit strings are feed IDs
    pub fn parse(raw: &str) -> Self {
        if is_feed_id(raw) {
            Self::FeedId(raw.to_string())
        } else {
            Self::SearchTerm(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::FeedId(id) => id,
            Self::SearchTerm(term) => term,
        }
    }

    pub fn is_feed_id(&self) -> bool {
        matches!(self, Self::FeedId(_))
    }
}

impl fmt::Display for TrackedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_feed_id(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Ordered, duplicate-free list of tracked identifiers
///
/// Never mutated in place: [`with_added`](Self::with_added) and
/// [`without`](Self::without) return a new list, so readers holding a clone
/// always see a consistent snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTerms {
    terms: Arc<[String]>,
}

impl TrackedTerms {
    /// Build from individual terms; empty entries are skipped
    pub fn new<I, S>(terms: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for term in terms {
            let term = term.into();
            if term.is_empty() {
                continue;
            }
            if list.contains(&term) {
                return Err(ConfigError::DuplicateTerm(term));
            }
            list.push(term);
        }

        if list.is_empty() {
            return Err(ConfigError::NoTrackedTerms);
        }

        Ok(Self { terms: list.into() })
    }

    /// Parse a comma-separated list such as `"rust, 920666,news"`
    pub fn parse_list(raw: &str) -> Result<Self, ConfigError> {
        Self::new(raw.split(',').map(str::trim))
    }

    /// Comma-separated form used for persistence
    pub fn to_list_string(&self) -> String {
        self.terms.join(",")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = TrackedId> + '_ {
        self.iter().map(TrackedId::parse)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Exact, case-sensitive membership test
    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }

    pub fn with_added(&self, term: &str) -> Result<Self, TermError> {
        if term.is_empty() {
            return Err(TermError::Empty);
        }
        // Must survive the comma-separated persisted form unchanged
        if term.contains(',') || term.trim() != term {
            return Err(TermError::Unstorable(term.to_string()));
        }
        if self.contains(term) {
            return Err(TermError::Duplicate(term.to_string()));
        }

        let terms: Vec<String> = self
            .terms
            .iter()
            .cloned()
            .chain(std::iter::once(term.to_string()))
            .collect();
        Ok(Self {
            terms: terms.into(),
        })
    }

    pub fn without(&self, term: &str) -> Result<Self, TermError> {
        if !self.contains(term) {
            return Err(TermError::NotTracked(term.to_string()));
        }
        if self.terms.len() == 1 {
            return Err(TermError::LastRemaining(term.to_string()));
        }

        let terms: Vec<String> = self.terms.iter().filter(|t| *t != term).cloned().collect();
        Ok(Self {
            terms: terms.into(),
        })
    }
}
