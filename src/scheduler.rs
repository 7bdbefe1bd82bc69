// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::Episode;
use crate::error::SetupError;
use crate::http::HttpClient;
use crate::resolver::EpisodeResolver;

/// Default time between two polls of the same identifier
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(300);

/// Latest resolution result for one tracked identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// `None` means the API had nothing for this identifier
    pub episode: Option<Episode>,
    /// False after a failed poll; `episode` then still holds the last good value
    pub last_update_success: bool,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    fn fresh(episode: Option<Episode>) -> Self {
        Self {
            episode,
            last_update_success: true,
            updated_at: Utc::now(),
        }
    }
}

struct PollEntry<C> {
    resolver: EpisodeResolver<C>,
    tx: watch::Sender<Snapshot>,
}

impl<C: HttpClient> PollEntry<C> {
    async fn poll(&self) -> bool {
        let term = self.resolver.id();
        match self.resolver.latest_episode().await {
            Ok(episode) => {
                debug!(%term, found = episode.is_some(), "poll completed");
                self.tx.send_replace(Snapshot::fresh(episode));
                true
            }
            Err(e) => {
                warn!(%term, error = %e, "poll failed, keeping last snapshot");
                self.tx.send_modify(|snapshot| snapshot.last_update_success = false);
                false
            }
        }
    }
}

/// Periodic refresh of every tracked identifier
///
/// Each identifier owns its resolver, its watch channel and its timer task.
/// Dropping the scheduler aborts all timers.
pub struct PollScheduler<C> {
    entries: Vec<Arc<PollEntry<C>>>,
    tasks: Vec<JoinHandle<()>>,
    interval: Duration,
}

impl<C: HttpClient + 'static> PollScheduler<C> {
    /// Run the first refresh for every resolver, then arm the timers
    ///
    /// Fails without arming anything if any first refresh fails.
    pub async fn start(
        resolvers: Vec<EpisodeResolver<C>>,
        interval: Duration,
    ) -> Result<Self, SetupError> {
        let interval = if interval.is_zero() {
            warn!("scan interval must be positive, using default");
            DEFAULT_SCAN_INTERVAL
        } else {
            interval
        };

        let first_refresh = join_all(resolvers.iter().map(|r| r.latest_episode())).await;

        let mut entries = Vec::with_capacity(resolvers.len());
        for (resolver, result) in resolvers.into_iter().zip(first_refresh) {
            let episode = result.map_err(|e| {
                warn!(term = %resolver.id(), error = %e, "first refresh failed");
                SetupError::NotReady(e)
            })?;
            let (tx, _) = watch::channel(Snapshot::fresh(episode));
            entries.push(Arc::new(PollEntry { resolver, tx }));
        }

        let tasks = entries
            .iter()
            .map(|entry| spawn_poll_loop(Arc::clone(entry), interval))
            .collect();

        info!(
            identifiers = entries.len(),
            interval_secs = interval.as_secs(),
            "poll scheduler started"
        );

        Ok(Self {
            entries,
            tasks,
            interval,
        })
    }

    /// Poll one identifier now; `None` if it is not tracked
    pub async fn refresh(&self, term: &str) -> Option<bool> {
        let entry = self.entry(term)?;
        Some(entry.poll().await)
    }
}

impl<C> PollScheduler<C> {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tracked identifiers in configuration order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.resolver.id().as_str())
    }

    pub fn snapshot(&self, term: &str) -> Option<Snapshot> {
        self.entry(term).map(|entry| entry.tx.borrow().clone())
    }

    /// Current snapshot of every identifier, in configuration order
    pub fn snapshots(&self) -> Vec<(String, Snapshot)> {
        self.entries
            .iter()
            .map(|entry| {
                (
                    entry.resolver.id().to_string(),
                    entry.tx.borrow().clone(),
                )
            })
            .collect()
    }

    /// Receive every snapshot published for `term` from now on
    pub fn subscribe(&self, term: &str) -> Option<watch::Receiver<Snapshot>> {
        self.entry(term).map(|entry| entry.tx.subscribe())
    }

    /// Abort all timers; in-flight polls are abandoned
    pub fn stop(self) {
        info!(identifiers = self.entries.len(), "poll scheduler stopped");
    }

    fn entry(&self, term: &str) -> Option<&Arc<PollEntry<C>>> {
        self.entries
            .iter()
            .find(|entry| entry.resolver.id().as_str() == term)
    }
}

impl<C> Drop for PollScheduler<C> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_poll_loop<C: HttpClient + 'static>(
    entry: Arc<PollEntry<C>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // first refresh already ran

        loop {
            ticker.tick().await;
            entry.poll().await;
        }
    })
}
