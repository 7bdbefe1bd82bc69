// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entry lifecycle and action routing.
//!
//! An [`Integration`] owns every running entry. Each entry has its own API
//! client, tracked identifier list, config store and poll scheduler.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};

use crate::api::PodcastIndexClient;
use crate::auth::Credentials;
use crate::config::{ConfigStore, EntryConfig};
use crate::dispatch::{self, ACTIONS, Action, SearchAndPlay, TermChange, required};
use crate::error::{SetupError, UpdateError};
use crate::http::HttpClient;
use crate::playback::PlaybackSink;
use crate::resolver::EpisodeResolver;
use crate::scheduler::{PollScheduler, Snapshot};
use crate::sensor::SensorState;
use crate::tracked::{TrackedId, TrackedTerms};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// Everything needed to start one entry
pub struct EntrySetup<C> {
    pub credentials: Option<Credentials>,
    pub http: C,
    pub store: Box<dyn ConfigStore>,
    pub scan_interval: Duration,
}

/// Running state of one configured entry
pub struct EntryContext<C> {
    entry_id: String,
    name: String,
    client: Arc<PodcastIndexClient<C>>,
    store: Box<dyn ConfigStore>,
    interval: Duration,
    terms: RwLock<TrackedTerms>,
    scheduler: tokio::sync::RwLock<Option<PollScheduler<C>>>,
    /// Serializes add/remove so restarts never interleave
    reconfigure: Mutex<()>,
}

fn resolvers_for<C: HttpClient>(
    client: &Arc<PodcastIndexClient<C>>,
    terms: &TrackedTerms,
) -> Vec<EpisodeResolver<C>> {
    terms
        .ids()
        .map(|id| EpisodeResolver::new(Arc::clone(client), id))
        .collect()
}

impl<C: HttpClient + 'static> EntryContext<C> {
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Arc<PodcastIndexClient<C>> {
        &self.client
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current identifier list
    pub fn terms(&self) -> TrackedTerms {
        read(&self.terms).clone()
    }

    /// Identifiers the running scheduler polls
    pub async fn polled_terms(&self) -> Vec<String> {
        match self.scheduler.read().await.as_ref() {
            Some(scheduler) => scheduler.terms().map(str::to_string).collect(),
            None => Vec::new(),
        }
    }

    pub async fn snapshot(&self, term: &str) -> Option<Snapshot> {
        self.scheduler.read().await.as_ref()?.snapshot(term)
    }

    pub async fn subscribe(&self, term: &str) -> Option<watch::Receiver<Snapshot>> {
        self.scheduler.read().await.as_ref()?.subscribe(term)
    }

    /// Poll one identifier now; `None` if it is not tracked
    pub async fn refresh(&self, term: &str) -> Option<bool> {
        self.scheduler.read().await.as_ref()?.refresh(term).await
    }

    /// Published state of every tracked identifier
    pub async fn sensor_states(&self, now: DateTime<Utc>) -> Vec<SensorState> {
        let guard = self.scheduler.read().await;
        let Some(scheduler) = guard.as_ref() else {
            return Vec::new();
        };

        scheduler
            .snapshots()
            .iter()
            .map(|(term, snapshot)| SensorState::render(&self.name, term, snapshot, now))
            .collect()
    }

    /// Track one more identifier
    ///
    /// The identifier must resolve to an episode before anything is persisted.
    pub async fn add_search_term(&self, term: &str) -> Result<(), UpdateError> {
        let _guard = self.reconfigure.lock().await;

        let updated = self.terms().with_added(term)?;

        let check = EpisodeResolver::new(Arc::clone(&self.client), TrackedId::parse(term));
        if check.latest_episode().await?.is_none() {
            return Err(UpdateError::Unresolved(term.to_string()));
        }

        self.apply(updated).await?;
        info!(entry = %self.entry_id, term, "search term added");
        Ok(())
    }

    /// Stop tracking an identifier; the last one cannot be removed
    pub async fn remove_search_term(&self, term: &str) -> Result<(), UpdateError> {
        let _guard = self.reconfigure.lock().await;

        let updated = self.terms().without(term)?;

        self.apply(updated).await?;
        info!(entry = %self.entry_id, term, "search term removed");
        Ok(())
    }

    /// Restart polling with a new list, then persist it
    ///
    /// Nothing changes unless the new scheduler's first refresh succeeds and
    /// the config is saved; the old scheduler keeps running until then.
    async fn apply(&self, updated: TrackedTerms) -> Result<(), UpdateError> {
        let replacement =
            PollScheduler::start(resolvers_for(&self.client, &updated), self.interval)
                .await
                .map_err(UpdateError::Restart)?;

        // Dropping an unsaved replacement aborts its timers
        self.store.save(&EntryConfig::new(&self.name, &updated))?;

        *write(&self.terms) = updated;
        let previous = self.scheduler.write().await.replace(replacement);
        if let Some(previous) = previous {
            previous.stop();
        }
        Ok(())
    }

    /// Stop polling; further reads see no snapshots
    pub async fn shutdown(&self) {
        if let Some(scheduler) = self.scheduler.write().await.take() {
            scheduler.stop();
        }
    }
}

/// Owner of all running entries and their shared actions
pub struct Integration<C> {
    sink: Arc<dyn PlaybackSink>,
    entries: RwLock<Vec<Arc<EntryContext<C>>>>,
    actions: RwLock<Vec<&'static str>>,
}

impl<C: HttpClient + 'static> Integration<C> {
    pub fn new(sink: Arc<dyn PlaybackSink>) -> Self {
        Self {
            sink,
            entries: RwLock::new(Vec::new()),
            actions: RwLock::new(Vec::new()),
        }
    }

    /// Start an entry: validate credentials, check the API, run the first
    /// refresh and arm the timers
    pub async fn setup_entry(
        &self,
        entry_id: &str,
        setup: EntrySetup<C>,
    ) -> Result<(), SetupError> {
        if self.entry(entry_id).is_some() {
            return Err(SetupError::DuplicateEntry(entry_id.to_string()));
        }

        let Some(credentials) = setup.credentials else {
            error!(entry = entry_id, "Podcast Index API credentials not found");
            return Err(SetupError::CredentialsMissing);
        };

        let config = setup.store.load()?;
        let terms = config.tracked_terms()?;

        let client = Arc::new(PodcastIndexClient::new(setup.http, credentials));
        client.test_connection().await.map_err(|e| {
            error!(entry = entry_id, error = %e, "failed to connect to Podcast Index API");
            SetupError::NotReady(e)
        })?;

        let scheduler =
            PollScheduler::start(resolvers_for(&client, &terms), setup.scan_interval).await?;
        let interval = scheduler.interval();

        let context = Arc::new(EntryContext {
            entry_id: entry_id.to_string(),
            name: config.name,
            client,
            store: setup.store,
            interval,
            terms: RwLock::new(terms),
            scheduler: tokio::sync::RwLock::new(Some(scheduler)),
            reconfigure: Mutex::new(()),
        });

        {
            let mut entries = write(&self.entries);
            if entries.iter().any(|e| e.entry_id == entry_id) {
                return Err(SetupError::DuplicateEntry(entry_id.to_string()));
            }
            entries.push(context);
            if entries.len() == 1 {
                *write(&self.actions) = ACTIONS.to_vec();
            }
        }

        info!(entry = entry_id, "entry set up");
        Ok(())
    }

    /// Stop an entry; returns false if it was not running
    pub async fn unload_entry(&self, entry_id: &str) -> bool {
        let removed = {
            let mut entries = write(&self.entries);
            let Some(index) = entries.iter().position(|e| e.entry_id == entry_id) else {
                return false;
            };
            let removed = entries.remove(index);
            if entries.is_empty() {
                write(&self.actions).clear();
            }
            removed
        };

        removed.shutdown().await;
        info!(entry = entry_id, "entry unloaded");
        true
    }

    pub fn entry(&self, entry_id: &str) -> Option<Arc<EntryContext<C>>> {
        read(&self.entries)
            .iter()
            .find(|e| e.entry_id == entry_id)
            .cloned()
    }

    pub fn entries(&self) -> Vec<Arc<EntryContext<C>>> {
        read(&self.entries).clone()
    }

    /// Action names currently accepted by [`call`](Self::call)
    pub fn registered_actions(&self) -> Vec<&'static str> {
        read(&self.actions).clone()
    }

    /// Dispatch an inbound action by name
    ///
    /// Failures are logged; nothing is reported back to the caller.
    pub async fn call(&self, name: &str, data: Value) {
        if !read(&self.actions).iter().any(|action| *action == name) {
            warn!(action = name, "action is not registered");
            return;
        }

        match Action::parse(name, data) {
            Ok(Action::SearchAndPlay(request)) => self.search_and_play(request).await,
            Ok(Action::AddSearchTerm(change)) => self.add_search_term(change).await,
            Ok(Action::RemoveSearchTerm(change)) => self.remove_search_term(change).await,
            Err(e) => warn!(error = %e, "ignoring action call"),
        }
    }

    pub async fn search_and_play(&self, request: SearchAndPlay) {
        let Some(entry) = self.entries().into_iter().next() else {
            warn!("search_and_play: no entry is running");
            return;
        };
        dispatch::search_and_play(entry.client(), self.sink.as_ref(), request).await;
    }

    pub async fn add_search_term(&self, change: TermChange) {
        let Some((entry, term)) = self.target(change, "add_search_term") else {
            return;
        };
        if let Err(e) = entry.add_search_term(&term).await {
            warn!(entry = %entry.entry_id, %term, error = %e, "search term not added");
        }
    }

    pub async fn remove_search_term(&self, change: TermChange) {
        let Some((entry, term)) = self.target(change, "remove_search_term") else {
            return;
        };
        if let Err(e) = entry.remove_search_term(&term).await {
            warn!(entry = %entry.entry_id, %term, error = %e, "search term not removed");
        }
    }

    /// Entry addressed by `target_config` (id or name), or the first entry
    fn target(&self, change: TermChange, action: &str) -> Option<(Arc<EntryContext<C>>, String)> {
        let Some(term) = required(change.search_term) else {
            warn!(action, "no search_term provided");
            return None;
        };

        let entries = self.entries();
        let entry = match change.target_config {
            Some(target) => {
                let found = entries
                    .into_iter()
                    .find(|e| e.entry_id == target || e.name == target);
                if found.is_none() {
                    warn!(action, %target, "no entry matches target_config");
                }
                found
            }
            None => {
                let first = entries.into_iter().next();
                if first.is_none() {
                    warn!(action, "no entry is running");
                }
                first
            }
        }?;

        Some((entry, term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::api::MockHttpClient;
    use crate::config::JsonFileStore;
    use crate::config::tests::MemoryStore;
    use crate::error::{ConfigError, TermError};
    use crate::playback::tests::RecordingSink;
    use crate::scheduler::DEFAULT_SCAN_INTERVAL;

    const SEARCH: &str =
        r#"{"status":"true","feeds":[{"title":"Test Cast","url":"http://feed"}]}"#;
    const EP1: &str =
        r#"{"status":"true","episodes":[{"title":"Ep1","enclosureUrl":"http://a.mp3"}]}"#;

    fn api_mock() -> MockHttpClient {
        MockHttpClient::new()
            .respond("/search/byterm", SEARCH)
            .respond("/episodes/byfeedurl", EP1)
            .respond("/podcasts/byfeedid", r#"{"status":"true","feed":{"title":"By ID"}}"#)
            .respond("/episodes/byfeedid", EP1)
    }

    /// Store shared with the test so saves can be inspected afterwards
    struct SharedStore(Arc<MemoryStore>);

    impl ConfigStore for SharedStore {
        fn load(&self) -> Result<EntryConfig, ConfigError> {
            self.0.load()
        }

        fn save(&self, config: &EntryConfig) -> Result<(), ConfigError> {
            self.0.save(config)
        }
    }

    fn setup(mock: MockHttpClient, store: &Arc<MemoryStore>) -> EntrySetup<MockHttpClient> {
        EntrySetup {
            credentials: Some(Credentials::new("KEY", "SECRET")),
            http: mock,
            store: Box::new(SharedStore(Arc::clone(store))),
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }

    fn integration() -> (Integration<MockHttpClient>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (Integration::new(sink.clone()), sink)
    }

    fn saves(store: &MemoryStore) -> usize {
        *store.saves.lock().unwrap()
    }

    fn persisted(store: &MemoryStore) -> String {
        store.config.lock().unwrap().as_ref().unwrap().search_or_id.clone()
    }

    #[tokio::test]
    async fn setup_runs_first_refresh_and_registers_actions() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test,123"));

        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();

        assert_eq!(integration.registered_actions(), ACTIONS);
        let entry = integration.entry("e1").unwrap();
        assert_eq!(entry.name(), "Pods");
        assert_eq!(entry.polled_terms().await, ["test", "123"]);

        let states = entry.sensor_states(Utc::now()).await;
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].value, "Ep1");
        assert_eq!(states[0].unique_id, "pods_test_latest_episode");
        assert_eq!(states[1].name, "Pods By ID Latest Episode");
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_requests() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));
        let mut entry = setup(api_mock(), &store);
        entry.credentials = None;

        let result = integration.setup_entry("e1", entry).await;
        assert!(matches!(result, Err(SetupError::CredentialsMissing)));
        assert!(integration.entry("e1").is_none());
        assert!(integration.registered_actions().is_empty());
    }

    #[tokio::test]
    async fn failed_connection_test_is_not_ready() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));
        let mock = MockHttpClient::new().respond_with_status("/search/byterm", 401, "");

        let result = integration.setup_entry("e1", setup(mock, &store)).await;
        assert!(matches!(result, Err(SetupError::NotReady(_))));
        assert!(integration.entries().is_empty());
    }

    #[tokio::test]
    async fn duplicate_entry_id_is_rejected() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));

        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();
        let again = integration.setup_entry("e1", setup(api_mock(), &store)).await;
        assert!(matches!(again, Err(SetupError::DuplicateEntry(id)) if id == "e1"));
    }

    #[tokio::test]
    async fn actions_live_until_last_entry_unloads() {
        let (integration, _sink) = integration();
        let first = Arc::new(MemoryStore::with("One", "test"));
        let second = Arc::new(MemoryStore::with("Two", "news"));

        integration.setup_entry("e1", setup(api_mock(), &first)).await.unwrap();
        integration.setup_entry("e2", setup(api_mock(), &second)).await.unwrap();

        assert!(integration.unload_entry("e1").await);
        assert_eq!(integration.registered_actions(), ACTIONS);

        assert!(integration.unload_entry("e2").await);
        assert!(integration.registered_actions().is_empty());
        assert!(!integration.unload_entry("e2").await);
    }

    #[tokio::test]
    async fn unloaded_entry_stops_polling() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();
        let entry = integration.entry("e1").unwrap();

        integration.unload_entry("e1").await;

        assert!(entry.snapshot("test").await.is_none());
        assert_eq!(entry.refresh("test").await, None);
    }

    #[tokio::test]
    async fn call_search_and_play_plays_once() {
        let (integration, sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();

        integration
            .call(
                "search_and_play",
                json!({"entity_id": "media_player.kitchen", "search_term": "test"}),
            )
            .await;

        let plays = sink.plays();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].media_content_id, "http://a.mp3");
    }

    #[tokio::test]
    async fn call_before_setup_is_ignored() {
        let (integration, sink) = integration();

        integration
            .call("search_and_play", json!({"sink_id": "kitchen", "search_term": "test"}))
            .await;
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn call_with_missing_term_makes_no_requests() {
        let (integration, sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();
        let entry = integration.entry("e1").unwrap();
        let before = entry.client().http_client().request_count();

        integration.call("search_and_play", json!({"sink_id": "kitchen"})).await;
        integration.call("add_search_term", json!({})).await;

        assert_eq!(entry.client().http_client().request_count(), before);
        assert!(sink.calls().is_empty());
        assert_eq!(saves(&store), 0);
    }

    #[tokio::test]
    async fn add_persists_and_restarts_scheduler() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();

        integration
            .call("add_search_term", json!({"search_term": "news"}))
            .await;

        let entry = integration.entry("e1").unwrap();
        assert_eq!(saves(&store), 1);
        assert_eq!(persisted(&store), "test,news");
        assert_eq!(entry.terms().to_list_string(), "test,news");
        assert_eq!(entry.polled_terms().await, ["test", "news"]);
        assert!(entry.snapshot("news").await.is_some());
    }

    #[tokio::test]
    async fn add_duplicate_changes_nothing() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();
        let entry = integration.entry("e1").unwrap();

        let result = entry.add_search_term("test").await;
        assert!(matches!(result, Err(UpdateError::Term(TermError::Duplicate(_)))));
        assert_eq!(saves(&store), 0);
        assert_eq!(entry.polled_terms().await, ["test"]);
    }

    #[tokio::test]
    async fn add_requires_a_resolvable_term() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();
        let entry = integration.entry("e1").unwrap();

        entry
            .client()
            .http_client()
            .set("/search/byterm?q=nothing&max=1", 200, r#"{"status":"true","feeds":[]}"#);

        let result = entry.add_search_term("nothing").await;
        assert!(matches!(result, Err(UpdateError::Unresolved(term)) if term == "nothing"));
        assert_eq!(saves(&store), 0);
    }

    #[tokio::test]
    async fn remove_last_term_is_rejected() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();
        let entry = integration.entry("e1").unwrap();

        let result = entry.remove_search_term("test").await;
        assert!(matches!(result, Err(UpdateError::Term(TermError::LastRemaining(_)))));

        let unknown = entry.remove_search_term("other").await;
        assert!(matches!(unknown, Err(UpdateError::Term(TermError::NotTracked(_)))));

        assert_eq!(saves(&store), 0);
        assert_eq!(entry.polled_terms().await, ["test"]);
    }

    #[tokio::test]
    async fn remove_persists_and_restarts_scheduler() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "test,123"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();

        integration
            .call("remove_search_term", json!({"search_term": "test", "target_config": "Pods"}))
            .await;

        let entry = integration.entry("e1").unwrap();
        assert_eq!(persisted(&store), "123");
        assert_eq!(entry.polled_terms().await, ["123"]);
        assert!(entry.snapshot("test").await.is_none());
    }

    #[tokio::test]
    async fn target_config_selects_entry() {
        let (integration, _sink) = integration();
        let first = Arc::new(MemoryStore::with("One", "test"));
        let second = Arc::new(MemoryStore::with("Two", "test"));
        integration.setup_entry("e1", setup(api_mock(), &first)).await.unwrap();
        integration.setup_entry("e2", setup(api_mock(), &second)).await.unwrap();

        integration
            .call("add_search_term", json!({"search_term": "news", "target_config": "e2"}))
            .await;
        integration
            .call("add_search_term", json!({"search_term": "daily", "target_config": "Three"}))
            .await;

        assert_eq!(saves(&first), 0);
        assert_eq!(persisted(&second), "test,news");
    }

    #[tokio::test]
    async fn added_terms_reload_from_the_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry.json");
        let terms = TrackedTerms::parse_list("news").unwrap();
        JsonFileStore::new(&path)
            .save(&EntryConfig::new("Pods", &terms))
            .unwrap();

        let (integration, _sink) = integration();
        let file_setup = |mock: MockHttpClient| EntrySetup {
            credentials: Some(Credentials::new("KEY", "SECRET")),
            http: mock,
            store: Box::new(JsonFileStore::new(&path)),
            scan_interval: DEFAULT_SCAN_INTERVAL,
        };
        integration.setup_entry("e1", file_setup(api_mock())).await.unwrap();
        let entry = integration.entry("e1").unwrap();

        let padded = entry.add_search_term(" news").await;
        assert!(matches!(padded, Err(UpdateError::Term(TermError::Unstorable(_)))));
        let joined = entry.add_search_term("a,b").await;
        assert!(matches!(joined, Err(UpdateError::Term(TermError::Unstorable(_)))));

        entry.add_search_term("daily news").await.unwrap();

        let reloaded = JsonFileStore::new(&path).load().unwrap().tracked_terms().unwrap();
        assert_eq!(reloaded, entry.terms());
        assert_eq!(reloaded.to_list_string(), "news,daily news");

        integration.unload_entry("e1").await;
        integration.setup_entry("e1", file_setup(api_mock())).await.unwrap();
    }

    #[tokio::test]
    async fn failed_restart_on_add_changes_nothing() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "123"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();
        let entry = integration.entry("e1").unwrap();

        entry.client().http_client().set("/episodes/byfeedid", 503, "");

        let result = entry.add_search_term("news").await;
        assert!(matches!(result, Err(UpdateError::Restart(SetupError::NotReady(_)))));
        assert_eq!(saves(&store), 0);
        assert_eq!(entry.terms().to_list_string(), "123");
        assert_eq!(entry.polled_terms().await, ["123"]);

        entry.client().http_client().set("/episodes/byfeedid", 200, EP1);
        entry.add_search_term("news").await.unwrap();
        assert_eq!(persisted(&store), "123,news");
        assert_eq!(entry.polled_terms().await, ["123", "news"]);
    }

    #[tokio::test]
    async fn failed_restart_on_remove_keeps_polling_the_term() {
        let (integration, _sink) = integration();
        let store = Arc::new(MemoryStore::with("Pods", "123,test"));
        integration.setup_entry("e1", setup(api_mock(), &store)).await.unwrap();
        let entry = integration.entry("e1").unwrap();

        entry.client().http_client().set("/episodes/byfeedurl", 503, "");

        let result = entry.remove_search_term("123").await;
        assert!(matches!(result, Err(UpdateError::Restart(_))));
        assert_eq!(saves(&store), 0);
        assert_eq!(entry.terms().to_list_string(), "123,test");
        assert_eq!(entry.polled_terms().await, ["123", "test"]);

        entry.client().http_client().set("/episodes/byfeedurl", 200, EP1);
        entry.remove_search_term("123").await.unwrap();
        assert_eq!(persisted(&store), "test");
    }
}
