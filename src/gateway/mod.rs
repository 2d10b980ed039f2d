//! The cache gateway: decides, per request, whether to answer from cache,
//! answer from cache while refreshing behind the scenes, or block on a fetch.
//!
//! ## Dispositions
//!
//! Every `/menu` request resolves the entry for its key and classifies the
//! entry's age against the [`FreshnessPolicy`]:
//!
//! - **fresh**: serve the entry, touch nothing.
//! - **stale**: serve the entry, schedule a background refresh through the
//!   [`Spawner`]. The client never waits on or hears about that refresh.
//! - **expired** (or no entry): fetch synchronously and serve the result.
//!
//! ## Failure stance
//!
//! The cache only ever moves forward. A refresh that fails leaves whatever
//! entry was there untouched, and an empty listing is served to the caller
//! but never written, so the next request retries upstream instead of
//! pinning a blank menu.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::background::Spawner;
use crate::cache::{CacheEntry, CacheStore};
use crate::http::{Response, StatusCode};
use crate::menu::MenuKind;
use crate::upstream::Upstream;

pub mod policy;

pub use policy::{Freshness, FreshnessPolicy};

/// Serve-or-refresh orchestrator in front of the upstream API.
///
/// Cloning is cheap (the collaborators sit behind `Arc`s), which is what lets
/// a stale hit hand a clone of the whole gateway to a background task.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn CacheStore>,
    upstream: Arc<dyn Upstream>,
    spawner: Arc<dyn Spawner>,
    policy: FreshnessPolicy,
}

impl Gateway {
    /// Assembles a gateway with the default freshness policy.
    pub fn new(
        store: Arc<dyn CacheStore>,
        upstream: Arc<dyn Upstream>,
        spawner: Arc<dyn Spawner>,
    ) -> Self {
        Self {
            store,
            upstream,
            spawner,
            policy: FreshnessPolicy::default(),
        }
    }

    /// Replaces the freshness policy.
    #[must_use]
    pub fn with_policy(mut self, policy: FreshnessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Answers a menu request according to the cached entry's freshness.
    pub async fn serve(&self, kind: MenuKind) -> Response {
        let key = kind.request_key();

        let entry = match self.store.lookup(&key).await {
            Ok(entry) => entry,
            Err(error) => {
                warn!(key = %key, error = %error, "cache lookup failed, treating as miss");
                None
            }
        };

        let Some(entry) = entry else {
            debug!(key = %key, "cache miss, fetching synchronously");
            return self.refresh(kind).await;
        };

        let age = entry.age();
        match self.policy.classify(age) {
            Freshness::Fresh => {
                debug!(key = %key, age_secs = age.as_secs(), "serving fresh entry");
                Self::entry_response(&entry)
            }
            Freshness::Stale => {
                debug!(
                    key = %key,
                    age_secs = age.as_secs(),
                    "serving stale entry, scheduling background refresh"
                );
                self.schedule_refresh(kind);
                Self::entry_response(&entry)
            }
            Freshness::Expired => {
                debug!(key = %key, age_secs = age.as_secs(), "entry expired, fetching synchronously");
                self.refresh(kind).await
            }
        }
    }

    /// Fetches the listing for `kind` from upstream and builds the response.
    ///
    /// A populated listing is cached (the write itself is handed to the
    /// spawner so the caller is not gated on the store). An empty listing is
    /// served with `no-store` and leaves the cache exactly as it was, and so
    /// does any fetch failure.
    pub async fn refresh(&self, kind: MenuKind) -> Response {
        let key = kind.request_key();

        match self.upstream.fetch(kind).await {
            Ok(listing) if listing.is_empty() => {
                info!(key = %key, "upstream returned an empty listing, serving uncached");
                Response::new(StatusCode::Ok)
                    .header("Content-Type", "application/json")
                    .header("Cache-Control", "no-store")
                    .body_bytes(listing.body.to_vec())
            }
            Ok(listing) => {
                info!(key = %key, files = listing.file_count, "refreshed menu from upstream");
                let entry = CacheEntry::new(listing.body);
                let response = Self::entry_response(&entry);
                self.schedule_store(key, entry);
                response
            }
            Err(error) => {
                warn!(key = %key, error = %error, "upstream fetch failed");
                Response::new(StatusCode::InternalServerError)
                    .json(&serde_json::json!({ "error": "upstream fetch failed" }))
            }
        }
    }

    /// Serves a cache entry verbatim, with the headers it was stored with.
    fn entry_response(entry: &CacheEntry) -> Response {
        Response::new(StatusCode::Ok)
            .header("Content-Type", entry.content_type.clone())
            .header("Cache-Control", entry.cache_control.clone())
            .body_bytes(entry.body.to_vec())
    }

    /// Hands a full refresh for `kind` to the spawner.
    fn schedule_refresh(&self, kind: MenuKind) {
        let gateway = self.clone();
        self.spawner.spawn(Box::pin(async move {
            // The response is discarded: a background refresh exists only
            // for its cache write. Failures have already been logged.
            let _ = gateway.refresh(kind).await;
        }));
    }

    /// Hands the cache write to the spawner so responses never wait on it.
    fn schedule_store(&self, key: String, entry: CacheEntry) {
        let store = Arc::clone(&self.store);
        self.spawner.spawn(Box::pin(async move {
            if let Err(error) = store.store(&key, entry).await {
                warn!(key = %key, error = %error, "cache write failed");
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::background::Task;
    use crate::cache::{MemoryStore, StoreError};
    use crate::upstream::{Listing, UpstreamError};

    use super::*;

    /// Upstream fake that pops pre-scripted results and records every call.
    struct ScriptedUpstream {
        script: Mutex<VecDeque<Result<Listing, UpstreamError>>>,
        calls: AtomicUsize,
        kinds: Mutex<Vec<MenuKind>>,
    }

    impl ScriptedUpstream {
        fn new(script: Vec<Result<Listing, UpstreamError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                kinds: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn kinds(&self) -> Vec<MenuKind> {
            self.kinds.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Upstream for ScriptedUpstream {
        async fn fetch(&self, kind: MenuKind) -> Result<Listing, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.kinds.lock().unwrap().push(kind);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(UpstreamError::Status { code: 599 }))
        }
    }

    /// Spawner fake that queues tasks until the test drives them.
    #[derive(Default)]
    struct DeferredSpawner {
        tasks: Mutex<Vec<Task>>,
    }

    impl Spawner for DeferredSpawner {
        fn spawn(&self, task: Task) {
            self.tasks.lock().unwrap().push(task);
        }
    }

    impl DeferredSpawner {
        fn pending(&self) -> usize {
            self.tasks.lock().unwrap().len()
        }

        /// Runs queued tasks to completion, including tasks they queue.
        async fn drain(&self) {
            loop {
                let batch: Vec<Task> = std::mem::take(&mut *self.tasks.lock().unwrap());
                if batch.is_empty() {
                    break;
                }
                for task in batch {
                    task.await;
                }
            }
        }
    }

    /// Store fake whose every operation fails.
    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn lookup(&self, _key: &str) -> Result<Option<CacheEntry>, StoreError> {
            Err(StoreError::Unavailable {
                message: "store offline".to_owned(),
            })
        }

        async fn store(&self, _key: &str, _entry: CacheEntry) -> Result<(), StoreError> {
            Err(StoreError::Unavailable {
                message: "store offline".to_owned(),
            })
        }
    }

    struct Rig {
        store: Arc<MemoryStore>,
        upstream: Arc<ScriptedUpstream>,
        spawner: Arc<DeferredSpawner>,
        gateway: Gateway,
    }

    fn rig(script: Vec<Result<Listing, UpstreamError>>) -> Rig {
        let store = Arc::new(MemoryStore::new());
        let upstream = Arc::new(ScriptedUpstream::new(script));
        let spawner = Arc::new(DeferredSpawner::default());
        let gateway = Gateway::new(store.clone(), upstream.clone(), spawner.clone());
        Rig {
            store,
            upstream,
            spawner,
            gateway,
        }
    }

    fn listing(names: &[&str]) -> Result<Listing, UpstreamError> {
        let files: Vec<_> = names
            .iter()
            .map(|name| serde_json::json!({ "id": name, "name": name }))
            .collect();
        let body = serde_json::json!({ "files": files }).to_string();
        Ok(Listing::from_json_body(Bytes::from(body)).unwrap())
    }

    fn empty_listing() -> Result<Listing, UpstreamError> {
        Ok(Listing::from_json_body(Bytes::from_static(b"{\"files\":[]}")).unwrap())
    }

    async fn seed(rig: &Rig, kind: MenuKind, body: &'static [u8], age: Duration) {
        let mut entry = CacheEntry::new(Bytes::from_static(body));
        entry.created_at = SystemTime::now() - age;
        rig.store.store(&kind.request_key(), entry).await.unwrap();
    }

    async fn stored_body(rig: &Rig, kind: MenuKind) -> Option<Bytes> {
        rig.store
            .lookup(&kind.request_key())
            .await
            .unwrap()
            .map(|entry| entry.body)
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_contacting_upstream() {
        let rig = rig(vec![]);
        seed(&rig, MenuKind::Lunch, b"cached-menu", Duration::from_secs(45)).await;

        let response = rig.gateway.serve(MenuKind::Lunch).await;

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.payload(), b"cached-menu");
        assert_eq!(
            response.headers().get("cache-control"),
            Some("public, s-maxage=86400")
        );
        assert_eq!(
            response.headers().get("content-type"),
            Some("application/json")
        );
        assert_eq!(rig.upstream.calls(), 0);
        assert_eq!(rig.spawner.pending(), 0);
    }

    #[tokio::test]
    async fn stale_entry_is_served_while_a_refresh_is_scheduled() {
        let rig = rig(vec![listing(&["rebaked.jpg"])]);
        seed(&rig, MenuKind::Lunch, b"stale-menu", Duration::from_secs(500)).await;

        let response = rig.gateway.serve(MenuKind::Lunch).await;

        // The client gets the old payload immediately; upstream has not
        // been touched yet because the refresh is only queued.
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.payload(), b"stale-menu");
        assert_eq!(rig.upstream.calls(), 0);
        assert_eq!(rig.spawner.pending(), 1);

        rig.spawner.drain().await;

        assert_eq!(rig.upstream.calls(), 1);
        let refreshed = stored_body(&rig, MenuKind::Lunch).await.unwrap();
        assert!(refreshed.starts_with(b"{\"files\""));
        let entry = rig
            .store
            .lookup(&MenuKind::Lunch.request_key())
            .await
            .unwrap()
            .unwrap();
        assert!(entry.age() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn expired_entry_is_refreshed_before_responding() {
        let rig = rig(vec![listing(&["today.jpg"])]);
        seed(&rig, MenuKind::Lunch, b"ancient", Duration::from_secs(4_000)).await;

        let response = rig.gateway.serve(MenuKind::Lunch).await;

        // The fetch happened on the request path, not in the background.
        assert_eq!(rig.upstream.calls(), 1);
        assert_eq!(response.status(), StatusCode::Ok);
        let served: serde_json::Value = serde_json::from_slice(response.payload()).unwrap();
        assert_eq!(served["files"][0]["name"], "today.jpg");

        rig.spawner.drain().await;
        assert_ne!(
            stored_body(&rig, MenuKind::Lunch).await.unwrap(),
            Bytes::from_static(b"ancient")
        );
    }

    #[tokio::test]
    async fn cache_miss_fetches_and_populates_the_cache() {
        let rig = rig(vec![listing(&["a.jpg", "b.jpg", "c.jpg"])]);

        let response = rig.gateway.serve(MenuKind::Lunch).await;

        assert_eq!(response.status(), StatusCode::Ok);
        let served: serde_json::Value = serde_json::from_slice(response.payload()).unwrap();
        assert_eq!(served["files"].as_array().unwrap().len(), 3);
        assert_eq!(rig.upstream.calls(), 1);

        rig.spawner.drain().await;
        let entry = rig
            .store
            .lookup(&MenuKind::Lunch.request_key())
            .await
            .unwrap()
            .unwrap();
        assert!(entry.age() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn refresh_failure_surfaces_an_error_and_preserves_the_entry() {
        let rig = rig(vec![Err(UpstreamError::Status { code: 503 })]);
        seed(&rig, MenuKind::Lunch, b"old-menu", Duration::from_secs(4_000)).await;

        let response = rig.gateway.serve(MenuKind::Lunch).await;

        assert_eq!(response.status(), StatusCode::InternalServerError);
        let body: serde_json::Value = serde_json::from_slice(response.payload()).unwrap();
        assert_eq!(body["error"], "upstream fetch failed");

        // The failed refresh must not have rewritten or removed the entry.
        rig.spawner.drain().await;
        let entry = rig
            .store
            .lookup(&MenuKind::Lunch.request_key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.body, Bytes::from_static(b"old-menu"));
        assert!(entry.age() >= Duration::from_secs(3_999));
    }

    #[tokio::test]
    async fn background_refresh_failure_is_invisible_and_harmless() {
        let rig = rig(vec![Err(UpstreamError::Status { code: 500 })]);
        seed(&rig, MenuKind::Lunch, b"still-good", Duration::from_secs(500)).await;

        let response = rig.gateway.serve(MenuKind::Lunch).await;
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.payload(), b"still-good");

        rig.spawner.drain().await;
        assert_eq!(rig.upstream.calls(), 1);
        assert_eq!(
            stored_body(&rig, MenuKind::Lunch).await.unwrap(),
            Bytes::from_static(b"still-good")
        );
    }

    #[tokio::test]
    async fn empty_listing_is_served_with_no_store_and_never_cached() {
        let rig = rig(vec![empty_listing(), empty_listing()]);

        let response = rig.gateway.serve(MenuKind::Lunch).await;

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.headers().get("cache-control"), Some("no-store"));
        assert_eq!(response.payload(), b"{\"files\":[]}");

        rig.spawner.drain().await;
        assert!(stored_body(&rig, MenuKind::Lunch).await.is_none());

        // With nothing cached, the next request hits upstream again.
        rig.gateway.serve(MenuKind::Lunch).await;
        assert_eq!(rig.upstream.calls(), 2);
    }

    #[tokio::test]
    async fn empty_listing_does_not_clobber_an_existing_entry() {
        let rig = rig(vec![empty_listing()]);
        seed(&rig, MenuKind::Lunch, b"last-real-menu", Duration::from_secs(4_000)).await;

        let response = rig.gateway.serve(MenuKind::Lunch).await;

        assert_eq!(response.headers().get("cache-control"), Some("no-store"));
        rig.spawner.drain().await;
        assert_eq!(
            stored_body(&rig, MenuKind::Lunch).await.unwrap(),
            Bytes::from_static(b"last-real-menu")
        );
    }

    #[tokio::test]
    async fn menus_are_cached_independently() {
        let rig = rig(vec![listing(&["roast.jpg"])]);
        seed(&rig, MenuKind::Lunch, b"lunch-menu", Duration::from_secs(10)).await;

        let dinner = rig.gateway.serve(MenuKind::Dinner).await;
        assert_eq!(rig.upstream.calls(), 1);
        assert_eq!(rig.upstream.kinds(), vec![MenuKind::Dinner]);
        assert_eq!(dinner.status(), StatusCode::Ok);

        // The dinner miss must not have consumed or touched the lunch entry.
        let lunch = rig.gateway.serve(MenuKind::Lunch).await;
        assert_eq!(lunch.payload(), b"lunch-menu");
        assert_eq!(rig.upstream.calls(), 1);

        rig.spawner.drain().await;
        assert_eq!(
            stored_body(&rig, MenuKind::Lunch).await.unwrap(),
            Bytes::from_static(b"lunch-menu")
        );
        assert!(stored_body(&rig, MenuKind::Dinner).await.is_some());
    }

    #[tokio::test]
    async fn repeated_refreshes_overwrite_and_restamp_the_entry() {
        let rig = rig(vec![listing(&["first.jpg"]), listing(&["second.jpg"])]);

        rig.gateway.refresh(MenuKind::Lunch).await;
        rig.spawner.drain().await;
        rig.gateway.refresh(MenuKind::Lunch).await;
        rig.spawner.drain().await;

        assert_eq!(rig.upstream.calls(), 2);
        let entry = rig
            .store
            .lookup(&MenuKind::Lunch.request_key())
            .await
            .unwrap()
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&entry.body).unwrap();
        assert_eq!(body["files"][0]["name"], "second.jpg");
        assert!(entry.age() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn store_failures_degrade_to_fetching() {
        let upstream = Arc::new(ScriptedUpstream::new(vec![listing(&["menu.jpg"])]));
        let spawner = Arc::new(DeferredSpawner::default());
        let gateway = Gateway::new(Arc::new(FailingStore), upstream.clone(), spawner.clone());

        let response = gateway.serve(MenuKind::Lunch).await;

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(upstream.calls(), 1);

        // The deferred write fails too; draining it must not blow up.
        spawner.drain().await;
    }

    #[tokio::test]
    async fn custom_policy_changes_dispositions() {
        let rig = rig(vec![listing(&["new.jpg"])]);
        let gateway = rig
            .gateway
            .clone()
            .with_policy(FreshnessPolicy::new(
                Duration::from_secs(10),
                Duration::from_secs(20),
            ));
        seed(&rig, MenuKind::Lunch, b"thirty-seconds-old", Duration::from_secs(30)).await;

        // Thirty seconds is fresh under the default policy but expired here.
        let response = gateway.serve(MenuKind::Lunch).await;

        assert_eq!(rig.upstream.calls(), 1);
        let served: serde_json::Value = serde_json::from_slice(response.payload()).unwrap();
        assert_eq!(served["files"][0]["name"], "new.jpg");
    }
}
