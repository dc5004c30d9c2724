//! Schema fetch orchestration.
//!
//! [`SchemaFetchCoordinator`] sits between the UI and the
//! [`IntrospectionClient`]: it consults the [`SchemaCache`] first,
//! bounds retries on transient failures, cancels superseded in-flight
//! fetches, and keeps the active schema fresh with a single-shot
//! auto-refresh timer. Observers subscribe to a [`watch`] channel that
//! carries the current [`SchemaState`].
//!
//! Per target there is at most one fetch in flight and at most one armed
//! timer. Every async completion re-checks the target's generation
//! against the coordinator's current state before applying anything, so
//! a late completion of a superseded fetch can never clobber newer
//! state.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::cache::CacheKey;
use crate::cache::SchemaCache;
use crate::error::FetchError;
use crate::introspection::IntrospectionClient;
use crate::schema::Schema;

/// Time budget for a single introspection request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Additional attempts after the first failed one.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Delay before an auto-refresh re-fetches the active schema.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// An endpoint plus the headers its schema is fetched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub url: Url,
    pub headers: HashMap<String, String>,
}

impl FetchTarget {
    pub fn new(url: Url) -> Self {
        FetchTarget {
            url,
            headers: HashMap::new(),
        }
    }

    pub fn with_headers(url: Url, headers: HashMap<String, String>) -> Self {
        FetchTarget { url, headers }
    }

    pub(crate) fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.url, &self.headers)
    }
}

/// Per-load knobs, all defaulted.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Skip the cache lookup and always hit the network.
    pub skip_cache: bool,
    /// Time budget for each individual attempt.
    pub timeout: Duration,
    /// How many times a timed-out or transport-failed attempt is retried.
    pub max_retries: u32,
    /// Arm the auto-refresh timer once a schema is available.
    pub enable_auto_refresh: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            skip_cache: false,
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            enable_auto_refresh: true,
        }
    }
}

#[buildstructor::buildstructor]
impl LoadOptions {
    #[builder]
    pub fn new(
        skip_cache: Option<bool>,
        timeout: Option<Duration>,
        max_retries: Option<u32>,
        enable_auto_refresh: Option<bool>,
    ) -> Self {
        let defaults = LoadOptions::default();
        LoadOptions {
            skip_cache: skip_cache.unwrap_or(defaults.skip_cache),
            timeout: timeout.unwrap_or(defaults.timeout),
            max_retries: max_retries.unwrap_or(defaults.max_retries),
            enable_auto_refresh: enable_auto_refresh.unwrap_or(defaults.enable_auto_refresh),
        }
    }
}

/// Coordinator-wide policy knobs.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Pause between retry attempts. Zero retries immediately; raise it
    /// to space attempts out.
    pub retry_delay: Duration,
    /// How long after a successful load the auto-refresh fires.
    pub refresh_interval: Duration,
    /// Publish auto-refresh failures as the state's `error` instead of
    /// only logging them. The previously fetched schema is kept either
    /// way.
    pub surface_refresh_errors: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            retry_delay: Duration::ZERO,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            surface_refresh_errors: false,
        }
    }
}

#[buildstructor::buildstructor]
impl CoordinatorConfig {
    #[builder]
    pub fn new(
        retry_delay: Option<Duration>,
        refresh_interval: Option<Duration>,
        surface_refresh_errors: Option<bool>,
    ) -> Self {
        let defaults = CoordinatorConfig::default();
        CoordinatorConfig {
            retry_delay: retry_delay.unwrap_or(defaults.retry_delay),
            refresh_interval: refresh_interval.unwrap_or(defaults.refresh_interval),
            surface_refresh_errors: surface_refresh_errors
                .unwrap_or(defaults.surface_refresh_errors),
        }
    }
}

/// What subscribers observe: the displayed schema and its fetch status.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaState {
    pub schema: Option<Arc<Schema>>,
    pub loading: bool,
    pub error: Option<FetchError>,
    pub last_fetch_time: Option<SystemTime>,
}

/// Bookkeeping for the endpoint currently being served.
struct ActiveTarget {
    key: CacheKey,
    target: FetchTarget,
    options: LoadOptions,
    /// Bumped on every load; completions compare against it before
    /// touching state.
    generation: u64,
    /// Cancels the fetch this generation has in flight.
    cancel: CancellationToken,
    refresh_timer: Option<JoinHandle<()>>,
}

struct Inner {
    client: IntrospectionClient,
    cache: SchemaCache,
    config: CoordinatorConfig,
    active: Mutex<Option<ActiveTarget>>,
    /// Never reused, even across shutdowns, so a completion from before a
    /// teardown can never masquerade as current.
    next_generation: AtomicU64,
    state: watch::Sender<SchemaState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.cancel.cancel();
            if let Some(timer) = active.refresh_timer {
                timer.abort();
            }
        }
    }
}

/// Orchestrates schema fetching for one displayed endpoint at a time.
#[derive(Clone)]
pub struct SchemaFetchCoordinator {
    inner: Arc<Inner>,
}

#[buildstructor::buildstructor]
impl SchemaFetchCoordinator {
    #[builder]
    pub fn new(
        client: Option<IntrospectionClient>,
        cache: Option<SchemaCache>,
        config: Option<CoordinatorConfig>,
    ) -> Self {
        let (state, _) = watch::channel(SchemaState::default());
        SchemaFetchCoordinator {
            inner: Arc::new(Inner {
                client: client.unwrap_or_default(),
                cache: cache.unwrap_or_default(),
                config: config.unwrap_or_default(),
                active: Mutex::new(None),
                next_generation: AtomicU64::new(0),
                state,
            }),
        }
    }
}

impl SchemaFetchCoordinator {
    /// Observe the schema state. The receiver sees the current value
    /// immediately and every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<SchemaState> {
        self.inner.state.subscribe()
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> SchemaState {
        self.inner.state.borrow().clone()
    }

    /// The cache shared by all loads through this coordinator.
    pub fn cache(&self) -> &SchemaCache {
        &self.inner.cache
    }

    /// Loads the schema for a target, making it the active one.
    ///
    /// A load for a different target than the currently active one
    /// behaves as an endpoint switch: the previous in-flight fetch is
    /// cancelled, its timer cleared, and the published state reset
    /// before the new fetch starts.
    ///
    /// Returns `Ok(Some(schema))` on success, `Ok(None)` when this load
    /// was superseded or cancelled (nothing was published), and the
    /// error after retries are exhausted (also published, since this is
    /// a manual load).
    pub async fn load(
        &self,
        target: FetchTarget,
        options: LoadOptions,
    ) -> Result<Option<Arc<Schema>>, FetchError> {
        self.run_load(target, options, false).await
    }

    /// Re-runs the active target's load: a manual refresh outside the
    /// auto-refresh cadence. Respects the cache TTL like any manual
    /// load. No-op returning `Ok(None)` when nothing is active.
    pub async fn refetch(&self) -> Result<Option<Arc<Schema>>, FetchError> {
        let Some((target, options)) = self.active_target() else {
            return Ok(None);
        };
        self.run_load(target, options, false).await
    }

    /// Probes connectivity of a target without touching the active
    /// state or the cache.
    pub async fn check_connectivity(
        &self,
        target: &FetchTarget,
        timeout: Duration,
    ) -> crate::introspection::ConnectivityStatus {
        self.inner
            .client
            .check_connectivity(&target.url, &target.headers, timeout)
            .await
    }

    /// Tears the coordinator down: cancels the in-flight fetch, clears
    /// the timer, and resets the published state. Dropping the last
    /// coordinator handle performs the same cancellation.
    pub fn shutdown(&self) {
        {
            let mut active = self.inner.active.lock();
            if let Some(previous) = active.take() {
                previous.cancel.cancel();
                if let Some(timer) = previous.refresh_timer {
                    timer.abort();
                }
            }
        }
        self.inner.state.send_replace(SchemaState::default());
    }

    fn active_target(&self) -> Option<(FetchTarget, LoadOptions)> {
        let active = self.inner.active.lock();
        active
            .as_ref()
            .map(|active| (active.target.clone(), active.options.clone()))
    }

    async fn run_load(
        &self,
        target: FetchTarget,
        options: LoadOptions,
        is_auto_refresh: bool,
    ) -> Result<Option<Arc<Schema>>, FetchError> {
        let key = target.cache_key();
        let (generation, cancel) = self.begin(&key, &target, &options);

        // An auto-refresh exists to renew entries the TTL still considers
        // fresh, so it always goes to the network.
        if !options.skip_cache && !is_auto_refresh {
            if let Some(schema) = self.inner.cache.get(&key).await {
                // Served without flipping the loading state.
                if self.still_current(&key, generation) {
                    self.inner.state.send_modify(|state| {
                        state.schema = Some(Arc::clone(&schema));
                        state.error = None;
                    });
                    self.arm_refresh(generation);
                }
                return Ok(Some(schema));
            }
        }

        if !is_auto_refresh && self.still_current(&key, generation) {
            self.inner.state.send_modify(|state| {
                state.loading = true;
                state.error = None;
            });
        }

        match self.fetch_with_retries(&target, &options, &cancel).await {
            Ok(schema) => {
                let schema = Arc::new(schema);
                if !self.still_current(&key, generation) {
                    tracing::debug!(url = %target.url, "discarding superseded schema fetch result");
                    return Ok(None);
                }
                self.inner.cache.put(key.clone(), Arc::clone(&schema)).await;
                // The cache write suspended; re-check before publishing.
                if self.still_current(&key, generation) {
                    self.inner.state.send_modify(|state| {
                        state.schema = Some(Arc::clone(&schema));
                        state.loading = false;
                        state.error = None;
                        state.last_fetch_time = Some(SystemTime::now());
                    });
                    self.arm_refresh(generation);
                }
                Ok(Some(schema))
            }
            Err(FetchError::Cancelled) => {
                // Superseded or torn down: terminate silently, the newer
                // load owns the state now.
                Ok(None)
            }
            Err(err) => {
                if self.still_current(&key, generation) {
                    if is_auto_refresh {
                        tracing::warn!(
                            url = %target.url,
                            error = %err,
                            "schema auto-refresh failed; keeping the previously fetched schema"
                        );
                        if self.inner.config.surface_refresh_errors {
                            self.inner
                                .state
                                .send_modify(|state| state.error = Some(err.clone()));
                        }
                        // Keep refreshing on the regular cadence.
                        self.arm_refresh(generation);
                    } else {
                        self.inner.state.send_modify(|state| {
                            state.error = Some(err.clone());
                            state.loading = false;
                        });
                    }
                }
                Err(err)
            }
        }
    }

    /// Opens a new generation for the target, superseding whatever was
    /// active: the previous fetch is cancelled and its timer cleared.
    /// Switching to a different target also resets the published state
    /// so the old endpoint's schema is never visible under the new one.
    fn begin(
        &self,
        key: &CacheKey,
        target: &FetchTarget,
        options: &LoadOptions,
    ) -> (u64, CancellationToken) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        let mut active = self.inner.active.lock();
        let switching = active
            .as_ref()
            .map_or(false, |active| active.key != *key);

        if let Some(previous) = active.take() {
            previous.cancel.cancel();
            if let Some(timer) = previous.refresh_timer {
                timer.abort();
            }
        }

        let cancel = CancellationToken::new();
        *active = Some(ActiveTarget {
            key: key.clone(),
            target: target.clone(),
            options: options.clone(),
            generation,
            cancel: cancel.clone(),
            refresh_timer: None,
        });
        drop(active);

        if switching {
            tracing::debug!(url = %target.url, "switching active endpoint");
            self.inner.state.send_replace(SchemaState::default());
        }

        (generation, cancel)
    }

    fn still_current(&self, key: &CacheKey, generation: u64) -> bool {
        let active = self.inner.active.lock();
        active
            .as_ref()
            .map_or(false, |active| active.key == *key && active.generation == generation)
    }

    async fn fetch_with_retries(
        &self,
        target: &FetchTarget,
        options: &LoadOptions,
        cancel: &CancellationToken,
    ) -> Result<Schema, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self
                .inner
                .client
                .fetch(&target.url, &target.headers, options.timeout, cancel)
                .await
            {
                Ok(schema) => return Ok(schema),
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(err) if err.is_retryable() && attempt < options.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        url = %target.url,
                        error = %err,
                        attempt,
                        max_retries = options.max_retries,
                        "schema fetch failed; retrying"
                    );
                    if !self.inner.config.retry_delay.is_zero() {
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                            _ = tokio::time::sleep(self.inner.config.retry_delay) => {}
                        }
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Arms the single-shot auto-refresh timer for the given generation,
    /// replacing any previously armed one. The timer task holds only a
    /// weak reference; dropping the coordinator defuses it.
    fn arm_refresh(&self, generation: u64) {
        let interval = self.inner.config.refresh_interval;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let mut active = self.inner.active.lock();
        let Some(current) = active.as_mut() else {
            return;
        };
        if current.generation != generation || !current.options.enable_auto_refresh {
            return;
        }
        if let Some(previous) = current.refresh_timer.take() {
            previous.abort();
        }
        current.refresh_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let coordinator = SchemaFetchCoordinator { inner };
            coordinator.auto_refresh(generation).await;
        }));
    }

    /// Runs one auto-refresh round. State is re-read at fire time: a
    /// timer armed for a superseded generation does nothing.
    async fn auto_refresh(&self, armed_generation: u64) {
        let (target, options) = {
            let mut active = self.inner.active.lock();
            match active.as_mut() {
                Some(active) if active.generation == armed_generation => {
                    // The single-shot timer has fired; detach its handle
                    // so the load below does not abort its own task when
                    // it supersedes this generation.
                    active.refresh_timer = None;
                    (active.target.clone(), active.options.clone())
                }
                _ => return,
            }
        };

        tracing::debug!(url = %target.url, "auto-refreshing schema");
        let _ = self.run_load(target, options, true).await;
    }
}
