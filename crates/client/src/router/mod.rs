//! The cache router.
//!
//! A [`CacheRouter`] owns one cache version. It precaches the install
//! manifest, deletes other versions' stores on activation, and once active
//! answers intercepted requests with one of three strategies:
//!
//! - cache-first: any store, else network and write the static store
//! - network-first: network and write the dynamic store, else any store
//! - network-only: network, no store access
//!
//! Store writes are spawned and not awaited before the response is returned.
//! [`CacheRouter::settle_writes`] waits for the ones still in flight.

mod messages;
mod phases;
mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

use vet_sw_core::config::AppConfig;
use vet_sw_core::{
    BypassReason, CacheDb, Classifier, Error, HttpResponse, InterceptedRequest, Lifecycle, Phase, RequestKey, Route,
    RouteRules, StoreNames, Strategy,
};

use crate::fetch::Fetcher;

/// Everything a router needs to know about its version.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Cache version tag; store names derive from it.
    pub version: String,
    /// Origin that precache paths resolve against.
    pub origin: Url,
    /// Root-relative paths fetched at install.
    pub precache: Vec<String>,
    pub rules: RouteRules,
    /// Activate as soon as install finishes.
    pub skip_waiting_on_install: bool,
}

impl From<&AppConfig> for RouterConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            version: config.cache_version.clone(),
            origin: config.origin.clone(),
            precache: config.precache.clone(),
            rules: config.route_rules(),
            skip_waiting_on_install: config.skip_waiting_on_install,
        }
    }
}

/// Where a routed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Network,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Network => "network",
        }
    }
}

/// A response produced by one of the strategies.
#[derive(Debug, Clone)]
pub struct Routed {
    pub strategy: Strategy,
    pub source: Source,
    pub response: HttpResponse,
}

/// What the router did with a request.
#[derive(Debug, Clone)]
pub enum Interception {
    /// Not intercepted; the host sends it to the network itself.
    Passthrough(BypassReason),
    Handled(Routed),
}

/// Versioned cache router.
pub struct CacheRouter {
    config: RouterConfig,
    names: StoreNames,
    classifier: Classifier,
    storage: CacheDb,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: Lifecycle,
    skip_waiting: AtomicBool,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl CacheRouter {
    /// Build a router in the `Pending` phase.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the classification rules do not compile.
    pub fn new(config: RouterConfig, storage: CacheDb, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let classifier = Classifier::new(config.rules.clone())?;
        let names = StoreNames::for_version(&config.version);

        Ok(Self {
            config,
            names,
            classifier,
            storage,
            fetcher,
            lifecycle: Lifecycle::new(),
            skip_waiting: AtomicBool::new(false),
            pending_writes: Mutex::new(Vec::new()),
        })
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn store_names(&self) -> &StoreNames {
        &self.names
    }

    pub fn storage(&self) -> &CacheDb {
        &self.storage
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Completion handle: observes every phase change.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.lifecycle.subscribe()
    }

    /// Classify a request without serving it.
    pub fn classify(&self, request: &InterceptedRequest) -> Route {
        self.classifier.classify(&request.method, &request.url)
    }

    /// True if [`CacheRouter::on_fetch`] would serve `request` rather than pass it through.
    ///
    /// Depends only on the method, the URL and the phase, so hosts can decide
    /// before reading a request body.
    pub fn will_handle(&self, request: &InterceptedRequest) -> bool {
        self.lifecycle.is_active() && matches!(self.classify(request), Route::Handle(_))
    }

    /// Handle one intercepted request.
    ///
    /// # Errors
    ///
    /// Returns the network error when the chosen strategy has nothing to
    /// serve, or a cache error if a store lookup fails.
    pub async fn on_fetch(&self, request: &InterceptedRequest) -> Result<Interception, Error> {
        if !self.lifecycle.is_active() {
            return Ok(Interception::Passthrough(BypassReason::Inactive));
        }

        let strategy = match self.classify(request) {
            Route::Bypass(reason) => {
                tracing::trace!(url = %request.url, method = %request.method, reason = reason.as_str(), "not intercepted");
                return Ok(Interception::Passthrough(reason));
            }
            Route::Handle(strategy) => strategy,
        };

        let routed = match strategy {
            Strategy::CacheFirst => self.cache_first(request).await?,
            Strategy::NetworkFirst => self.network_first(request).await?,
            Strategy::NetworkOnly => self.network_only(request).await?,
        };

        tracing::debug!(
            url = %request.url,
            strategy = %routed.strategy,
            source = routed.source.as_str(),
            status = routed.response.status,
            "served"
        );

        Ok(Interception::Handled(routed))
    }

    /// Write `response` into `store` without waiting for the write.
    fn spawn_store_write(&self, store: &str, key: RequestKey, response: &HttpResponse) {
        let storage = self.storage.clone();
        let store = store.to_string();
        let response = response.clone();

        let handle = tokio::spawn(async move {
            match storage.put(&store, &key, &response).await {
                Ok(()) => tracing::debug!(store = %store, url = %key.url, "stored response"),
                Err(e) => tracing::warn!(store = %store, url = %key.url, error = %e, "cache write failed"),
            }
        });

        let mut pending = self.pending_writes.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for every cache write spawned so far.
    pub async fn settle_writes(&self) {
        let handles = std::mem::take(&mut *self.pending_writes.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "cache write task did not complete");
            }
        }
    }
}
