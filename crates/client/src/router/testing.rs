//! Test doubles for router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use vet_sw_core::config::AppConfig;
use vet_sw_core::{CacheDb, Error, HttpResponse, InterceptedRequest};

use super::{CacheRouter, RouterConfig};
use crate::fetch::Fetcher;

pub(crate) const ORIGIN: &str = "https://vet.example/";

/// Fetcher answering from a per-path script and counting calls.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    script: Mutex<HashMap<String, Option<HttpResponse>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `path` with `response` from now on.
    pub(crate) fn respond(&self, path: &str, response: HttpResponse) {
        self.script.lock().unwrap().insert(path.to_string(), Some(response));
    }

    /// Fail every request for `path` from now on.
    pub(crate) fn fail(&self, path: &str) {
        self.script.lock().unwrap().insert(path.to_string(), None);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
    }

    pub(crate) fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

fn path_of(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<HttpResponse, Error> {
        let path = path_of(&request.url);
        self.calls.lock().unwrap().push(path.clone());

        match self.script.lock().unwrap().get(&path) {
            Some(Some(response)) => Ok(response.clone()),
            Some(None) => Err(Error::Network(format!("connection reset fetching {path}"))),
            None => Err(Error::Network(format!("no route to {path}"))),
        }
    }
}

pub(crate) fn app_config() -> AppConfig {
    AppConfig { origin: Url::parse(ORIGIN).unwrap(), ..Default::default() }
}

pub(crate) fn router_config() -> RouterConfig {
    RouterConfig::from(&app_config())
}

pub(crate) fn request(path: &str) -> InterceptedRequest {
    InterceptedRequest::get(Url::parse(ORIGIN).unwrap().join(path).unwrap())
}

/// Script a 200 for every precache path.
pub(crate) fn script_precache(fetcher: &ScriptedFetcher, config: &RouterConfig) {
    for path in &config.precache {
        fetcher.respond(path, HttpResponse::new(200, format!("precached {path}")));
    }
}

pub(crate) async fn router_with(config: RouterConfig, fetcher: Arc<ScriptedFetcher>) -> CacheRouter {
    let storage = CacheDb::open_in_memory().await.unwrap();
    CacheRouter::new(config, storage, fetcher).unwrap()
}

/// Installed and active router with default config.
pub(crate) async fn active_router(fetcher: Arc<ScriptedFetcher>) -> CacheRouter {
    let config = router_config();
    script_precache(&fetcher, &config);
    let router = router_with(config, fetcher).await;
    router.install().await.unwrap();
    assert!(router.lifecycle.is_active());
    router
}
