//! Fake upstream and prepared states for handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;
use vet_sw_client::{CacheRouter, Fetcher, RouterConfig};
use vet_sw_core::config::AppConfig;
use vet_sw_core::{CacheDb, Error, HttpResponse, InterceptedRequest};

use crate::handler::AppState;

enum Outcome {
    Respond(HttpResponse),
    Fail,
    TimeOut,
}

/// Upstream answering from a per-target script and recording what it saw.
#[derive(Default)]
pub(crate) struct FakeUpstream {
    routes: Mutex<HashMap<String, Outcome>>,
    seen: Mutex<Vec<InterceptedRequest>>,
}

impl FakeUpstream {
    pub(crate) fn new() -> Arc<Self> {
        let upstream = Self::default();
        for path in AppConfig::default().precache {
            let mut response = HttpResponse::new(200, format!("asset {path}"));
            if path.ends_with(".png") {
                response = response.with_header("content-type", "image/png");
            }
            upstream.respond(&path, response);
        }
        Arc::new(upstream)
    }

    pub(crate) fn respond(&self, target: &str, response: HttpResponse) {
        self.routes.lock().unwrap().insert(target.to_string(), Outcome::Respond(response));
    }

    pub(crate) fn fail(&self, target: &str) {
        self.routes.lock().unwrap().insert(target.to_string(), Outcome::Fail);
    }

    pub(crate) fn time_out(&self, target: &str) {
        self.routes.lock().unwrap().insert(target.to_string(), Outcome::TimeOut);
    }

    pub(crate) fn seen(&self) -> Vec<InterceptedRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn reset(&self) {
        self.seen.lock().unwrap().clear();
    }
}

#[async_trait]
impl Fetcher for FakeUpstream {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<HttpResponse, Error> {
        self.seen.lock().unwrap().push(request.clone());

        let target = match request.url.query() {
            Some(q) => format!("{}?{}", request.url.path(), q),
            None => request.url.path().to_string(),
        };

        match self.routes.lock().unwrap().get(&target) {
            Some(Outcome::Respond(response)) => Ok(response.clone()),
            Some(Outcome::TimeOut) => Err(Error::FetchTimeout(format!("{target} timed out"))),
            Some(Outcome::Fail) | None => Err(Error::Network(format!("connection refused: {target}"))),
        }
    }
}

fn app_config() -> AppConfig {
    AppConfig { origin: Url::parse("https://vet.example/").unwrap(), ..Default::default() }
}

async fn build_state(upstream: Arc<FakeUpstream>, skip_waiting_on_install: bool) -> AppState {
    let config = AppConfig { skip_waiting_on_install, ..app_config() };
    let storage = CacheDb::open_in_memory().await.unwrap();
    let router = CacheRouter::new(RouterConfig::from(&config), storage, upstream.clone()).unwrap();
    AppState::new(Arc::new(router), upstream, &config)
}

/// Router not yet installed.
pub(crate) async fn state_with(upstream: Arc<FakeUpstream>) -> AppState {
    build_state(upstream, true).await
}

/// Router installed and waiting for skip-waiting.
pub(crate) async fn waiting_state(upstream: Arc<FakeUpstream>) -> AppState {
    let state = build_state(upstream, false).await;
    state.router.install().await.unwrap();
    state
}

/// Router installed and active.
pub(crate) async fn active_state(upstream: Arc<FakeUpstream>) -> AppState {
    let state = build_state(upstream, true).await;
    state.router.install().await.unwrap();
    state
}
