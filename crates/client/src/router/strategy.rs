//! The three serving strategies.

use vet_sw_core::{Error, InterceptedRequest, Strategy};

use super::{CacheRouter, Routed, Source};

impl CacheRouter {
    /// Any store first; on a miss, the network, writing 200s to the static store.
    pub(super) async fn cache_first(&self, request: &InterceptedRequest) -> Result<Routed, Error> {
        let key = request.key();

        if let Some(entry) = self.storage.match_any(&key).await? {
            tracing::trace!(url = %key.url, store = %entry.store, "cache hit");
            return Ok(Routed { strategy: Strategy::CacheFirst, source: Source::Cache, response: entry.response });
        }

        let response = self.fetcher.fetch(request).await?;
        if response.is_cacheable() {
            self.spawn_store_write(&self.names.static_store, key, &response);
        }

        Ok(Routed { strategy: Strategy::CacheFirst, source: Source::Network, response })
    }

    /// Network first, writing 200s to the dynamic store; any store when the network fails.
    pub(super) async fn network_first(&self, request: &InterceptedRequest) -> Result<Routed, Error> {
        let key = request.key();

        let err = match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.spawn_store_write(&self.names.dynamic_store, key, &response);
                }
                return Ok(Routed { strategy: Strategy::NetworkFirst, source: Source::Network, response });
            }
            Err(err) => err,
        };

        match self.storage.match_any(&key).await {
            Ok(Some(entry)) => {
                tracing::info!(url = %key.url, store = %entry.store, error = %err, "network failed, serving cached copy");
                Ok(Routed { strategy: Strategy::NetworkFirst, source: Source::Cache, response: entry.response })
            }
            Ok(None) => Err(err),
            Err(lookup) => {
                tracing::warn!(url = %key.url, error = %lookup, "cache fallback lookup failed");
                Err(err)
            }
        }
    }

    /// Network only; the stores are never touched.
    pub(super) async fn network_only(&self, request: &InterceptedRequest) -> Result<Routed, Error> {
        let response = self.fetcher.fetch(request).await?;
        Ok(Routed { strategy: Strategy::NetworkOnly, source: Source::Network, response })
    }
}
