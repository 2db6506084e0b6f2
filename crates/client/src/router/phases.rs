//! Install and activate.
//!
//! Install precaches the manifest into the static store, all or nothing.
//! Activate deletes every store that does not belong to this version, then
//! the router starts intercepting. Neither returns before its work settles.

use std::sync::atomic::Ordering;

use vet_sw_core::{Error, InterceptedRequest, Phase};

use super::CacheRouter;
use crate::fetch::resolve;

impl CacheRouter {
    /// Precache the manifest and move to `Waiting`.
    ///
    /// Activates straight away when skip-waiting is configured or was
    /// requested while installing.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any manifest entry cannot be fetched
    /// or answers outside 2xx; the router is then `Redundant`.
    pub async fn install(&self) -> Result<(), Error> {
        self.lifecycle.begin_install()?;
        tracing::info!(version = %self.config.version, "installing");

        match self.precache().await {
            Ok(count) => {
                self.lifecycle.finish_install()?;
                tracing::info!(version = %self.config.version, entries = count, "installed");
            }
            Err(err) => {
                self.lifecycle.fail_install()?;
                let err = match err {
                    Error::InstallFailed(_) => err,
                    other => Error::InstallFailed(other.to_string()),
                };
                tracing::error!(version = %self.config.version, error = %err, "install failed");
                return Err(err);
            }
        }

        if self.config.skip_waiting_on_install || self.skip_waiting.load(Ordering::SeqCst) {
            self.activate_if_waiting().await?;
        }

        Ok(())
    }

    async fn precache(&self) -> Result<usize, Error> {
        let store = &self.names.static_store;
        self.storage.open_store(store).await?;

        let mut entries = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            let url = resolve(&self.config.origin, path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            let request = InterceptedRequest::get(url);
            let response = self.fetcher.fetch(&request).await?;
            if !response.is_ok() {
                return Err(Error::InstallFailed(format!("{} answered {}", request.url, response.status)));
            }
            entries.push((request.key(), response));
        }

        let count = entries.len();
        self.storage.put_all(store, entries).await?;
        Ok(count)
    }

    /// Delete stale stores and start intercepting.
    ///
    /// A failure while deleting is logged; activation still completes.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` unless the router is `Waiting`.
    pub async fn activate(&self) -> Result<(), Error> {
        self.lifecycle.begin_activate()?;
        tracing::info!(version = %self.config.version, "activating");

        match self.delete_stale_stores().await {
            Ok(deleted) if !deleted.is_empty() => {
                tracing::info!(deleted = ?deleted, "removed stale cache stores");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "failed to remove stale cache stores"),
        }

        self.lifecycle.finish_activate()?;
        tracing::info!(version = %self.config.version, "active, claiming clients");
        Ok(())
    }

    async fn delete_stale_stores(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.storage.store_names().await? {
            if self.names.is_current(&name) {
                continue;
            }
            self.storage.delete_store(&name).await?;
            tracing::debug!(store = %name, "deleted stale cache store");
            deleted.push(name);
        }
        Ok(deleted)
    }

    /// Activate now if installed, or as soon as install finishes.
    pub async fn skip_waiting(&self) -> Result<(), Error> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        if self.lifecycle.phase() == Phase::Waiting {
            self.activate_if_waiting().await?;
        }
        Ok(())
    }

    /// Stop intercepting. The version's stores are left for the next one to clean up.
    pub fn retire(&self) -> Result<(), Error> {
        self.lifecycle.retire()?;
        tracing::info!(version = %self.config.version, "retired");
        Ok(())
    }

    async fn activate_if_waiting(&self) -> Result<(), Error> {
        match self.activate().await {
            // Another caller won the race to activate.
            Err(Error::InvalidTransition { from, .. }) if from != Phase::Waiting => Ok(()),
            other => other,
        }
    }
}
