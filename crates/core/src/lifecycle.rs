//! Router lifecycle phases.
//!
//! A router moves through `Pending -> Installing -> Waiting -> Activating -> Active`.
//! Install failure ends in `Redundant`, and so does retiring an active router.
//! Transitions are guarded: each one names the phases it may start from, and
//! the check and the write happen under the same lock.
//!
//! The current phase is published on a `tokio::sync::watch` channel. Hosts
//! hold a receiver as the completion handle for a phase's asynchronous work.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::Error;

/// Lifecycle phase of a cache router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Constructed, nothing precached yet.
    Pending,
    /// Precaching the install manifest.
    Installing,
    /// Installed, waiting for activation.
    Waiting,
    /// Deleting stale stores.
    Activating,
    /// Intercepting requests.
    Active,
    /// Failed to install, or retired. Never intercepts again.
    Redundant,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Installing => "installing",
            Phase::Waiting => "waiting",
            Phase::Activating => "activating",
            Phase::Active => "active",
            Phase::Redundant => "redundant",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guarded phase holder.
#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<Phase>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Phase::Pending);
        Self { tx }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.tx.borrow()
    }

    /// Receiver that observes every subsequent transition.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }

    /// Move to `to` if the current phase is one of `from`.
    ///
    /// Returns the phase that was replaced.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` when the current phase is not in `from`.
    pub fn transition(&self, from: &[Phase], to: Phase) -> Result<Phase, Error> {
        let mut outcome = Err(Error::InvalidTransition { from: Phase::Pending, to });
        self.tx.send_if_modified(|current| {
            if from.contains(current) {
                outcome = Ok(*current);
                *current = to;
                true
            } else {
                outcome = Err(Error::InvalidTransition { from: *current, to });
                false
            }
        });

        if let Ok(previous) = outcome {
            tracing::debug!(from = %previous, to = %to, "lifecycle transition");
        }
        outcome
    }

    pub fn begin_install(&self) -> Result<(), Error> {
        self.transition(&[Phase::Pending], Phase::Installing).map(|_| ())
    }

    pub fn finish_install(&self) -> Result<(), Error> {
        self.transition(&[Phase::Installing], Phase::Waiting).map(|_| ())
    }

    pub fn fail_install(&self) -> Result<(), Error> {
        self.transition(&[Phase::Installing], Phase::Redundant).map(|_| ())
    }

    pub fn begin_activate(&self) -> Result<(), Error> {
        self.transition(&[Phase::Waiting], Phase::Activating).map(|_| ())
    }

    pub fn finish_activate(&self) -> Result<(), Error> {
        self.transition(&[Phase::Activating], Phase::Active).map(|_| ())
    }

    pub fn retire(&self) -> Result<(), Error> {
        self.transition(&[Phase::Active, Phase::Waiting], Phase::Redundant).map(|_| ())
    }

    pub fn is_active(&self) -> bool {
        self.phase() == Phase::Active
    }

    /// Wait until the lifecycle reaches `target` or becomes redundant.
    ///
    /// Returns the phase that ended the wait.
    pub async fn wait_for(&self, target: Phase) -> Phase {
        let mut rx = self.subscribe();
        match rx.wait_for(|p| *p == target || *p == Phase::Redundant).await {
            Ok(phase) => *phase,
            // The sender lives in `self`, so the channel cannot be closed here.
            Err(_) => self.phase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), Phase::Pending);

        lifecycle.begin_install().unwrap();
        lifecycle.finish_install().unwrap();
        assert_eq!(lifecycle.phase(), Phase::Waiting);

        lifecycle.begin_activate().unwrap();
        lifecycle.finish_activate().unwrap();
        assert!(lifecycle.is_active());
    }

    #[test]
    fn test_activate_before_install_rejected() {
        let lifecycle = Lifecycle::new();
        let err = lifecycle.begin_activate().unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { from: Phase::Pending, to: Phase::Activating }));
        assert_eq!(lifecycle.phase(), Phase::Pending);
    }

    #[test]
    fn test_install_twice_rejected() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin_install().unwrap();
        assert!(lifecycle.begin_install().is_err());
        assert_eq!(lifecycle.phase(), Phase::Installing);
    }

    #[test]
    fn test_failed_install_is_terminal() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin_install().unwrap();
        lifecycle.fail_install().unwrap();
        assert_eq!(lifecycle.phase(), Phase::Redundant);
        assert!(lifecycle.begin_install().is_err());
        assert!(lifecycle.begin_activate().is_err());
    }

    #[test]
    fn test_retire_waiting_version() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin_install().unwrap();
        lifecycle.finish_install().unwrap();

        lifecycle.retire().unwrap();
        assert_eq!(lifecycle.phase(), Phase::Redundant);
        assert!(lifecycle.begin_activate().is_err());
        assert!(!lifecycle.is_active());
    }

    #[test]
    fn test_retire_before_install_rejected() {
        let lifecycle = Lifecycle::new();
        let err = lifecycle.retire().unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { from: Phase::Pending, to: Phase::Redundant }));
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Phase::Waiting).unwrap(), "\"waiting\"");
    }

    #[tokio::test]
    async fn test_wait_for_active() {
        let lifecycle = std::sync::Arc::new(Lifecycle::new());
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.wait_for(Phase::Active).await })
        };

        lifecycle.begin_install().unwrap();
        lifecycle.finish_install().unwrap();
        lifecycle.begin_activate().unwrap();
        lifecycle.finish_activate().unwrap();

        assert_eq!(waiter.await.unwrap(), Phase::Active);
    }

    #[tokio::test]
    async fn test_wait_for_ends_on_redundant() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin_install().unwrap();
        lifecycle.fail_install().unwrap();
        assert_eq!(lifecycle.wait_for(Phase::Active).await, Phase::Redundant);
    }
}
