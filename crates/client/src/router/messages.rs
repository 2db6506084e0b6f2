//! Page-to-router control messages.

use tokio::sync::oneshot;

use vet_sw_core::{ControlMessage, ControlReply, Error};

use super::CacheRouter;

impl CacheRouter {
    /// Handle a control message posted by a page.
    ///
    /// `SKIP_WAITING` activates a waiting router. `GET_VERSION` answers on
    /// `reply` when one is given. Anything else is ignored.
    pub async fn on_message(
        &self, message: &serde_json::Value, reply: Option<oneshot::Sender<ControlReply>>,
    ) -> Result<(), Error> {
        let Some(message) = ControlMessage::parse(message) else {
            tracing::debug!(message = %message, "ignoring unrecognized control message");
            return Ok(());
        };

        match message {
            ControlMessage::SkipWaiting => self.skip_waiting().await,
            ControlMessage::GetVersion => {
                let Some(reply) = reply else {
                    tracing::debug!("GET_VERSION without a reply channel");
                    return Ok(());
                };
                let version = ControlReply::VersionResponse { version: self.config.version.clone() };
                if reply.send(version).is_err() {
                    tracing::debug!("GET_VERSION caller went away before the reply");
                }
                Ok(())
            }
        }
    }
}
