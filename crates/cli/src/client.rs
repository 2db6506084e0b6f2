//! HTTP client for the proxy's control endpoints.

use anyhow::{Context, Result, bail};
use reqwest::{Client, StatusCode};
use url::Url;
use vet_sw_core::{ControlMessage, ControlReply};

pub struct ControlClient {
    http: Client,
    base: Url,
}

impl ControlClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let base = Url::parse(endpoint)
            .and_then(|u| u.join("/"))
            .with_context(|| format!("invalid endpoint {endpoint}"))?;
        let http = Client::builder()
            .user_agent(concat!("vet-sw-ctl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base })
    }

    /// Post one control message; `None` when the router sent no reply.
    async fn send(&self, message: &ControlMessage) -> Result<Option<ControlReply>> {
        let url = self.base.join("__sw/message")?;
        let response = self
            .http
            .post(url)
            .json(message)
            .send()
            .await
            .context("failed to reach vet-sw")?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await.context("malformed reply")?)),
            status => bail!("vet-sw answered {status}: {}", response.text().await.unwrap_or_default()),
        }
    }

    /// Cache version of the running router.
    pub async fn version(&self) -> Result<String> {
        match self.send(&ControlMessage::GetVersion).await? {
            Some(ControlReply::VersionResponse { version }) => Ok(version),
            None => bail!("vet-sw did not answer GET_VERSION"),
        }
    }

    pub async fn skip_waiting(&self) -> Result<()> {
        self.send(&ControlMessage::SkipWaiting).await?;
        Ok(())
    }

    pub async fn status(&self) -> Result<serde_json::Value> {
        let url = self.base.join("__sw/status")?;
        let response = self.http.get(url).send().await.context("failed to reach vet-sw")?;
        let status = response.status();
        if !status.is_success() {
            bail!("vet-sw answered {status}: {}", response.text().await.unwrap_or_default());
        }
        response.json().await.context("malformed status")
    }
}

/// Line describing `current` relative to the version the caller last saw.
pub fn describe_update(known: &str, current: &str) -> String {
    if known == current {
        format!("{current} (up to date)")
    } else {
        format!("{current} (update available, was {known})")
    }
}
