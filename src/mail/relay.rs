//! HTTP transport through the same-origin relay.

use crate::error::Result;
use crate::mail::envelope::EmailEnvelope;
use crate::mail::transport::{MailTransport, RelayReply};
use async_trait::async_trait;

/// Relay path served next to the web app.
pub const DEFAULT_RELAY_URL: &str = "http://localhost:5173/api/resend/emails";

/// Builder for [`RelayTransport`].
#[derive(Debug, Clone, Default)]
pub struct RelayTransportBuilder {
    url: Option<String>,
    client: Option<reqwest::Client>,
}

impl RelayTransportBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relay URL. Falls back to `FESTIVE_RELAY_URL`, then
    /// [`DEFAULT_RELAY_URL`].
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Uses an existing HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the transport.
    pub fn build(self) -> RelayTransport {
        let url = self
            .url
            .or_else(|| std::env::var("FESTIVE_RELAY_URL").ok())
            .unwrap_or_else(|| DEFAULT_RELAY_URL.to_string());

        RelayTransport {
            client: self.client.unwrap_or_default(),
            url,
        }
    }
}

/// Posts envelopes to the relay, which forwards them to Resend unchanged.
#[derive(Debug, Clone)]
pub struct RelayTransport {
    client: reqwest::Client,
    url: String,
}

impl RelayTransport {
    /// Creates a new `RelayTransportBuilder`.
    pub fn builder() -> RelayTransportBuilder {
        RelayTransportBuilder::new()
    }

    /// The URL envelopes are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MailTransport for RelayTransport {
    async fn post(&self, api_key: &str, envelope: &EmailEnvelope) -> Result<RelayReply> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(envelope)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(url = %self.url, status, "relay responded");
        Ok(RelayReply { status, body })
    }

    fn name(&self) -> &str {
        "Resend relay"
    }
}
