//! Mail transport trait.

use crate::error::Result;
use crate::mail::envelope::EmailEnvelope;
use async_trait::async_trait;

/// Raw answer from the relay, before the dispatcher interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl RelayReply {
    /// Creates a reply.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for the channel that carries an envelope to the email vendor.
///
/// Implementations return `Err` only when no reply was received at all;
/// any HTTP reply, success or not, comes back as a [`RelayReply`].
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Posts `envelope`, authorized with `api_key`.
    async fn post(&self, api_key: &str, envelope: &EmailEnvelope) -> Result<RelayReply>;

    /// Returns the name of this transport for display.
    fn name(&self) -> &str;
}
