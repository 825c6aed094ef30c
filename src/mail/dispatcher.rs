//! Builds envelopes and hands them to the transport.

use crate::error::{sanitize_error_message, CardError, Result, GENERIC_DELIVERY_FAILURE};
use crate::image::UploadedImage;
use crate::mail::envelope::{
    render_card_html, Attachment, DeliveryReceipt, EmailEnvelope, SendRequest, CARD_IMAGE_CID,
    DEFAULT_SENDER,
};
use crate::mail::transport::{MailTransport, RelayReply};
use serde::Deserialize;
use std::sync::Arc;

/// Sends cards by email. One attempt per call, no retries.
pub struct EmailDispatcher<T> {
    transport: Arc<T>,
    sender: String,
}

impl<T> Clone for EmailDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            sender: self.sender.clone(),
        }
    }
}

impl<T: MailTransport> EmailDispatcher<T> {
    /// Creates a dispatcher sending from [`DEFAULT_SENDER`].
    pub fn new(transport: T) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Creates a dispatcher around a shared transport.
    pub fn from_arc(transport: Arc<T>) -> Self {
        Self {
            transport,
            sender: DEFAULT_SENDER.to_string(),
        }
    }

    /// Sets the verified sender identity.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// The sender identity used in every envelope.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Builds the envelope for one recipient.
    ///
    /// `reply_to` is only set when `sender_email` holds a non-blank address.
    pub fn build_envelope(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
        attachments: Vec<Attachment>,
        sender_email: Option<&str>,
    ) -> EmailEnvelope {
        EmailEnvelope {
            from: self.sender.clone(),
            to: vec![to_email.trim().to_string()],
            subject: subject.to_string(),
            html: html_body.to_string(),
            attachments,
            reply_to: sender_email
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// Sends an email through the relay.
    ///
    /// Fails with [`CardError::Configuration`] for a blank key and
    /// [`CardError::Input`] for a blank recipient without contacting the
    /// relay. Everything that goes wrong afterwards is a
    /// [`CardError::Delivery`].
    pub async fn send(
        &self,
        api_key: &str,
        to_email: &str,
        subject: &str,
        html_body: &str,
        attachments: Vec<Attachment>,
        sender_email: Option<&str>,
    ) -> Result<DeliveryReceipt> {
        if api_key.trim().is_empty() {
            return Err(CardError::Configuration(
                "a Resend API key is required".into(),
            ));
        }
        if to_email.trim().is_empty() {
            return Err(CardError::Input("a recipient email is required".into()));
        }

        let envelope =
            self.build_envelope(to_email, subject, html_body, attachments, sender_email);

        tracing::debug!(
            transport = self.transport.name(),
            to = %envelope.to[0],
            attachments = envelope.attachments.len(),
            reply_to = envelope.reply_to.is_some(),
            "sending card email"
        );

        let reply = self
            .transport
            .post(api_key, &envelope)
            .await
            .map_err(|e| CardError::Delivery(format!("relay unreachable: {e}")))?;

        let receipt = interpret_reply(reply)?;
        tracing::info!(to = %envelope.to[0], id = ?receipt.id, "card email accepted");
        Ok(receipt)
    }

    /// Renders `message` and `image` into a card and sends it.
    pub async fn send_card(
        &self,
        api_key: &str,
        request: &SendRequest,
        message: &str,
        image: &UploadedImage,
    ) -> Result<DeliveryReceipt> {
        let html = render_card_html(message, &format!("cid:{CARD_IMAGE_CID}"));
        let attachments = vec![Attachment::inline_image(image)];
        self.send(
            api_key,
            &request.to,
            &request.subject,
            &html,
            attachments,
            request.sender_email.as_deref(),
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Turns a relay reply into a receipt, or a delivery error carrying the
/// body's `message` field.
fn interpret_reply(reply: RelayReply) -> Result<DeliveryReceipt> {
    if reply.is_success() {
        return Ok(DeliveryReceipt::from_body(&reply.body));
    }

    let detail = serde_json::from_str::<ErrorBody>(&reply.body)
        .ok()
        .and_then(|b| b.message)
        .map(|m| sanitize_error_message(&m))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_DELIVERY_FAILURE.to_string());

    tracing::debug!(status = reply.status, %detail, "relay rejected card email");
    Err(CardError::Delivery(detail))
}
