//! Outbound email envelope and card rendering.

use crate::image::UploadedImage;
use serde::{Deserialize, Serialize};

/// Verified sender identity every card is sent from.
pub const DEFAULT_SENDER: &str = "Festive Card <noreply@qinque717.top>";

/// Subject line offered before the user edits it.
pub const DEFAULT_SUBJECT: &str = "A Festive Wish For You! 🎄";

/// Content id the card HTML uses to reference the inline photo.
pub const CARD_IMAGE_CID: &str = "festive-card-photo";

/// A file attached to the email.
///
/// Serialized in the shape the Resend API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Base64-encoded file contents.
    pub content: String,
    /// MIME type of the contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Content id for inline references (`cid:` URLs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

impl Attachment {
    /// Creates an attachment from base64 contents.
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_type: None,
            content_id: None,
        }
    }

    /// Attaches the photo inline under [`CARD_IMAGE_CID`].
    pub fn inline_image(image: &UploadedImage) -> Self {
        Self {
            filename: image.attachment_name(),
            content: image.to_base64(),
            content_type: Some(image.media_type().to_string()),
            content_id: Some(CARD_IMAGE_CID.to_string()),
        }
    }
}

/// The JSON body posted to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailEnvelope {
    /// Sender identity.
    pub from: String,
    /// Recipients. Cards always go to exactly one address.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Rendered HTML body.
    pub html: String,
    /// Attached files.
    pub attachments: Vec<Attachment>,
    /// Where replies go, when the sender left an address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// What the relay returned for a successful send.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    /// Vendor message id, when the response carried one.
    pub id: Option<String>,
    /// The response body as returned by the relay.
    pub response: serde_json::Value,
}

impl DeliveryReceipt {
    /// Builds a receipt from a success response body.
    ///
    /// Bodies that are not JSON are kept as a string value.
    pub fn from_body(body: &str) -> Self {
        let response = serde_json::from_str::<serde_json::Value>(body)
            .unwrap_or_else(|_| serde_json::Value::String(body.to_string()));
        let id = response
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self { id, response }
    }
}

/// Recipient details the user fills in before sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Optional address of the person sending the card, used as reply-to.
    pub sender_email: Option<String>,
}

impl SendRequest {
    /// Creates a request with the default subject.
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: DEFAULT_SUBJECT.to_string(),
            sender_email: None,
        }
    }

    /// Sets the subject line.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the reply-to address.
    pub fn with_sender_email(mut self, email: impl Into<String>) -> Self {
        self.sender_email = Some(email.into());
        self
    }
}

/// Renders the card body: the photo above the message.
///
/// The message is HTML-escaped and its line breaks kept. The photo is
/// referenced by `image_src`, usually `cid:` + [`CARD_IMAGE_CID`].
pub fn render_card_html(message: &str, image_src: &str) -> String {
    let paragraphs: Vec<String> = message
        .lines()
        .map(|line| html_escape::encode_text(line).into_owned())
        .collect();
    let body = paragraphs.join("<br>");
    let src = html_escape::encode_double_quoted_attribute(image_src);

    format!(
        r#"<!DOCTYPE html>
<html>
<body style="margin:0;padding:24px;background:#0f0f1e;font-family:Georgia,serif;">
  <div style="max-width:600px;margin:0 auto;background:#1a1a2e;border-radius:16px;overflow:hidden;">
    <img src="{src}" alt="Festive card photo" style="display:block;width:100%;height:auto;">
    <div style="padding:24px;">
      <p style="color:#ffffff;font-size:18px;line-height:1.6;font-style:italic;margin:0;">&ldquo;{body}&rdquo;</p>
    </div>
  </div>
</body>
</html>"#
    )
}
