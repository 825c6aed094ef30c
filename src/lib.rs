#![warn(missing_docs)]
//! Festive Card - turn a photo into a greeting card and email it.
//!
//! A photo goes to Gemini, which writes a short holiday greeting for it.
//! The greeting can be edited, then the card (photo plus message) is emailed
//! through a relay that forwards to Resend.
//!
//! # Quick Start
//!
//! ```no_run
//! use festive_card::{
//!     CardConfig, CardWorkflow, GeminiClient, RelayTransport, SendRequest, UploadedImage,
//! };
//!
//! #[tokio::main]
//! async fn main() -> festive_card::Result<()> {
//!     let workflow = CardWorkflow::new(
//!         GeminiClient::default(),
//!         RelayTransport::builder().build(),
//!         CardConfig::from_env(),
//!     );
//!
//!     workflow.upload(UploadedImage::from_path("photo.jpg").await?)?;
//!     let message = workflow.generate(Some("mention the snowman")).await?;
//!     println!("{message}");
//!
//!     workflow.send(&SendRequest::new("friend@example.com")).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Pieces
//!
//! - [`MessageGenerator`]: prompt + photo to text, with a one-shot fallback
//!   to a second model when the first is not found.
//! - [`EmailDispatcher`]: builds the envelope and posts it through a
//!   [`MailTransport`].
//! - [`CardWorkflow`]: the upload → generate → edit → send state machine.
//!
//! Vendor access goes through two narrow traits, [`MessageModel`] and
//! [`MailTransport`], so either side can be replaced by a test double.
//!
//! # Features
//!
//! - `gemini` (default): [`GeminiClient`]
//! - `relay` (default): [`RelayTransport`]
//! - `cli`: the `festive-card` command-line tool

pub mod config;
mod error;
pub mod image;
pub mod mail;
pub mod message;
pub mod workflow;

#[cfg(test)]
mod stub_server;

// Re-export error types at crate root
pub use error::{CardError, Result};

pub use config::{CardConfig, CardConfigBuilder};
pub use image::{ImageFormat, UploadedImage};
pub use mail::{
    Attachment, DeliveryReceipt, EmailDispatcher, EmailEnvelope, MailTransport, RelayReply,
    SendRequest, DEFAULT_SENDER, DEFAULT_SUBJECT,
};
pub use message::{ContentRequest, MessageGenerator, MessageModel, DEFAULT_WISH};
pub use workflow::{CardPhase, CardState, CardWorkflow};

#[cfg(feature = "gemini")]
pub use message::providers::{GeminiClient, GeminiClientBuilder};

#[cfg(feature = "relay")]
pub use mail::{RelayTransport, RelayTransportBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CardError, Result};
    pub use crate::{
        CardConfig, CardPhase, CardWorkflow, MailTransport, MessageModel, SendRequest,
        UploadedImage,
    };

    #[cfg(feature = "gemini")]
    pub use crate::GeminiClient;

    #[cfg(feature = "relay")]
    pub use crate::RelayTransport;
}
