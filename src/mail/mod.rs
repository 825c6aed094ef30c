//! Card delivery by email.

mod dispatcher;
mod envelope;
#[cfg(feature = "relay")]
mod relay;
mod transport;

pub use dispatcher::EmailDispatcher;
pub use envelope::{
    render_card_html, Attachment, DeliveryReceipt, EmailEnvelope, SendRequest, CARD_IMAGE_CID,
    DEFAULT_SENDER, DEFAULT_SUBJECT,
};
#[cfg(feature = "relay")]
pub use relay::{RelayTransport, RelayTransportBuilder, DEFAULT_RELAY_URL};
pub use transport::{MailTransport, RelayReply};

#[cfg(test)]
pub(crate) use dispatcher::tests as testing;
