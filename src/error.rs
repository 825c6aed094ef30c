//! Error types for card generation and delivery.

use crate::workflow::CardPhase;
use std::time::Duration;

/// Fallback detail used when the relay rejects a send without saying why.
pub(crate) const GENERIC_DELIVERY_FAILURE: &str = "Failed to send email";

/// Errors that can occur while generating or sending a card.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    /// An API key is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required input (image, recipient) is missing or empty.
    #[error("invalid input: {0}")]
    Input(String),

    /// Message generation failed after the fallback policy ran out.
    #[error("generation failed with model {model}: {detail}")]
    Generation {
        /// Model identifier of the last attempt.
        model: String,
        /// Upstream error detail.
        detail: String,
    },

    /// The relay or the email vendor rejected the send, or was unreachable.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The requested model identifier is unknown to the generation API.
    #[error("model not found: {model}: {message}")]
    ModelNotFound {
        /// Model identifier that was rejected.
        model: String,
        /// Upstream error message.
        message: String,
    },

    /// The API key was rejected upstream.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, if any.
        retry_after: Option<Duration>,
    },

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body.
        message: String,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The API answered, but not with anything usable.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A generate or send request is already in flight.
    #[error("busy: a request is already in flight ({0})")]
    Busy(CardPhase),

    /// The action is not allowed from the current phase.
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        /// The rejected action.
        action: &'static str,
        /// Phase the workflow was in.
        phase: CardPhase,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (e.g., reading the photo).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CardError {
    /// Returns true if the generation API rejected the model identifier.
    ///
    /// This is the classification the generator's fallback keys on.
    pub fn is_model_not_found(&self) -> bool {
        matches!(self, Self::ModelNotFound { .. })
    }

    /// Returns true if a request was rejected because another is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }

    /// Short sentence suitable for showing to the person using the app.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => "An API key is missing. Check your settings.".into(),
            Self::Input(detail) => format!("Something is missing: {detail}."),
            Self::Generation { .. } => {
                "We couldn't write a message for this photo. Please try again.".into()
            }
            Self::Delivery(detail) => format!("The card could not be sent: {detail}"),
            Self::Busy(_) => "Please wait for the current request to finish.".into(),
            Self::InvalidTransition { .. } => "That action isn't available right now.".into(),
            other => format!("Unexpected error: {other}"),
        }
    }
}

/// Result type alias for card operations.
pub type Result<T> = std::result::Result<T, CardError>;

/// Truncates long upstream error bodies and strips control characters.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    const MAX_LEN: usize = 500;
    let cleaned: String = text
        .trim()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if cleaned.chars().count() > MAX_LEN {
        let truncated: String = cleaned.chars().take(MAX_LEN).collect();
        format!("{truncated}...")
    } else {
        cleaned
    }
}

/// Reads a `Retry-After` header expressed in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
