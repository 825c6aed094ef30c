//! Workflow phases and the observable card state.

use crate::image::UploadedImage;
use crate::mail::DeliveryReceipt;
use serde::{Deserialize, Serialize};

/// Where a card is in its upload → generate → edit → send lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardPhase {
    /// No photo yet.
    #[default]
    Idle,
    /// A photo is selected, no message yet.
    ImageSelected,
    /// A generation request is in flight.
    Generating,
    /// A message is available and can be edited or sent.
    PreviewReady,
    /// A send request is in flight.
    Sending,
    /// The card was accepted for delivery.
    Sent,
    /// The last generation failed; generating again is allowed.
    Error,
}

impl CardPhase {
    /// Returns true while a request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Generating | Self::Sending)
    }

    /// Returns the phase as a human-readable string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ImageSelected => "image selected",
            Self::Generating => "generating",
            Self::PreviewReady => "preview ready",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for CardPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the active slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardState {
    /// Current phase.
    pub phase: CardPhase,
    /// The active photo.
    pub image: Option<UploadedImage>,
    /// The active message.
    pub message: Option<String>,
    /// Wish given for the last generation.
    pub wish: Option<String>,
    /// User-facing description of the last failure.
    pub last_error: Option<String>,
    /// Receipt of the successful send.
    pub receipt: Option<DeliveryReceipt>,
    /// Recipient of the successful send.
    pub sent_to: Option<String>,
}

impl CardState {
    /// Returns true while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    pub(crate) fn replace_slot(&mut self, phase: CardPhase, image: Option<UploadedImage>) {
        self.phase = phase;
        self.image = image;
        self.message = None;
        self.wish = None;
        self.last_error = None;
        self.receipt = None;
        self.sent_to = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_phases() {
        assert!(CardPhase::Generating.is_busy());
        assert!(CardPhase::Sending.is_busy());
        assert!(!CardPhase::PreviewReady.is_busy());
        assert!(!CardPhase::Error.is_busy());
    }

    #[test]
    fn test_phase_display_and_serde() {
        assert_eq!(CardPhase::ImageSelected.to_string(), "image selected");
        assert_eq!(
            serde_json::to_value(CardPhase::PreviewReady).unwrap(),
            serde_json::json!("preview_ready")
        );
    }

    #[test]
    fn test_replace_slot_clears_everything() {
        let mut state = CardState {
            phase: CardPhase::Sent,
            message: Some("hi".into()),
            last_error: Some("oops".into()),
            sent_to: Some("friend@example.com".into()),
            ..Default::default()
        };
        state.replace_slot(CardPhase::Idle, None);
        assert_eq!(state, CardState::default());
    }
}
