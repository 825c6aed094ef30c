//! The card workflow: one photo, one message, one request at a time.

use crate::config::CardConfig;
use crate::error::{CardError, Result};
use crate::image::UploadedImage;
use crate::mail::{DeliveryReceipt, EmailDispatcher, MailTransport, SendRequest};
use crate::message::{MessageGenerator, MessageModel};
use crate::workflow::state::{CardPhase, CardState};
use std::sync::Arc;
use tokio::sync::watch;

/// Drives a single card from upload to delivery.
///
/// All state lives in one [`watch`] cell. Every transition is a single
/// guarded mutation of that cell and no lock is held across an await, so
/// observers never see a half-applied change. While a generate or send is
/// in flight, further `upload`/`generate`/`edit`/`send` calls are rejected
/// with [`CardError::Busy`], and so is `reset`: a request that has gone
/// out always lands in the slot it was started from.
pub struct CardWorkflow<M, T> {
    generator: MessageGenerator<M>,
    dispatcher: EmailDispatcher<T>,
    config: CardConfig,
    state: watch::Sender<CardState>,
}

impl<M: MessageModel, T: MailTransport> CardWorkflow<M, T> {
    /// Creates a workflow from a message backend, a mail transport and
    /// resolved configuration.
    pub fn new(model: M, transport: T, config: CardConfig) -> Self {
        Self::from_shared(Arc::new(model), Arc::new(transport), config)
    }

    /// Like [`CardWorkflow::new`], with backends shared with the caller.
    pub fn from_shared(model: Arc<M>, transport: Arc<T>, config: CardConfig) -> Self {
        let generator = MessageGenerator::from_arc(model)
            .with_primary_model(config.primary_model.clone())
            .with_fallback_model(config.fallback_model.clone());
        let dispatcher =
            EmailDispatcher::from_arc(transport).with_sender(config.sender.clone());
        let (state, _) = watch::channel(CardState::default());

        Self {
            generator,
            dispatcher,
            config,
            state,
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> CardState {
        self.state.borrow().clone()
    }

    /// Current phase.
    pub fn phase(&self) -> CardPhase {
        self.state.borrow().phase
    }

    /// The active message, if any.
    pub fn message(&self) -> Option<String> {
        self.state.borrow().message.clone()
    }

    /// The active photo, if any.
    pub fn image(&self) -> Option<UploadedImage> {
        self.state.borrow().image.clone()
    }

    /// Returns true while a generation request is in flight.
    pub fn is_generating(&self) -> bool {
        self.phase() == CardPhase::Generating
    }

    /// Returns true while a send request is in flight.
    pub fn is_sending(&self) -> bool {
        self.phase() == CardPhase::Sending
    }

    /// Returns true once the card was accepted for delivery.
    pub fn is_sent(&self) -> bool {
        self.phase() == CardPhase::Sent
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<CardState> {
        self.state.subscribe()
    }

    /// Selects a photo, replacing any previous photo and message.
    ///
    /// Only `image/*` media types are accepted.
    pub fn upload(&self, image: UploadedImage) -> Result<()> {
        if image.is_empty() {
            return Err(CardError::Input("the selected image is empty".into()));
        }
        if !image.media_type().starts_with("image/") {
            return Err(CardError::Input(format!(
                "{} is not an image",
                image.media_type()
            )));
        }
        self.transition(|state| {
            if state.is_busy() {
                return Err(CardError::Busy(state.phase));
            }
            state.replace_slot(CardPhase::ImageSelected, Some(image));
            Ok(())
        })?;
        tracing::debug!("image selected");
        Ok(())
    }

    /// Generates a message for the active photo.
    ///
    /// Allowed from `ImageSelected`, `PreviewReady` (regenerate) and `Error`
    /// (retry). On success the message is replaced in one step and the
    /// phase becomes `PreviewReady`; on failure the phase becomes `Error`
    /// and any previous message is kept.
    pub async fn generate(&self, wish: Option<&str>) -> Result<String> {
        let image = self.transition(|state| match state.phase {
            CardPhase::Generating | CardPhase::Sending => Err(CardError::Busy(state.phase)),
            CardPhase::ImageSelected | CardPhase::PreviewReady | CardPhase::Error => {
                let image = state
                    .image
                    .clone()
                    .ok_or_else(|| CardError::Input("an image is required".into()))?;
                state.phase = CardPhase::Generating;
                state.wish = wish.map(str::to_string);
                state.last_error = None;
                Ok(image)
            }
            CardPhase::Idle => Err(CardError::Input(
                "upload an image before generating a message".into(),
            )),
            CardPhase::Sent => Err(CardError::InvalidTransition {
                action: "generate",
                phase: state.phase,
            }),
        })?;

        let api_key = self.config.gemini_api_key.as_deref().unwrap_or_default();
        let result = self.generator.generate(api_key, &image, wish).await;

        // Nothing else may touch the slot while Generating.
        self.state.send_modify(|state| match &result {
            Ok(text) => {
                state.message = Some(text.clone());
                state.phase = CardPhase::PreviewReady;
            }
            Err(e) => {
                state.last_error = Some(e.user_message());
                state.phase = CardPhase::Error;
            }
        });

        match &result {
            Ok(_) => tracing::debug!("card message ready"),
            Err(e) => tracing::warn!(error = %e, "card generation failed"),
        }
        result
    }

    /// Generates a fresh message for the same photo and wish.
    pub async fn regenerate(&self) -> Result<String> {
        let wish = self.state.borrow().wish.clone();
        self.generate(wish.as_deref()).await
    }

    /// Leaves the `Error` phase: back to the preview when a message
    /// survived, otherwise back to `ImageSelected`.
    pub fn dismiss_error(&self) -> Result<CardPhase> {
        self.transition(|state| {
            if state.phase != CardPhase::Error {
                return Err(CardError::InvalidTransition {
                    action: "dismiss an error",
                    phase: state.phase,
                });
            }
            state.phase = if state.message.is_some() {
                CardPhase::PreviewReady
            } else {
                CardPhase::ImageSelected
            };
            state.last_error = None;
            Ok(state.phase)
        })
    }

    /// Replaces the message with the user's edit.
    pub fn edit(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.transition(|state| match state.phase {
            CardPhase::PreviewReady => {
                state.message = Some(text);
                Ok(())
            }
            phase if phase.is_busy() => Err(CardError::Busy(phase)),
            phase => Err(CardError::InvalidTransition {
                action: "edit the message",
                phase,
            }),
        })
    }

    /// Emails the card.
    ///
    /// On success the phase becomes `Sent`. On failure it returns to
    /// `PreviewReady` with the photo and message untouched, and the error
    /// is returned to the caller.
    pub async fn send(&self, request: &SendRequest) -> Result<DeliveryReceipt> {
        let (image, message) = self.transition(|state| match state.phase {
            CardPhase::PreviewReady => {
                let image = state
                    .image
                    .clone()
                    .ok_or_else(|| CardError::Input("an image is required".into()))?;
                let message = state
                    .message
                    .clone()
                    .ok_or_else(|| CardError::Input("a message is required".into()))?;
                state.phase = CardPhase::Sending;
                state.last_error = None;
                Ok((image, message))
            }
            phase if phase.is_busy() => Err(CardError::Busy(phase)),
            phase => Err(CardError::InvalidTransition {
                action: "send",
                phase,
            }),
        })?;

        let api_key = self.config.resend_api_key.as_deref().unwrap_or_default();
        let result = self
            .dispatcher
            .send_card(api_key, request, &message, &image)
            .await;

        self.state.send_modify(|state| match &result {
            Ok(receipt) => {
                state.phase = CardPhase::Sent;
                state.receipt = Some(receipt.clone());
                state.sent_to = Some(request.to.trim().to_string());
            }
            Err(e) => {
                state.phase = CardPhase::PreviewReady;
                state.last_error = Some(e.user_message());
            }
        });

        match &result {
            Ok(_) => tracing::info!(to = %request.to, "card sent"),
            Err(e) => tracing::warn!(error = %e, to = %request.to, "card send failed"),
        }
        result
    }

    /// Discards the photo and message and returns to `Idle`.
    ///
    /// Rejected with [`CardError::Busy`] while a request is in flight; a
    /// card that is being emailed cannot be taken back.
    pub fn reset(&self) -> Result<()> {
        self.transition(|state| {
            if state.is_busy() {
                return Err(CardError::Busy(state.phase));
            }
            state.replace_slot(CardPhase::Idle, None);
            Ok(())
        })?;
        tracing::debug!("card reset");
        Ok(())
    }

    /// Applies `f` to the state. The change is published only when `f`
    /// succeeds, so `f` must not mutate before it can fail.
    fn transition<R>(&self, f: impl FnOnce(&mut CardState) -> Result<R>) -> Result<R> {
        let mut outcome = Err(CardError::Busy(self.phase()));
        self.state.send_if_modified(|state| {
            outcome = f(state);
            outcome.is_ok()
        });
        outcome
    }
}
