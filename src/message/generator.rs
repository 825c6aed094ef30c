//! Greeting generation with a one-shot model fallback.

use crate::error::{CardError, Result};
use crate::image::UploadedImage;
use crate::message::prompt::build_prompt;
use crate::message::provider::{ContentRequest, MessageModel};
use std::sync::Arc;
use std::time::Instant;

/// Primary model identifier.
pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-2.5-flash";

/// Known-good model used when the primary identifier is rejected.
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// Writes card messages for photos.
///
/// The generator makes one request against the primary model. If that model
/// is reported as not found, it makes exactly one more request against the
/// fallback model with the same payload. Nothing else is retried.
pub struct MessageGenerator<M> {
    model: Arc<M>,
    primary_model: String,
    fallback_model: String,
}

impl<M> Clone for MessageGenerator<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            primary_model: self.primary_model.clone(),
            fallback_model: self.fallback_model.clone(),
        }
    }
}

impl<M: MessageModel> MessageGenerator<M> {
    /// Creates a generator using the default model identifiers.
    pub fn new(model: M) -> Self {
        Self::from_arc(Arc::new(model))
    }

    /// Creates a generator around a shared backend.
    pub fn from_arc(model: Arc<M>) -> Self {
        Self {
            model,
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
        }
    }

    /// Sets the primary model identifier.
    pub fn with_primary_model(mut self, model: impl Into<String>) -> Self {
        self.primary_model = model.into();
        self
    }

    /// Sets the fallback model identifier.
    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    /// Primary model identifier.
    pub fn primary_model(&self) -> &str {
        &self.primary_model
    }

    /// Fallback model identifier.
    pub fn fallback_model(&self) -> &str {
        &self.fallback_model
    }

    /// Generates a greeting for `image`, steered by an optional `wish`.
    ///
    /// Fails with [`CardError::Configuration`] for a blank key and
    /// [`CardError::Input`] for an empty image, before any request is made.
    pub async fn generate(
        &self,
        api_key: &str,
        image: &UploadedImage,
        wish: Option<&str>,
    ) -> Result<String> {
        if api_key.trim().is_empty() {
            return Err(CardError::Configuration(
                "a Gemini API key is required".into(),
            ));
        }
        if image.is_empty() {
            return Err(CardError::Input("an image is required".into()));
        }

        let request = ContentRequest::new(build_prompt(wish), image);
        let start = Instant::now();

        tracing::debug!(
            backend = self.model.name(),
            model = %self.primary_model,
            image_bytes = image.size(),
            mime_type = %request.mime_type,
            "generating card message"
        );

        let result = match self
            .model
            .generate_content(api_key, &self.primary_model, &request)
            .await
        {
            Ok(text) => Ok((text, self.primary_model.as_str())),
            Err(e) if e.is_model_not_found() => {
                tracing::warn!(
                    primary = %self.primary_model,
                    fallback = %self.fallback_model,
                    "primary model not found, retrying with fallback: {e}"
                );
                self.model
                    .generate_content(api_key, &self.fallback_model, &request)
                    .await
                    .map(|text| (text, self.fallback_model.as_str()))
                    .map_err(|e| generation_error(&self.fallback_model, e))
            }
            Err(e) => Err(generation_error(&self.primary_model, e)),
        };

        let (text, model) = result?;
        tracing::debug!(
            model,
            duration_ms = start.elapsed().as_millis() as u64,
            chars = text.chars().count(),
            "card message generated"
        );
        Ok(text)
    }
}

fn generation_error(model: &str, err: CardError) -> CardError {
    CardError::Generation {
        model: model.to_string(),
        detail: err.to_string(),
    }
}
