//! Message model trait and the request it consumes.

use crate::error::Result;
use crate::image::UploadedImage;
use async_trait::async_trait;

/// A multimodal prompt: instruction text plus one inline image.
///
/// The image is base64-encoded once when the request is built, so a retry
/// against another model sends exactly the same payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    /// Instruction text sent to the model.
    pub prompt: String,
    /// Declared media type of the image.
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub image_base64: String,
}

impl ContentRequest {
    /// Builds a request from a prompt and an uploaded image.
    pub fn new(prompt: impl Into<String>, image: &UploadedImage) -> Self {
        Self {
            prompt: prompt.into(),
            mime_type: image.media_type().to_string(),
            image_base64: image.to_base64(),
        }
    }
}

/// Trait for text generation backends that can look at a photo.
///
/// Implementations classify an unknown model identifier as
/// [`CardError::ModelNotFound`](crate::CardError::ModelNotFound); the
/// generator relies on that to decide whether to fall back.
#[async_trait]
pub trait MessageModel: Send + Sync {
    /// Asks `model` for text answering `request`.
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &ContentRequest,
    ) -> Result<String>;

    /// Returns the name of this backend for display.
    fn name(&self) -> &str;
}
