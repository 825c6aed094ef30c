//! Core types for uploaded photos.

use crate::error::{CardError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Image formats recognised when a media type is not declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

/// A photo selected by the user.
///
/// The bytes are shared, so cloning an `UploadedImage` is cheap. A new
/// upload replaces the whole value; nothing mutates it in place.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedImage {
    data: Arc<[u8]>,
    media_type: String,
    file_name: Option<String>,
}

impl UploadedImage {
    /// Creates an image from raw bytes and a declared media type.
    pub fn new(data: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        let data: Vec<u8> = data.into();
        Self {
            data: Arc::from(data),
            media_type: media_type.into(),
            file_name: None,
        }
    }

    /// Creates an image from raw bytes, detecting the media type.
    ///
    /// Falls back to `image/jpeg` when the bytes are not recognised, which is
    /// what phone cameras produce in the common case.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let media_type = ImageFormat::from_magic_bytes(&data)
            .unwrap_or(ImageFormat::Jpeg)
            .mime_type();
        Self::new(data, media_type)
    }

    /// Reads a photo from disk.
    ///
    /// The media type comes from the file contents first, then the
    /// extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        if data.is_empty() {
            return Err(CardError::Input(format!(
                "image file {} is empty",
                path.display()
            )));
        }

        let format = ImageFormat::from_magic_bytes(&data).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        });
        let media_type = format.unwrap_or(ImageFormat::Jpeg).mime_type();

        let mut image = Self::new(data, media_type);
        image.file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        Ok(image)
    }

    /// Sets the original file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Declared media type (e.g. `image/jpeg`).
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Original file name, if known.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// File name to use when attaching the photo to an email.
    pub fn attachment_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => {
                let ext = ImageFormat::from_magic_bytes(&self.data)
                    .map(|f| f.extension())
                    .unwrap_or("jpg");
                format!("festive-card.{ext}")
            }
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns true when there are no bytes to send.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

impl std::fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedImage")
            .field("size", &self.data.len())
            .field("media_type", &self.media_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"GIF89a\x01\x00"),
            Some(ImageFormat::Gif)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"hello"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("heic"), None);
    }

    #[test]
    fn test_from_bytes_detects_media_type() {
        let image = UploadedImage::from_bytes(PNG_MAGIC.to_vec());
        assert_eq!(image.media_type(), "image/png");

        let unknown = UploadedImage::from_bytes(vec![1, 2, 3]);
        assert_eq!(unknown.media_type(), "image/jpeg");
    }

    #[test]
    fn test_base64() {
        let image = UploadedImage::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg");
        assert_eq!(image.to_base64(), "/9j/");
    }

    #[test]
    fn test_attachment_name() {
        let image = UploadedImage::from_bytes(PNG_MAGIC.to_vec());
        assert_eq!(image.attachment_name(), "festive-card.png");

        let named = image.with_file_name("photo.jpg");
        assert_eq!(named.attachment_name(), "photo.jpg");
    }

    #[test]
    fn test_clone_shares_bytes() {
        let image = UploadedImage::from_bytes(JPEG_MAGIC.to_vec());
        let copy = image.clone();
        assert_eq!(copy, image);
        assert!(std::ptr::eq(copy.data(), image.data()));
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let err = UploadedImage::from_path("/definitely/not/here.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, CardError::Io(_)));
    }
}
