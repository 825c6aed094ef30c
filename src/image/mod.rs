//! Uploaded photo handling.

mod types;

pub use types::{ImageFormat, UploadedImage};
