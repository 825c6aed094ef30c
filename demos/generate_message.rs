//! Generates a greeting for a photo.
//!
//! Run with: `cargo run --example generate_message -- <photo.jpg> [wish]`
//!
//! Requires `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) environment variable.

use festive_card::{CardConfig, GeminiClient, MessageGenerator, UploadedImage};

#[tokio::main]
async fn main() -> festive_card::Result<()> {
    let path = std::env::args()
        .nth(1)
        .expect("Usage: generate_message <photo.jpg> [wish]");
    let wish = std::env::args().nth(2);

    let config = CardConfig::from_env();
    let image = UploadedImage::from_path(&path).await?;

    let generator = MessageGenerator::new(GeminiClient::default());
    let message = generator
        .generate(config.require_gemini_key()?, &image, wish.as_deref())
        .await?;

    println!("{message}");
    Ok(())
}
