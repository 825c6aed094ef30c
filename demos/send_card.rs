//! Runs the whole workflow: upload, generate, send.
//!
//! Run with: `cargo run --example send_card -- <photo.jpg> <recipient>`
//!
//! Requires `GEMINI_API_KEY` and `RESEND_API_KEY`, and a relay listening at
//! `FESTIVE_RELAY_URL` (default `http://localhost:5173/api/resend/emails`).

use festive_card::{
    CardConfig, CardWorkflow, GeminiClient, RelayTransport, SendRequest, UploadedImage,
};

#[tokio::main]
async fn main() -> festive_card::Result<()> {
    let mut args = std::env::args().skip(1);
    let (path, to) = match (args.next(), args.next()) {
        (Some(path), Some(to)) => (path, to),
        _ => {
            eprintln!("Usage: send_card <photo.jpg> <recipient>");
            std::process::exit(1);
        }
    };

    let workflow = CardWorkflow::new(
        GeminiClient::default(),
        RelayTransport::builder().build(),
        CardConfig::from_env(),
    );

    let mut changes = workflow.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            println!("-> {}", changes.borrow_and_update().phase);
        }
    });

    workflow.upload(UploadedImage::from_path(&path).await?)?;
    let message = workflow.generate(None).await?;
    println!("Message: {message}");

    let receipt = workflow.send(&SendRequest::new(to)).await?;
    println!("Sent ({:?})", receipt.id);
    Ok(())
}
