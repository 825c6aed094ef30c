//! CLI for Festive Card - generate a greeting from a photo and email it.

use clap::{Args, Parser, Subcommand};
use festive_card::{
    CardConfig, CardWorkflow, DeliveryReceipt, EmailDispatcher, GeminiClient, MessageGenerator,
    RelayTransport, SendRequest, UploadedImage, DEFAULT_SUBJECT,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "festive-card")]
#[command(about = "Write a festive greeting for a photo with Gemini and email the card")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Relay endpoint that forwards to Resend (default: $FESTIVE_RELAY_URL)
    #[arg(long, global = true)]
    relay_url: Option<String>,

    /// Model tried first
    #[arg(long, global = true)]
    primary_model: Option<String>,

    /// Model tried once when the primary is not found
    #[arg(long, global = true)]
    fallback_model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a greeting for a photo
    Generate(GenerateArgs),

    /// Email a card with a given message
    Send(SendArgs),

    /// Generate a greeting and email the card in one go
    Card(CardArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Path to the photo
    #[arg(short, long)]
    image: PathBuf,

    /// What the message should focus on
    #[arg(short, long)]
    wish: Option<String>,
}

#[derive(Args)]
struct RecipientArgs {
    /// Recipient email address
    #[arg(long)]
    to: String,

    /// Subject line
    #[arg(long, default_value = DEFAULT_SUBJECT)]
    subject: String,

    /// Your email address, used for replies
    #[arg(long)]
    from: Option<String>,
}

#[derive(Args)]
struct SendArgs {
    /// Path to the photo
    #[arg(short, long)]
    image: PathBuf,

    #[command(flatten)]
    recipient: RecipientArgs,

    /// Message text
    #[arg(short, long, conflicts_with = "message_file")]
    message: Option<String>,

    /// Read the message text from a file
    #[arg(long)]
    message_file: Option<PathBuf>,
}

#[derive(Args)]
struct CardArgs {
    /// Path to the photo
    #[arg(short, long)]
    image: PathBuf,

    #[command(flatten)]
    recipient: RecipientArgs,

    /// What the message should focus on
    #[arg(short, long)]
    wish: Option<String>,

    /// Replace the generated message before sending
    #[arg(short, long)]
    message: Option<String>,

    /// Generate and print the card without sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("festive_card=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli);

    match cli.command {
        Commands::Generate(ref args) => {
            generate(args, &config, cli.json).await?;
        }
        Commands::Send(ref args) => {
            send(args, &config, relay(&cli), cli.json).await?;
        }
        Commands::Card(ref args) => {
            card(args, config, relay(&cli), cli.json).await?;
        }
    }

    Ok(())
}

fn build_config(cli: &Cli) -> CardConfig {
    let mut builder = CardConfig::builder();
    if let Some(ref model) = cli.primary_model {
        builder = builder.primary_model(model);
    }
    if let Some(ref model) = cli.fallback_model {
        builder = builder.fallback_model(model);
    }
    builder.build()
}

fn relay(cli: &Cli) -> RelayTransport {
    let mut builder = RelayTransport::builder();
    if let Some(ref url) = cli.relay_url {
        builder = builder.url(url);
    }
    builder.build()
}

fn validate_recipient(args: &RecipientArgs) -> anyhow::Result<()> {
    if args.to.trim().is_empty() {
        anyhow::bail!("--to must not be empty");
    }
    if args.subject.trim().is_empty() {
        anyhow::bail!("--subject must not be empty");
    }
    Ok(())
}

fn send_request(args: &RecipientArgs) -> SendRequest {
    let mut request = SendRequest::new(args.to.trim()).with_subject(&args.subject);
    if let Some(ref from) = args.from {
        request = request.with_sender_email(from);
    }
    request
}

async fn generate(
    args: &GenerateArgs,
    config: &CardConfig,
    json_output: bool,
) -> anyhow::Result<()> {
    let api_key = config.require_gemini_key()?;
    let image = UploadedImage::from_path(&args.image).await?;

    let generator = MessageGenerator::new(GeminiClient::default())
        .with_primary_model(&config.primary_model)
        .with_fallback_model(&config.fallback_model);
    let message = generator
        .generate(api_key, &image, args.wish.as_deref())
        .await?;

    if json_output {
        let result = serde_json::json!({
            "type": "message",
            "success": true,
            "image": args.image.display().to_string(),
            "message": message,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{message}");
    }

    Ok(())
}

async fn send(
    args: &SendArgs,
    config: &CardConfig,
    transport: RelayTransport,
    json_output: bool,
) -> anyhow::Result<()> {
    validate_recipient(&args.recipient)?;
    let api_key = config.require_resend_key()?;

    let message = match (&args.message, &args.message_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await?,
        (None, None) => anyhow::bail!("provide --message or --message-file"),
    };
    if message.trim().is_empty() {
        anyhow::bail!("the message is empty");
    }

    let image = UploadedImage::from_path(&args.image).await?;
    let dispatcher = EmailDispatcher::new(transport).with_sender(&config.sender);
    let request = send_request(&args.recipient);
    let receipt = dispatcher
        .send_card(api_key, &request, message.trim(), &image)
        .await?;

    report_sent(&request, &receipt, Some(message.trim()), json_output)
}

async fn card(
    args: &CardArgs,
    config: CardConfig,
    transport: RelayTransport,
    json_output: bool,
) -> anyhow::Result<()> {
    validate_recipient(&args.recipient)?;
    config.require_gemini_key()?;
    if !args.dry_run {
        config.require_resend_key()?;
    }

    let workflow = CardWorkflow::new(GeminiClient::default(), transport, config);
    workflow.upload(UploadedImage::from_path(&args.image).await?)?;

    let generated = workflow.generate(args.wish.as_deref()).await?;
    if let Some(ref edited) = args.message {
        workflow.edit(edited.clone())?;
    }
    let message = workflow.message().unwrap_or(generated);

    if args.dry_run {
        if json_output {
            let result = serde_json::json!({
                "type": "card",
                "success": true,
                "sent": false,
                "message": message,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{message}");
            println!("(dry run, not sent)");
        }
        return Ok(());
    }

    let request = send_request(&args.recipient);
    let receipt = workflow.send(&request).await?;
    report_sent(&request, &receipt, Some(&message), json_output)
}

fn report_sent(
    request: &SendRequest,
    receipt: &DeliveryReceipt,
    message: Option<&str>,
    json_output: bool,
) -> anyhow::Result<()> {
    if json_output {
        let result = serde_json::json!({
            "type": "card",
            "success": true,
            "sent": true,
            "to": request.to,
            "subject": request.subject,
            "message": message,
            "id": receipt.id,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if let Some(message) = message {
            println!("{message}\n");
        }
        println!("Sent to {}", request.to);
        if let Some(ref id) = receipt.id {
            println!("Email id: {id}");
        }
    }
    Ok(())
}
