mod commands;

use clap::{Parser, Subcommand};
use commands::{CreateArgs, ProbeArgs, UploadArgs, ValidateArgs};
use courseware_media::EditorConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Course content editor tooling: validate drafts, probe and upload lecture
/// videos, create courses.
#[derive(Parser, Debug)]
#[command(name = "courseware")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a course document against the submit rules
    Validate(ValidateArgs),

    /// Detect the duration of a local video file
    Probe(ProbeArgs),

    /// Upload a video to a lecture of a stored course and save the result
    Upload(UploadArgs),

    /// Create a course from a complete draft document
    Create(CreateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "courseware_cli=info,courseware_media=info,courseware_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = EditorConfig::from_env()?;
    tracing::debug!(backend = %config.backend_base_url, "Loaded editor configuration");

    let cli = Cli::parse();
    match cli.command {
        Command::Validate(args) => commands::validate(args),
        Command::Probe(args) => commands::probe(args, &config).await,
        Command::Upload(args) => commands::upload(args, &config).await,
        Command::Create(args) => commands::create(args, &config).await,
    }
}
