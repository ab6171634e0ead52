use anyhow::Result;
use clap::{Parser, Subcommand};
use spamscan::app::App;
use spamscan::Config;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "spamscan", version, about = "Terminal client for a spam-classification service")]
struct Cli {
    /// Configuration file name, without extension
    #[arg(long, default_value = "config/spamscan")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a text message
    Text { message: String },
    /// Upload an audio file for transcription and classification
    Audio { file: PathBuf },
    /// Analyze text live while you type
    Live,
    /// Record from the microphone and classify the recording
    Record,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            warn!("Could not load {}: {}. Using defaults.", cli.config, e);
            Config::default()
        }
    };

    let mut app = App::new(config)?;
    app.check_service().await?;

    match cli.command {
        Command::Text { message } => app.run_text(&message).await,
        Command::Audio { file } => app.run_audio(&file).await,
        Command::Live => app.run_live().await,
        Command::Record => app.run_record().await,
    }
}
