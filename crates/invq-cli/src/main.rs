//! CLI application for multi-page invoice extraction and invoice questions.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{ask, batch, chat, config, merge, process};

/// Extract structured data from multi-page invoices and ask questions about them
#[derive(Parser)]
#[command(name = "invq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single invoice document
    Process(process::ProcessArgs),

    /// Process multiple invoice documents
    Batch(batch::BatchArgs),

    /// Merge per-page records from a JSON file
    Merge(merge::MergeArgs),

    /// Ask one question about a merged invoice
    Ask(ask::AskArgs),

    /// Ask questions about a merged invoice interactively
    Chat(chat::ChatArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Merge(args) => merge::run(args, config_path).await,
        Commands::Ask(args) => ask::run(args, config_path).await,
        Commands::Chat(args) => chat::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
