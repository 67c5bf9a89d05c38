use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use ask_chat::cli::chat::ChatContext;
use ask_chat::config::{Config, ConfigOverrides};
use ask_chat::markdown::RawHtml;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    chat: ChatArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat(ChatArgs),
}

#[derive(Args)]
struct ChatArgs {
    /// Send a single query, print the answer and exit
    #[arg(short, long)]
    input: Option<String>,

    /// URL of the /ask endpoint
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Seconds to wait for an answer before giving up
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Show HTML embedded in answers as text instead of rendering it
    #[arg(long)]
    escape_html: bool,

    /// Write the conversation as HTML to this file on exit
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Read settings from this JSON file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl ChatArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            request_timeout_secs: self.timeout,
            raw_html: self.escape_html.then_some(RawHtml::Escape),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    // Default to chat if no subcommand is provided
    let args = match cli.command {
        Some(Commands::Chat(args)) => args,
        None => cli.chat,
    };

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };

    // Logs go to stderr so they stay out of the conversation on stdout
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Ask Chat");

    let config = Config::load(args.config.as_deref(), args.overrides())?;

    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        Box::new(io::stdout()),
        &config,
        args.input,
        true,
        args.transcript,
    )?;
    chat_context.run().await
}
