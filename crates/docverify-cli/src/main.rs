mod fetch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::fetch::{run_fetch, FetchOutcome, FetchRequest};

#[derive(Debug, Parser)]
#[command(name = "docverify-cli")]
#[command(about = "Fetch verified documents from the portal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up a document code and save the PDF.
    Fetch {
        /// Document reference code.
        #[arg(long)]
        code: String,
        /// Where to write the PDF.
        #[arg(short, long, default_value = "document.pdf")]
        output: PathBuf,
        /// Dump every request and response for troubleshooting.
        #[arg(long)]
        debug: bool,
        /// Directory for debug dumps; implies `--debug`.
        #[arg(long)]
        debug_dir: Option<PathBuf>,
    },
}

/// Exit status when the portal has no document for the code.
const EXIT_NOT_FOUND: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = docverify_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fetch {
            code,
            output,
            debug,
            debug_dir,
        } => {
            let request = FetchRequest {
                code,
                output,
                debug_dir: debug_dir_for(debug, debug_dir),
            };
            match run_fetch(&config, request).await? {
                FetchOutcome::Saved {
                    path,
                    bytes,
                    strategy,
                } => {
                    println!("Saved {bytes} bytes to {} (via {strategy})", path.display());
                    Ok(ExitCode::SUCCESS)
                }
                FetchOutcome::NotFound { message } => {
                    match message {
                        Some(msg) => eprintln!("No PDF found. Server said: {msg}"),
                        None => eprintln!("No PDF found for the provided code."),
                    }
                    Ok(ExitCode::from(EXIT_NOT_FOUND))
                }
            }
        }
    }
}

fn debug_dir_for(debug: bool, debug_dir: Option<PathBuf>) -> Option<PathBuf> {
    match (debug, debug_dir) {
        (_, Some(dir)) => Some(dir),
        (true, None) => Some(PathBuf::from("debug")),
        (false, None) => None,
    }
}
