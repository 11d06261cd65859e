//! livecap CLI: periodic screen capture served over HTTP.
//!
//! Usage:
//!   livecap serve [OPTIONS]    Capture on an interval and serve the latest shot
//!   livecap snap [OPTIONS]     Take a single screenshot
//!   livecap check              Show capture support, monitors and windows
//!   livecap config [--init]    Print (or write) the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use livecap_common::config::AppConfig;

mod commands;

use commands::CaptureArgs;

#[derive(Parser)]
#[command(
    name = "livecap",
    about = "Capture the screen on an interval and serve the latest screenshot over HTTP",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture on an interval and serve the latest screenshot
    Serve {
        #[command(flatten)]
        capture: CaptureArgs,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(long)]
        port: Option<u16>,

        /// Seconds between captures
        #[arg(long)]
        interval: Option<f64>,

        /// Start capturing immediately
        #[arg(long)]
        start: bool,

        /// Use generated test frames instead of the screen
        #[arg(long)]
        synthetic: bool,
    },

    /// Take a single screenshot and print where it was stored
    Snap {
        #[command(flatten)]
        capture: CaptureArgs,

        /// Use a generated test frame instead of the screen
        #[arg(long)]
        synthetic: bool,
    },

    /// Show capture support, monitors and windows
    Check {
        /// Inspect the synthetic backend instead of the screen
        #[arg(long)]
        synthetic: bool,
    },

    /// Print the effective configuration
    Config {
        /// Write the configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut app = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if cli.verbose {
        app.logging.level = "debug".to_string();
    }
    livecap_common::logging::init_logging(&app.logging);

    match cli.command {
        Commands::Serve {
            capture,
            host,
            port,
            interval,
            start,
            synthetic,
        } => {
            let options = commands::serve::ServeOptions {
                capture,
                host,
                port,
                interval,
                start,
                synthetic,
            };
            commands::serve::run(app, options).await
        }
        Commands::Snap { capture, synthetic } => commands::snap::run(&app, &capture, synthetic),
        Commands::Check { synthetic } => commands::check::run(synthetic),
        Commands::Config { init } => commands::config::run(&app, cli.config.as_deref(), init),
    }
}
