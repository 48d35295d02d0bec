//! plant demo server.
//!
//! Resolves the configuration of an application directory, builds the demo
//! application and either serves it or runs one of its jobs.
//!
//! ```text
//! plant --appdir ./myapp --port 7001          serve HTTP
//! plant --appdir ./myapp job greet            run the "greet" job and exit
//! ```

mod demo;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use plant::app::AppError;
use plant::config;
use plant::lifecycle::{self, Shutdown};
use plant::observability::logging;

#[derive(Parser)]
#[command(name = "plant")]
#[command(about = "Minimal HTTP application framework (demo application)", long_about = None)]
struct Cli {
    /// Application directory containing config/
    #[arg(long, default_value = ".")]
    appdir: PathBuf,

    /// Override server.hostname
    #[arg(long)]
    hostname: Option<String>,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve HTTP requests (default)
    Serve,
    /// Run a named job, then exit
    Job { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = config::resolve(&cli.appdir)?;
    if let Some(hostname) = cli.hostname {
        config.server.hostname = hostname;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init(&config.logging)?;

    tracing::info!(
        app_dir = %cli.appdir.display(),
        env = %config.env,
        hostname = %config.server.hostname,
        port = config.server.port,
        "Configuration loaded"
    );

    let app = demo::application(config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let shutdown = Shutdown::new();
            lifecycle::serve(app, &shutdown).await?;
            tracing::info!("Shutdown complete");
        }
        Commands::Job { name } => {
            if let Err(e) = app.run_job(&name).await {
                if matches!(e, AppError::JobNotFound(_)) {
                    let mut known: Vec<&str> = app.job_names().collect();
                    known.sort_unstable();
                    tracing::error!(job = %name, known = ?known, "Unknown job");
                }
                return Err(e.into());
            }
        }
    }

    Ok(())
}
