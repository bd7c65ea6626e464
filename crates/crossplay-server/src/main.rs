use clap::Parser;
use crossplay_common::CrossplayError;
use crossplay_logger::LogSeverity;
use crossplay_server::config::BridgeConfig;
use crossplay_server::worker::{bind_listener, run_worker};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpStream;
use tracing::{error, info};

/// Standalone network worker. Connects to an engine listening on the
/// configured IPC address and serves Desktop clients on the listen address.
#[derive(Debug, Parser)]
#[command(name = "crossplay-worker", version, about)]
struct Cli {
    /// JSON configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured log level (debug, info, warning, error).
    #[arg(long)]
    log_level: Option<LogSeverity>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "worker stopped");
            eprintln!("crossplay-worker: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CrossplayError> {
    let config = match &cli.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::default(),
    };
    let severity = match cli.log_level {
        Some(severity) => severity,
        None => config.severity()?,
    };
    crossplay_logger::init(severity)?;

    info!(ipc = %config.ipc_address, "connecting to engine");
    let control = TcpStream::connect(&config.ipc_address).await?;
    let listener = bind_listener(&config).await?;
    run_worker(config, listener, control).await?;
    info!("worker stopped");
    Ok(())
}
