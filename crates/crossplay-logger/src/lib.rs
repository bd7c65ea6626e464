pub mod severity;

pub use severity::LogSeverity;

use crossplay_common::CrossplayError;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber at `severity`. `RUST_LOG`, when set,
/// overrides the severity.
pub fn init(severity: LogSeverity) -> Result<(), CrossplayError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(severity.level().as_str().to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| CrossplayError::ServerError(format!("failed to install logger: {}", e)))
}
