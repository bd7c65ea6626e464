use crossplay_common::CrossplayError;
use crossplay_logger::LogSeverity;
use crossplay_protocol::control::DEFAULT_MAX_FRAME_LEN;
use crossplay_world::translate::BlockTranslator;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for CrossplayError {
    fn from(err: ConfigError) -> Self {
        CrossplayError::ConfigError(err.to_string())
    }
}

/// Block sent in place of native blocks the client has no equivalent for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FallbackBlock {
    pub id: u8,
    pub data: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Require the encryption handshake at login.
    pub online_mode: bool,
    /// Disconnect reason sent to every player on shutdown.
    pub shutdown_message: String,
    /// Server list description.
    pub motd: String,
    pub max_players: u32,
    /// Where the worker accepts Desktop clients.
    pub listen_address: String,
    /// Where the engine listens for a standalone worker.
    pub ipc_address: String,
    pub log_level: String,
    /// Largest control frame accepted, in bytes after the length prefix.
    pub max_frame_length: usize,
    pub fallback_block: FallbackBlock,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            online_mode: false,
            shutdown_message: "Server closed".to_string(),
            motd: "A crossplay server".to_string(),
            max_players: 20,
            listen_address: "0.0.0.0:25565".to_string(),
            ipc_address: "127.0.0.1:25566".to_string(),
            log_level: "info".to_string(),
            max_frame_length: DEFAULT_MAX_FRAME_LEN,
            fallback_block: FallbackBlock::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_length == 0 {
            return Err(ConfigError::Invalid(
                "max_frame_length must be positive".to_string(),
            ));
        }
        if self.fallback_block.data > 15 {
            return Err(ConfigError::Invalid(format!(
                "fallback block data {} does not fit in 4 bits",
                self.fallback_block.data
            )));
        }
        if self.listen_address.trim().is_empty() {
            return Err(ConfigError::Invalid("listen_address is empty".to_string()));
        }
        self.severity()?;
        Ok(())
    }

    pub fn severity(&self) -> Result<LogSeverity, ConfigError> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    pub fn block_translator(&self) -> BlockTranslator {
        BlockTranslator::new(self.fallback_block.id, self.fallback_block.data)
    }
}
