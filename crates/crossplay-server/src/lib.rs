pub mod config;
pub mod engine;
pub mod multiplexer;
pub mod session;
pub mod session_manager;
pub mod translator;
pub mod worker;

pub use config::{BridgeConfig, ConfigError};
pub use engine::{NativeEngine, NativePacket};
pub use multiplexer::{Multiplexer, PollOutcome};
pub use session::{HandshakeStatus, Session};
pub use session_manager::SessionManager;
pub use translator::{TranslateError, Translator};
