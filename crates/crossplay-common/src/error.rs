use std::io;
use thiserror::Error;

/// Top-level error for the bridge binaries and the network worker.
///
/// Layer-specific errors (codec, framing, translation, configuration) convert
/// into this type at the crate boundary where they are raised.
#[derive(Debug, Error)]
pub enum CrossplayError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Protocol error: {0}")]
    ProtocolError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Server error: {0}")]
    ServerError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::error::Error;

    #[test]
    fn test_io_error_keeps_source() {
        let err: CrossplayError = io::Error::new(io::ErrorKind::BrokenPipe, "peer gone").into();
        assert_matches!(err, CrossplayError::IoError(_));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "IO error: peer gone");
    }

    #[test]
    fn test_display() {
        let err = CrossplayError::ProtocolError("bad frame".to_owned());
        assert_eq!(err.to_string(), "Protocol error: bad frame");
        assert!(err.source().is_none());
    }
}
