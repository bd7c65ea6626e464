use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::Level;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogSeverity {
    /// Most verbose `tracing` level emitted at this severity. `Fatal` has no
    /// dedicated level and shares `ERROR`.
    pub fn level(self) -> Level {
        match self {
            LogSeverity::Debug => Level::DEBUG,
            LogSeverity::Info => Level::INFO,
            LogSeverity::Warning => Level::WARN,
            LogSeverity::Error | LogSeverity::Fatal => Level::ERROR,
        }
    }
}

/// Display impl for LogSeverity
impl Display for LogSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogSeverity::Debug => write!(f, "DEBUG"),
            LogSeverity::Info => write!(f, "INFO"),
            LogSeverity::Warning => write!(f, "WARNING"),
            LogSeverity::Error => write!(f, "ERROR"),
            LogSeverity::Fatal => write!(f, "FATAL"),
        }
    }
}

impl FromStr for LogSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(LogSeverity::Debug),
            "info" => Ok(LogSeverity::Info),
            "warn" | "warning" => Ok(LogSeverity::Warning),
            "error" => Ok(LogSeverity::Error),
            "fatal" => Ok(LogSeverity::Fatal),
            other => Err(format!("unknown log severity '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_log_severity_display() {
        assert_eq!(format!("{}", LogSeverity::Debug), "DEBUG");
        assert_eq!(format!("{}", LogSeverity::Info), "INFO");
        assert_eq!(format!("{}", LogSeverity::Warning), "WARNING");
        assert_eq!(format!("{}", LogSeverity::Error), "ERROR");
        assert_eq!(format!("{}", LogSeverity::Fatal), "FATAL");
    }

    #[test]
    fn test_log_severity_parse() {
        assert_eq!("info".parse::<LogSeverity>(), Ok(LogSeverity::Info));
        assert_eq!("WARN".parse::<LogSeverity>(), Ok(LogSeverity::Warning));
        assert_eq!("trace".parse::<LogSeverity>(), Ok(LogSeverity::Debug));
        assert_matches!("loud".parse::<LogSeverity>(), Err(_));
    }

    #[test]
    fn test_log_severity_level() {
        assert_eq!(LogSeverity::Debug.level(), Level::DEBUG);
        assert_eq!(LogSeverity::Warning.level(), Level::WARN);
        assert_eq!(LogSeverity::Fatal.level(), Level::ERROR);
    }
}
