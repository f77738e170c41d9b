//! Error types for the backtesting engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("backtest already running")]
    AlreadyRunning,

    #[error("data source error: {0}")]
    Source(#[from] anyhow::Error),
}

impl Error {
    /// Build a configuration error from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = Error::config("initial capital must be positive");
        assert_eq!(
            err.to_string(),
            "configuration error: initial capital must be positive"
        );
    }

    #[test]
    fn test_source_error_wraps_anyhow() {
        let err: Error = anyhow::anyhow!("store unreachable").into();
        assert!(err.to_string().contains("store unreachable"));
    }
}
