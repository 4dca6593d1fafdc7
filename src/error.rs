use thiserror::Error;

/// Errors raised while loading configuration.
///
/// The frame controllers themselves never fail; only startup can.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown key name: {0:?}")]
    UnknownKey(String),
}
