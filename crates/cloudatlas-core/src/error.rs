use thiserror::Error;

/// Top-level error type for CloudAtlas.
#[derive(Error, Debug)]
pub enum CloudAtlasError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for CloudAtlasError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
