use thiserror::Error;

/// Core error type shared across leadform crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A form or rule set could not be resolved at bind time.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Convenience alias for results returned by leadform crates.
pub type Result<T> = std::result::Result<T, Error>;
