use thiserror::Error;

/// Application level error type used throughout the crate.
#[derive(Error, Debug)]
pub enum AlarmError {
    /// I/O related failure
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error while parsing YAML configuration files
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Requested alarm was not found in the store
    #[error("Alarm not found: {0}")]
    AlarmNotFound(String),

    /// User directory lookup failed
    #[error("Directory error: {0}")]
    Directory(String),

    /// Notification channel failure (SMS gateway, mail sender, telephony)
    #[error("Channel error: {0}")]
    Channel(String),
}

/// Convenient alias over [`Result`] using [`AlarmError`]
pub type Result<T> = std::result::Result<T, AlarmError>;
