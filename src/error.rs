use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipestatError {
    /// The server refused a listing request (401/403). Recoverable at the
    /// per-project scope during pipeline discovery.
    #[error("{0}")]
    AccessDenied(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to read profile store: {0}")]
    StoreRead(#[from] toml::de::Error),

    #[error("Failed to write profile store: {0}")]
    StoreWrite(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipestatError>;
