use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwitcherError {
    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Notification request failed: {0}")]
    NotificationError(#[from] reqwest::Error),

    #[error("Notification endpoint returned status {status_code}")]
    EndpointError { status_code: u16 },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type TwitcherResult<T> = Result<T, TwitcherError>;
