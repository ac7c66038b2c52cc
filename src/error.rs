use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// No response was received at all (DNS, connection, timeout).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Downloaded file is empty")]
    EmptyPayload,

    #[error("Unexpected payload: expected {expected}")]
    UnexpectedPayload { expected: &'static str },

    #[error("All download stages failed for report {report_id}: {last_error}")]
    Exhausted { report_id: i64, last_error: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Viewer error: {0}")]
    Viewer(String),
}

impl ClientError {
    /// True when the service could not be reached, as opposed to answering with an error.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
