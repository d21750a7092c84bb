use std::fmt::{Display, Formatter};

use service_report_extract::ExtractError;

#[derive(Debug)]
pub enum IngestError {
    Database(String),
    Extract(String),
    Io(String),
    Cancelled(String),
    InvalidInput(String),
    Json(String),
}

impl IngestError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Extract(_) => "extract",
            Self::Io(_) => "io",
            Self::Cancelled(_) => "cancelled",
            Self::InvalidInput(_) => "invalid_input",
            Self::Json(_) => "json",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Database(message)
            | Self::Extract(message)
            | Self::Io(message)
            | Self::Cancelled(message)
            | Self::InvalidInput(message)
            | Self::Json(message) => message,
        }
    }
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for IngestError {}

impl From<rusqlite::Error> for IngestError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Database(error.to_string())
    }
}

impl From<ExtractError> for IngestError {
    fn from(error: ExtractError) -> Self {
        match error {
            ExtractError::Io(error) => Self::Io(error.to_string()),
            other => Self::Extract(other.to_string()),
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}
