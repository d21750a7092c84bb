use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to extract PDF text: {0}")]
    PdfText(String),

    #[error("page {page} is outside the document (1..={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("invalid page range {start}-{end}: start must not exceed end")]
    InvalidPageRange { start: u32, end: u32 },

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("no table found on page {page}")]
    NoTableFound { page: u32 },

    #[error("no table found on pages {start}-{end}")]
    NoTableInRange { start: u32, end: u32 },

    #[error("anchor '{anchor}' not found in extracted table")]
    AnchorNotFound { anchor: String },

    #[error("malformed region geometry: {0}")]
    MalformedGeometry(String),

    #[error("expected exactly {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("invalid header field pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("unknown vendor '{0}', expected 'enercon' or 'vestas'")]
    UnknownVendor(String),

    #[error("failed to process report '{}': {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: Box<ExtractError>,
    },
}

impl ExtractError {
    #[must_use]
    pub fn for_report(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Report { .. } => self,
            other => Self::Report {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}
