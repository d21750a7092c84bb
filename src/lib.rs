pub mod database;
pub mod error;
pub mod models;
pub mod pipeline;

pub use database::{AssumeYes, Confirm, PromptConfirm, ReportDatabase};
pub use error::IngestError;
pub use pipeline::{DatabaseSink, ingest_folder, ingest_with};
