use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE_FILE: &str = "data/service_reports.db";

pub const TRACKING_TABLE: &str = "ingestion_trackings";
pub const METADATA_TABLE: &str = "service_reports_metadatas";
pub const CHECKLIST_TABLE: &str = "service_reports_checklists";

/// One row of `ingestion_trackings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestionTracking {
    pub service_report_uuid: String,
    pub file_name: String,
    pub is_processed: bool,
    pub has_error: bool,
    pub processed_time: Option<String>,
}

/// One row of `service_reports_metadatas`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceReportMetadataRow {
    pub service_report_uuid: String,
    pub order_number: Option<i64>,
    pub service_company: String,
    pub wec_serial_number: Option<i64>,
    pub order_type: Option<String>,
    pub completion_date: Option<NaiveDate>,
    pub free_of_defects: Option<i64>,
    pub defects: Option<i64>,
}

/// One row of `service_reports_checklists`. `id` is assigned by SQLite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceReportChecklistRow {
    pub service_report_uuid: String,
    pub order_number: Option<i64>,
    pub line_number: i64,
    pub service_company: String,
    pub item_category: Option<String>,
    pub item_number: String,
    pub check_item: String,
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestedReport {
    pub file_name: String,
    pub service_report_uuid: String,
    pub checklist_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedReport {
    pub file_name: String,
    pub service_report_uuid: String,
    pub error: String,
}

/// Printed by `report-ingest --json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestSummary {
    pub database: String,
    pub ingested: Vec<IngestedReport>,
    pub failed: Vec<FailedReport>,
}
