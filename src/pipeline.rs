use std::path::Path;

use chrono::{NaiveDate, Utc};
use service_report_extract::{
    BatchOptions, BatchProcessor, PdfSource, ProcessedReport, ReportSink, ReportSource, Vendor,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::ReportDatabase;
use crate::error::IngestError;
use crate::models::{
    FailedReport, IngestSummary, IngestedReport, IngestionTracking, ServiceReportChecklistRow,
    ServiceReportMetadataRow,
};

const DATE_FORMATS: [&str; 3] = ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"];

/// Metadata keys feeding the relational columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    pub order_number: &'static str,
    pub serial_number: &'static str,
    pub completion_date: &'static str,
    pub free_of_defects: Option<&'static str>,
    pub defects: Option<&'static str>,
    /// Metadata key holding the order type; `None` reads it from page 1.
    pub order_type: Option<&'static str>,
}

#[must_use]
pub const fn field_map(vendor: Vendor) -> FieldMap {
    match vendor {
        Vendor::Enercon => FieldMap {
            order_number: "Order number",
            serial_number: "Serial number",
            completion_date: "Completion date",
            free_of_defects: Some("Free of defects"),
            defects: Some("Defects"),
            order_type: None,
        },
        Vendor::Vestas => FieldMap {
            order_number: "service_order",
            serial_number: "turbine_number",
            completion_date: "end_date",
            free_of_defects: None,
            defects: None,
            order_type: Some("reason_for_call_out"),
        },
    }
}

/// Digits of a number cell, ignoring grouping spaces. Anything else is `None`.
#[must_use]
pub fn parse_integer(value: &str) -> Option<i64> {
    let compact = value.chars().filter(|ch| !ch.is_whitespace()).collect::<String>();
    compact.parse().ok()
}

#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[must_use]
pub fn metadata_row(uuid: &str, report: &ProcessedReport) -> ServiceReportMetadataRow {
    let fields = field_map(report.vendor);
    let metadata = &report.metadata;
    let integer = |key: Option<&str>| key.and_then(|key| metadata.get(key)).and_then(parse_integer);

    let order_type = match fields.order_type {
        Some(key) => non_empty(metadata.get(key)),
        None => non_empty(report.order_type.as_deref()),
    };

    ServiceReportMetadataRow {
        service_report_uuid: uuid.to_string(),
        order_number: integer(Some(fields.order_number)),
        service_company: report.vendor.as_str().to_string(),
        wec_serial_number: integer(Some(fields.serial_number)),
        order_type,
        completion_date: metadata.get(fields.completion_date).and_then(parse_date),
        free_of_defects: integer(fields.free_of_defects),
        defects: integer(fields.defects),
    }
}

#[must_use]
pub fn checklist_rows(
    uuid: &str,
    order_number: Option<i64>,
    report: &ProcessedReport,
) -> Vec<ServiceReportChecklistRow> {
    report
        .checklist
        .items()
        .iter()
        .zip(1_i64..)
        .map(|(item, line_number)| ServiceReportChecklistRow {
            service_report_uuid: uuid.to_string(),
            order_number,
            line_number,
            service_company: report.vendor.as_str().to_string(),
            item_category: item.item_category.clone(),
            item_number: item.item_number.clone(),
            check_item: item.check_item.clone(),
            result: item.result.clone(),
        })
        .collect()
}

/// Sink persisting each report under a fresh v4 UUID.
#[derive(Debug)]
pub struct DatabaseSink {
    db: ReportDatabase,
    summary: IngestSummary,
}

impl DatabaseSink {
    pub fn new(db: ReportDatabase) -> Self {
        let database = db
            .path()
            .map_or_else(|| ":memory:".to_string(), |path| path.display().to_string());
        Self {
            db,
            summary: IngestSummary {
                database,
                ..IngestSummary::default()
            },
        }
    }

    pub fn database(&self) -> &ReportDatabase {
        &self.db
    }

    pub fn summary(&self) -> &IngestSummary {
        &self.summary
    }

    pub fn into_parts(self) -> (ReportDatabase, IngestSummary) {
        (self.db, self.summary)
    }
}

impl ReportSink for DatabaseSink {
    type Error = IngestError;

    fn write(&mut self, report: &ProcessedReport) -> Result<(), Self::Error> {
        let uuid = Uuid::new_v4().to_string();
        let metadata = metadata_row(&uuid, report);
        let checklist = checklist_rows(&uuid, metadata.order_number, report);
        let tracking = IngestionTracking {
            service_report_uuid: uuid.clone(),
            file_name: file_name(&report.path),
            is_processed: true,
            has_error: false,
            processed_time: Some(Utc::now().to_rfc3339()),
        };

        self.db.insert_report(&tracking, &metadata, &checklist)?;
        debug!(uuid = %uuid, rows = checklist.len(), "report stored");
        self.summary.ingested.push(IngestedReport {
            file_name: tracking.file_name,
            service_report_uuid: uuid,
            checklist_rows: checklist.len(),
        });
        Ok(())
    }

    fn fail(&mut self, path: &Path, message: &str) -> Result<(), Self::Error> {
        let uuid = Uuid::new_v4().to_string();
        let tracking = IngestionTracking {
            service_report_uuid: uuid.clone(),
            file_name: file_name(path),
            is_processed: false,
            has_error: true,
            processed_time: Some(Utc::now().to_rfc3339()),
        };
        self.db.record_failure(&tracking)?;
        self.summary.failed.push(FailedReport {
            file_name: tracking.file_name,
            service_report_uuid: uuid,
            error: message.to_string(),
        });
        Ok(())
    }
}

/// Runs a folder through the extractor into `sink`, opening reports with
/// `open_source`.
pub fn ingest_with<S, F>(
    vendor: Vendor,
    input_dir: &Path,
    options: &BatchOptions,
    open_source: F,
    sink: &mut DatabaseSink,
) -> Result<(), IngestError>
where
    S: ReportSource,
    F: FnMut(&Path) -> Result<S, service_report_extract::ExtractError>,
{
    let summary = BatchProcessor::new(vendor, options.clone()).run(input_dir, open_source, sink)?;
    info!(
        ingested = summary.succeeded.len(),
        failed = summary.failed.len(),
        database = %sink.summary().database,
        "ingestion finished"
    );
    Ok(())
}

/// Extracts every PDF in `input_dir` and stores it in the database at
/// `database_path`, creating the file and schema when missing.
pub fn ingest_folder(
    vendor: Vendor,
    input_dir: &Path,
    database_path: &Path,
    options: &BatchOptions,
) -> Result<IngestSummary, IngestError> {
    let db = ReportDatabase::open_or_create(database_path)?;
    let mut sink = DatabaseSink::new(db);
    ingest_with(vendor, input_dir, options, |path| Ok(PdfSource::new(path)), &mut sink)?;
    let (_, summary) = sink.into_parts();
    Ok(summary)
}
