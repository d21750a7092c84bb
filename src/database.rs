use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};

use crate::error::IngestError;
use crate::models::{
    CHECKLIST_TABLE, IngestionTracking, METADATA_TABLE, ServiceReportChecklistRow,
    ServiceReportMetadataRow, TRACKING_TABLE,
};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS ingestion_trackings (
    service_report_uuid TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    is_processed INTEGER NOT NULL DEFAULT 0,
    has_error INTEGER NOT NULL DEFAULT 0,
    processed_time TEXT
);

CREATE TABLE IF NOT EXISTS service_reports_metadatas (
    service_report_uuid TEXT PRIMARY KEY,
    order_number INTEGER,
    service_company TEXT NOT NULL,
    wec_serial_number INTEGER,
    order_type TEXT,
    completion_date TEXT,
    free_of_defects INTEGER,
    defects INTEGER
);

CREATE TABLE IF NOT EXISTS service_reports_checklists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    service_report_uuid TEXT NOT NULL,
    order_number INTEGER,
    line_number INTEGER,
    service_company TEXT,
    item_category TEXT,
    item_number TEXT,
    check_item TEXT,
    result TEXT
);

CREATE INDEX IF NOT EXISTS idx_checklists_report ON service_reports_checklists(service_report_uuid);
";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Asks before a destructive database operation.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Confirmation given up front, e.g. by `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Prompts on `output` and reads one answer line from `input`. Only `y`
/// proceeds.
#[derive(Debug)]
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{prompt} [y/N] ").and_then(|()| self.output.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
            Err(_) => false,
        }
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|date| date.format(DATE_FORMAT).to_string())
}

/// SQLite store for ingested service reports.
#[derive(Debug)]
pub struct ReportDatabase {
    conn: Connection,
    path: Option<PathBuf>,
}

impl ReportDatabase {
    /// Opens or creates a database file with the full schema.
    pub fn open_or_create(path: &Path) -> Result<Self, IngestError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, IngestError> {
        let db = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), IngestError> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes a report's tracking, metadata and checklist rows in one
    /// transaction.
    pub fn insert_report(
        &mut self,
        tracking: &IngestionTracking,
        metadata: &ServiceReportMetadataRow,
        checklist: &[ServiceReportChecklistRow],
    ) -> Result<(), IngestError> {
        let tx = self.conn.transaction()?;
        insert_tracking(&tx, tracking)?;
        tx.execute(
            "INSERT INTO service_reports_metadatas (
                service_report_uuid, order_number, service_company, wec_serial_number,
                order_type, completion_date, free_of_defects, defects
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                metadata.service_report_uuid,
                metadata.order_number,
                metadata.service_company,
                metadata.wec_serial_number,
                metadata.order_type,
                format_date(metadata.completion_date),
                metadata.free_of_defects,
                metadata.defects,
            ],
        )?;
        {
            let mut statement = tx.prepare(
                "INSERT INTO service_reports_checklists (
                    service_report_uuid, order_number, line_number, service_company,
                    item_category, item_number, check_item, result
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in checklist {
                statement.execute(params![
                    row.service_report_uuid,
                    row.order_number,
                    row.line_number,
                    row.service_company,
                    row.item_category,
                    row.item_number,
                    row.check_item,
                    row.result,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Tracking row for a report that produced no data.
    pub fn record_failure(&self, tracking: &IngestionTracking) -> Result<(), IngestError> {
        insert_tracking(&self.conn, tracking)
    }

    pub fn tracking(&self, uuid: &str) -> Result<Option<IngestionTracking>, IngestError> {
        let tracking = self
            .conn
            .query_row(
                "SELECT service_report_uuid, file_name, is_processed, has_error, processed_time
                 FROM ingestion_trackings WHERE service_report_uuid = ?1",
                params![uuid],
                |row| {
                    Ok(IngestionTracking {
                        service_report_uuid: row.get(0)?,
                        file_name: row.get(1)?,
                        is_processed: row.get(2)?,
                        has_error: row.get(3)?,
                        processed_time: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(tracking)
    }

    pub fn metadata(&self, uuid: &str) -> Result<Option<ServiceReportMetadataRow>, IngestError> {
        let row = self
            .conn
            .query_row(
                "SELECT service_report_uuid, order_number, service_company, wec_serial_number,
                        order_type, completion_date, free_of_defects, defects
                 FROM service_reports_metadatas WHERE service_report_uuid = ?1",
                params![uuid],
                |row| {
                    let completion_date: Option<String> = row.get(5)?;
                    Ok(ServiceReportMetadataRow {
                        service_report_uuid: row.get(0)?,
                        order_number: row.get(1)?,
                        service_company: row.get(2)?,
                        wec_serial_number: row.get(3)?,
                        order_type: row.get(4)?,
                        completion_date: completion_date
                            .and_then(|value| NaiveDate::parse_from_str(&value, DATE_FORMAT).ok()),
                        free_of_defects: row.get(6)?,
                        defects: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Checklist rows of one report ordered by line number.
    pub fn checklist(&self, uuid: &str) -> Result<Vec<ServiceReportChecklistRow>, IngestError> {
        let mut statement = self.conn.prepare(
            "SELECT service_report_uuid, order_number, line_number, service_company,
                    item_category, item_number, check_item, result
             FROM service_reports_checklists
             WHERE service_report_uuid = ?1
             ORDER BY line_number",
        )?;
        let rows = statement
            .query_map(params![uuid], |row| {
                Ok(ServiceReportChecklistRow {
                    service_report_uuid: row.get(0)?,
                    order_number: row.get(1)?,
                    line_number: row.get(2)?,
                    service_company: row.get(3)?,
                    item_category: row.get(4)?,
                    item_number: row.get(5)?,
                    check_item: row.get(6)?,
                    result: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self, table: &str) -> Result<i64, IngestError> {
        if ![TRACKING_TABLE, METADATA_TABLE, CHECKLIST_TABLE].contains(&table) {
            return Err(IngestError::InvalidInput(format!("unknown table '{table}'")));
        }
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }

    /// Drops all report tables after confirmation.
    pub fn drop_tables(&self, confirm: &mut dyn Confirm) -> Result<(), IngestError> {
        if !confirm.confirm("Drop all service report tables?") {
            return Err(IngestError::Cancelled("drop tables declined".to_string()));
        }
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS service_reports_checklists;
             DROP TABLE IF EXISTS service_reports_metadatas;
             DROP TABLE IF EXISTS ingestion_trackings;",
        )?;
        warn!("service report tables dropped");
        Ok(())
    }

    /// Closes the connection and removes the database file after
    /// confirmation. An in-memory database has no file to remove.
    pub fn delete_file(self, confirm: &mut dyn Confirm) -> Result<(), IngestError> {
        let Some(path) = self.path.clone() else {
            return Err(IngestError::InvalidInput(
                "in-memory database has no file".to_string(),
            ));
        };
        if !confirm.confirm(&format!("Delete database file '{}'?", path.display())) {
            return Err(IngestError::Cancelled("delete database declined".to_string()));
        }

        self.conn.close().map_err(|(_, error)| IngestError::from(error))?;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let file = PathBuf::from(file);
            if file.exists() {
                std::fs::remove_file(&file)?;
            }
        }
        info!(path = %path.display(), "database file deleted");
        Ok(())
    }
}

fn insert_tracking(conn: &Connection, tracking: &IngestionTracking) -> Result<(), IngestError> {
    conn.execute(
        "INSERT INTO ingestion_trackings (
            service_report_uuid, file_name, is_processed, has_error, processed_time
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            tracking.service_report_uuid,
            tracking.file_name,
            tracking.is_processed,
            tracking.has_error,
            tracking.processed_time,
        ],
    )?;
    Ok(())
}
