use std::collections::HashSet;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::checklist::{InspectionChecklist, assemble_checklist};
use crate::csv_out::{ReportOutputs, write_report_csvs};
use crate::error::ExtractError;
use crate::geometry::Vendor;
use crate::metadata::{ReportMetadataRecord, assemble_metadata};
use crate::options::{BatchOptions, CsvOptions};
use crate::report::ReportModel;
use crate::source::ReportSource;

/// Everything extracted from one report, ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedReport {
    pub path: PathBuf,
    pub vendor: Vendor,
    pub order_type: Option<String>,
    pub is_master: bool,
    pub metadata: ReportMetadataRecord,
    pub checklist: InspectionChecklist,
    /// Output stem derived from metadata, unique within a batch.
    pub stem: String,
}

pub fn process_report<S: ReportSource>(
    path: &Path,
    source: S,
    vendor: Vendor,
    options: &BatchOptions,
) -> Result<ProcessedReport, ExtractError> {
    let model = ReportModel::new(source, vendor);
    let metadata = assemble_metadata(&model)?;
    let checklist = assemble_checklist(&model, options.categorize)?;
    let stem = model.filename(&metadata);

    Ok(ProcessedReport {
        path: path.to_path_buf(),
        vendor,
        order_type: model.order_type().map(str::to_string),
        is_master: model.is_master(),
        metadata,
        checklist,
        stem,
    })
}

/// Destination for finished reports.
pub trait ReportSink {
    type Error: Display;

    fn write(&mut self, report: &ProcessedReport) -> Result<(), Self::Error>;

    /// Called once for every report that could not be processed or written.
    fn fail(&mut self, _path: &Path, _message: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Writes `metadata_<stem>.csv` and `inspection_<stem>.csv` per report.
#[derive(Debug, Clone)]
pub struct CsvSink {
    metadata_dir: PathBuf,
    checklist_dir: PathBuf,
    options: CsvOptions,
    written: Vec<ReportOutputs>,
}

impl CsvSink {
    pub fn new(
        metadata_dir: impl Into<PathBuf>,
        checklist_dir: impl Into<PathBuf>,
        options: CsvOptions,
    ) -> Self {
        Self {
            metadata_dir: metadata_dir.into(),
            checklist_dir: checklist_dir.into(),
            options,
            written: Vec::new(),
        }
    }

    #[must_use]
    pub fn written(&self) -> &[ReportOutputs] {
        &self.written
    }
}

impl ReportSink for CsvSink {
    type Error = ExtractError;

    fn write(&mut self, report: &ProcessedReport) -> Result<(), Self::Error> {
        let outputs = write_report_csvs(
            &self.metadata_dir,
            &self.checklist_dir,
            &report.stem,
            &report.metadata,
            &report.checklist,
            &self.options,
        )?;
        self.written.push(outputs);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSuccess {
    pub path: PathBuf,
    pub stem: String,
    pub checklist_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: Vec<ReportSuccess>,
    pub failed: Vec<ReportFailure>,
}

impl BatchSummary {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// `*.pdf` files directly inside `dir`, extension matched case-insensitively,
/// sorted by path.
pub fn list_report_files(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase().replace(char::is_whitespace, "_"))
        .unwrap_or_default()
}

/// Processes a folder of reports one at a time. A failing report is logged,
/// recorded and skipped; it never stops the batch.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    vendor: Vendor,
    options: BatchOptions,
}

impl BatchProcessor {
    #[must_use]
    pub fn new(vendor: Vendor, options: BatchOptions) -> Self {
        Self { vendor, options }
    }

    /// Runs every report in `input_dir` through `sink`. Only an unreadable
    /// input folder is an error.
    pub fn run<S, F, K>(
        &self,
        input_dir: &Path,
        mut open_source: F,
        sink: &mut K,
    ) -> Result<BatchSummary, ExtractError>
    where
        S: ReportSource,
        F: FnMut(&Path) -> Result<S, ExtractError>,
        K: ReportSink,
    {
        let files = list_report_files(input_dir)?;
        info!(
            vendor = %self.vendor,
            count = files.len(),
            dir = %input_dir.display(),
            "processing reports"
        );

        let mut summary = BatchSummary::default();
        let mut used_stems = HashSet::new();

        for path in files {
            let outcome = open_source(&path)
                .and_then(|source| process_report(&path, source, self.vendor, &self.options))
                .map_err(|error| error.for_report(&path));

            let mut report = match outcome {
                Ok(report) => report,
                Err(error) => {
                    record_failure(&mut summary, sink, &path, &error.to_string());
                    continue;
                }
            };

            if !used_stems.insert(report.stem.clone()) {
                let unique = format!("{}_{}", report.stem, file_stem(&path));
                warn!(
                    file = %path.display(),
                    stem = %report.stem,
                    renamed = %unique,
                    "output name already used in this batch"
                );
                used_stems.insert(unique.clone());
                report.stem = unique;
            }

            match sink.write(&report) {
                Ok(()) => summary.succeeded.push(ReportSuccess {
                    path: path.clone(),
                    stem: report.stem,
                    checklist_rows: report.checklist.len(),
                }),
                Err(error) => {
                    let message = format!("failed to write report '{}': {error}", path.display());
                    record_failure(&mut summary, sink, &path, &message);
                }
            }
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "batch finished"
        );
        Ok(summary)
    }
}

fn record_failure<K: ReportSink>(
    summary: &mut BatchSummary,
    sink: &mut K,
    path: &Path,
    message: &str,
) {
    error!(file = %path.display(), "{message}");
    if let Err(sink_error) = sink.fail(path, message) {
        error!(file = %path.display(), %sink_error, "sink could not record failure");
    }
    summary.failed.push(ReportFailure {
        path: path.to_path_buf(),
        error: message.to_string(),
    });
}
