mod batch;
mod checklist;
mod csv_out;
mod error;
mod extract;
mod font_metrics;
mod geometry;
mod metadata;
mod model;
mod options;
mod pdf_reader;
mod report;
mod rows;
mod source;
mod table_detect;

use std::path::Path;

pub use batch::{
    BatchProcessor, BatchSummary, CsvSink, ProcessedReport, ReportFailure, ReportSink,
    ReportSuccess, list_report_files, process_report,
};
pub use checklist::{
    CATEGORY_COLUMNS, ChecklistItem, InspectionChecklist, assemble_checklist,
    categorize_inspection_items,
};
pub use csv_out::{
    ReportOutputs, checklist_path, metadata_path, write_checklist_csv, write_metadata_csv,
    write_report_csvs,
};
pub use error::ExtractError;
pub use extract::{extract_grid, extract_grid_over_pages};
pub use geometry::{
    ChecklistStart, ChecklistStep, FilenamePart, HeaderField, MetadataSource, OverviewHook,
    RegionSection, SectionTransform, Vendor, VendorGeometry,
};
pub use metadata::{
    METADATA_COLUMN, MetadataEntry, ReportMetadataRecord, assemble_metadata,
    record_from_header_fields,
};
pub use model::{TableGrid, TextRun};
pub use options::{BatchOptions, CsvOptions, ExtractionRegion, PageSpan, Rect};
pub use report::{ReportModel, derive_filename, is_master_order, read_order_type};
pub use rows::{
    CHECKLIST_COLUMNS, NOISE_ROW, drop_blank_rows, filter_rows_between_anchors,
    merge_continuation_lines, merge_rows_by_capitalization, merge_rows_by_capitalization_in,
    require_rows_between_anchors, stack_columns_in_pairs, standardize_columns, truncate_columns,
};
pub use source::{PdfSource, ReportSource};

/// Extracts every report in `input_dir` and writes one metadata and one
/// checklist CSV per report.
pub fn extract_folder_to_csv(
    vendor: Vendor,
    input_dir: &Path,
    metadata_dir: &Path,
    checklist_dir: &Path,
    batch_options: &BatchOptions,
    csv_options: &CsvOptions,
) -> Result<BatchSummary, ExtractError> {
    let mut sink = CsvSink::new(metadata_dir, checklist_dir, csv_options.clone());
    BatchProcessor::new(vendor, batch_options.clone()).run(
        input_dir,
        |path| Ok(PdfSource::new(path)),
        &mut sink,
    )
}
