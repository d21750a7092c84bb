use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;
use tracing::{info, warn};

use crate::checklist::InspectionChecklist;
use crate::error::ExtractError;
use crate::metadata::{METADATA_COLUMN, ReportMetadataRecord};
use crate::options::CsvOptions;

/// Header of the key column when no index column is written.
const FIELD_COLUMN: &str = "field";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportOutputs {
    pub metadata: PathBuf,
    pub checklist: PathBuf,
}

#[must_use]
pub fn metadata_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("metadata_{stem}.csv"))
}

#[must_use]
pub fn checklist_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("inspection_{stem}.csv"))
}

/// Metadata as a one-column table indexed by field name.
pub fn write_metadata_csv<W: Write>(
    writer: W,
    metadata: &ReportMetadataRecord,
    options: &CsvOptions,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    let key_header = if options.include_index { "" } else { FIELD_COLUMN };
    writer.write_record([key_header, METADATA_COLUMN])?;
    for entry in metadata.entries() {
        writer.write_record([entry.key.as_str(), entry.value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Checklist rows, optionally preceded by a 0-based row index.
pub fn write_checklist_csv<W: Write>(
    writer: W,
    checklist: &InspectionChecklist,
    options: &CsvOptions,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    let mut headers = Vec::with_capacity(6);
    if options.include_index {
        headers.push("");
    }
    headers.extend(checklist.headers());
    writer.write_record(&headers)?;

    for (index, record) in checklist.records().enumerate() {
        if options.include_index {
            let mut row = Vec::with_capacity(record.len() + 1);
            row.push(index.to_string());
            row.extend(record);
            writer.write_record(&row)?;
        } else {
            writer.write_record(&record)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_file(
    path: &Path,
    write: impl FnOnce(fs::File) -> Result<(), ExtractError>,
) -> Result<(), ExtractError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write(fs::File::create(path)?)
}

/// Writes both CSV files of a report, or neither: when the checklist cannot
/// be written the metadata file just created is removed again.
pub fn write_report_csvs(
    metadata_dir: &Path,
    checklist_dir: &Path,
    stem: &str,
    metadata: &ReportMetadataRecord,
    checklist: &InspectionChecklist,
    options: &CsvOptions,
) -> Result<ReportOutputs, ExtractError> {
    let outputs = ReportOutputs {
        metadata: metadata_path(metadata_dir, stem),
        checklist: checklist_path(checklist_dir, stem),
    };

    write_file(&outputs.metadata, |file| {
        write_metadata_csv(file, metadata, options)
    })?;

    if let Err(error) = write_file(&outputs.checklist, |file| {
        write_checklist_csv(file, checklist, options)
    }) {
        if let Err(cleanup) = fs::remove_file(&outputs.metadata) {
            warn!(path = %outputs.metadata.display(), %cleanup, "could not remove partial output");
        }
        return Err(error);
    }

    info!(
        metadata = %outputs.metadata.display(),
        checklist = %outputs.checklist.display(),
        "report written"
    );
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::{write_checklist_csv, write_metadata_csv, write_report_csvs};
    use crate::checklist::InspectionChecklist;
    use crate::metadata::ReportMetadataRecord;
    use crate::options::CsvOptions;

    fn render_metadata(options: &CsvOptions) -> String {
        let record = ReportMetadataRecord::from_pairs([
            ("Order number", "4711"),
            ("Defects", "a, b"),
        ]);
        let mut out = Vec::new();
        write_metadata_csv(&mut out, &record, options).expect("metadata renders");
        String::from_utf8(out).expect("utf-8")
    }

    #[test]
    fn metadata_has_index_and_metadata_column() {
        assert_eq!(
            render_metadata(&CsvOptions::default()),
            ",Metadata\nOrder number,4711\nDefects,\"a, b\"\n"
        );
        let no_index = CsvOptions {
            include_index: false,
            ..CsvOptions::default()
        };
        assert!(render_metadata(&no_index).starts_with("field,Metadata\n"));
    }

    #[test]
    fn empty_checklist_still_has_headers() {
        let mut out = Vec::new();
        write_checklist_csv(&mut out, &InspectionChecklist::default(), &CsvOptions::default())
            .expect("checklist renders");
        assert_eq!(String::from_utf8(out).expect("utf-8"), ",item_number,check_item,result\n");
    }

    #[test]
    fn failed_checklist_write_removes_metadata_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let metadata_dir = dir.path().join("metadata");
        // A file where the checklist folder should be makes the second write fail.
        let checklist_dir = dir.path().join("blocked");
        std::fs::write(&checklist_dir, b"not a folder").expect("blocker written");

        let result = write_report_csvs(
            &metadata_dir,
            &checklist_dir,
            "820001_enercon_x_4711",
            &ReportMetadataRecord::from_pairs([("Order number", "4711")]),
            &InspectionChecklist::default(),
            &CsvOptions::default(),
        );

        assert!(result.is_err());
        assert!(!metadata_dir.join("metadata_820001_enercon_x_4711.csv").exists());
    }
}
