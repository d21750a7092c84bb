use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::ExtractError;
use crate::extract::extract_grid;
use crate::geometry::{HeaderField, MetadataSource, RegionSection, SectionTransform};
use crate::model::{TableGrid, is_blank};
use crate::report::ReportModel;
use crate::rows::{merge_rows_by_capitalization, stack_columns_in_pairs};
use crate::source::ReportSource;

/// Column name of the metadata value in CSV output.
pub const METADATA_COLUMN: &str = "Metadata";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// Report header fields in extraction order. Keys are unique and never blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReportMetadataRecord {
    entries: Vec<MetadataEntry>,
}

impl ReportMetadataRecord {
    /// Builds a record from key/value pairs. Blank keys are skipped and the
    /// first value of a repeated key wins.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut record = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref().trim();
            if key.is_empty() || record.contains(key) {
                continue;
            }
            record.entries.push(MetadataEntry {
                key: key.to_string(),
                value: value.as_ref().trim().to_string(),
            });
        }
        record
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    #[must_use]
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn section_grid(
    source: &impl ReportSource,
    section: &RegionSection,
    is_master: bool,
) -> Result<TableGrid, ExtractError> {
    let grid = extract_grid(source, section.page, section.region_for(is_master))?;
    debug!(section = section.name, rows = grid.len(), "metadata section extracted");
    match section.transform {
        SectionTransform::PairStack => stack_columns_in_pairs(&grid),
        SectionTransform::CapitalizationMerge => Ok(merge_rows_by_capitalization(grid, false)),
    }
}

/// Concatenates the sub-tables in order and keys the record by the first
/// column. Rows with a blank key are dropped.
fn record_from_sections(
    source: &impl ReportSource,
    sections: &[RegionSection],
    is_master: bool,
) -> Result<ReportMetadataRecord, ExtractError> {
    let mut grids = Vec::with_capacity(sections.len());
    for section in sections {
        grids.push(section_grid(source, section, is_master)?);
    }

    let combined = TableGrid::concat(grids);
    Ok(ReportMetadataRecord::from_pairs(
        combined
            .rows()
            .iter()
            .filter(|row| !is_blank(&row[0]))
            .map(|row| (row[0].as_str(), row.get(1).map_or("", String::as_str))),
    ))
}

fn capture_field(text: &str, field: &HeaderField) -> Result<String, ExtractError> {
    let pattern = Regex::new(field.pattern)?;
    let Some(captured) = pattern.captures(text).and_then(|captures| captures.get(1)) else {
        debug!(field = field.key, "header field not found");
        return Ok(String::new());
    };

    if field.multi_line {
        return Ok(captured
            .as_str()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(", "));
    }
    Ok(captured.as_str().trim().to_string())
}

/// Reads header fields from page text. Missing fields keep their key with an
/// empty value so every report has the same field list.
pub fn record_from_header_fields(
    text: &str,
    fields: &[HeaderField],
) -> Result<ReportMetadataRecord, ExtractError> {
    let mut pairs = Vec::with_capacity(fields.len());
    for field in fields {
        pairs.push((field.key, capture_field(text, field)?));
    }
    Ok(ReportMetadataRecord::from_pairs(pairs))
}

pub fn assemble_metadata<S: ReportSource>(
    model: &ReportModel<S>,
) -> Result<ReportMetadataRecord, ExtractError> {
    match &model.geometry().metadata {
        MetadataSource::Sections(sections) => {
            record_from_sections(model.source(), sections, model.is_master())
        }
        MetadataSource::HeaderFields { page, fields } => {
            let text = model.source().page_text(*page)?;
            record_from_header_fields(&text, fields)
        }
    }
}
