use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::extract::extract_grid_over_pages;
use crate::geometry::{ChecklistStart, ChecklistStep, OverviewHook};
use crate::model::{TableGrid, is_blank};
use crate::report::ReportModel;
use crate::rows::{
    CHECKLIST_COLUMNS, NOISE_ROW, drop_blank_rows, merge_continuation_lines,
    merge_rows_by_capitalization_in, require_rows_between_anchors, standardize_columns,
    truncate_columns,
};
use crate::source::ReportSource;

pub const CATEGORY_COLUMNS: [&str; 2] = ["item_category", "item_number_within_category"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_number_within_category: Option<u32>,
    pub item_number: String,
    pub check_item: String,
    pub result: String,
}

impl ChecklistItem {
    fn from_row(row: &[String]) -> Self {
        let cell = |index: usize| {
            row.get(index)
                .map_or_else(String::new, |cell| cell.trim().to_string())
        };
        Self {
            item_category: None,
            item_number_within_category: None,
            item_number: cell(0),
            check_item: cell(1),
            result: cell(2),
        }
    }
}

/// Normalised inspection checklist of one report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectionChecklist {
    items: Vec<ChecklistItem>,
    categorized: bool,
}

impl InspectionChecklist {
    #[must_use]
    pub fn new(items: Vec<ChecklistItem>, categorized: bool) -> Self {
        Self { items, categorized }
    }

    #[must_use]
    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    #[must_use]
    pub fn is_categorized(&self) -> bool {
        self.categorized
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Column names matching [`Self::records`].
    #[must_use]
    pub fn headers(&self) -> Vec<&'static str> {
        let mut headers = Vec::with_capacity(5);
        if self.categorized {
            headers.extend(CATEGORY_COLUMNS);
        }
        headers.extend(CHECKLIST_COLUMNS);
        headers
    }

    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.items.iter().map(|item| {
            let mut record = Vec::with_capacity(5);
            if self.categorized {
                record.push(item.item_category.clone().unwrap_or_default());
                record.push(
                    item.item_number_within_category
                        .map(|number| number.to_string())
                        .unwrap_or_default(),
                );
            }
            record.push(item.item_number.clone());
            record.push(item.check_item.clone());
            record.push(item.result.clone());
            record
        })
    }
}

fn is_item_number(value: &str) -> bool {
    let value = value.trim();
    value.chars().any(|ch| ch.is_ascii_digit())
        && value.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
}

/// Turns category header rows into a label on the items below them.
///
/// A row whose item number is not a dotted digit string is a header: its
/// check item becomes the current label, the category counter increments and
/// the row is dropped. Items before the first header carry no category.
#[must_use]
pub fn categorize_inspection_items(items: Vec<ChecklistItem>) -> Vec<ChecklistItem> {
    let mut category: Option<(String, u32)> = None;
    let mut counter = 0_u32;
    let mut out = Vec::with_capacity(items.len());

    for mut item in items {
        if !is_item_number(&item.item_number) {
            if is_blank(&item.check_item) {
                continue;
            }
            counter += 1;
            category = Some((item.check_item, counter));
            continue;
        }

        if let Some((label, number)) = &category {
            item.item_category = Some(label.clone());
            item.item_number_within_category = Some(*number);
        }
        out.push(item);
    }
    out
}

/// First and last page of the checklist.
fn checklist_pages(
    source: &impl ReportSource,
    start: ChecklistStart,
) -> Result<(u32, u32), ExtractError> {
    let page_count = source.page_count()?;
    let first = match start {
        ChecklistStart::Page(page) => page,
        ChecklistStart::FirstPageContaining(marker) => {
            let mut found = None;
            for page in 1..=page_count {
                if source.page_text(page)?.contains(marker) {
                    found = Some(page);
                    break;
                }
            }
            found.ok_or_else(|| ExtractError::AnchorNotFound {
                anchor: marker.to_string(),
            })?
        }
    };
    Ok((first, page_count))
}

fn overview_position(grid: &TableGrid, anchor: &str) -> Option<usize> {
    let anchor = anchor.to_lowercase();
    grid.rows()
        .iter()
        .position(|row| row.first().is_some_and(|cell| cell.to_lowercase().contains(&anchor)))
}

/// Splits a trailing overview section off the raw checklist.
///
/// Returns the main checklist rows and the overview rows, re-read with the
/// overview region and cut to the checklist width. Without the anchor the
/// grid is returned whole and no overview rows.
fn split_overview(
    source: &impl ReportSource,
    raw: TableGrid,
    hook: &OverviewHook,
    pages: (u32, u32),
) -> (TableGrid, Vec<Vec<String>>) {
    let Some(position) = overview_position(&raw, hook.anchor) else {
        return (raw, Vec::new());
    };

    let width = raw.width();
    let mut main = raw.into_rows();
    main.truncate(position);
    let main = TableGrid::with_width(main, width);

    let overview = match extract_grid_over_pages(source, pages.0, pages.1, &hook.region) {
        Ok(grid) => grid,
        Err(error) => {
            warn!(%error, "report overview could not be re-extracted");
            return (main, Vec::new());
        }
    };
    let Some(start) = overview_position(&overview, hook.anchor) else {
        warn!(anchor = hook.anchor, "report overview anchor missing from overview region");
        return (main, Vec::new());
    };

    let overview_width = overview.width();
    let mut rows = overview.into_rows();
    let rows = rows.split_off(start + 1);
    let cleaned = drop_blank_rows(truncate_columns(
        TableGrid::with_width(rows, overview_width),
        CHECKLIST_COLUMNS.len(),
    ));
    let rows = cleaned
        .into_rows()
        .into_iter()
        .filter(|row| row[0].trim() != NOISE_ROW)
        .collect::<Vec<_>>();
    debug!(rows = rows.len(), "report overview rows appended");
    (main, rows)
}

fn append_rows(grid: TableGrid, rows: Vec<Vec<String>>) -> TableGrid {
    if rows.is_empty() {
        return grid;
    }
    TableGrid::concat([grid, TableGrid::new(rows)])
}

fn apply_step(grid: TableGrid, step: ChecklistStep) -> Result<TableGrid, ExtractError> {
    match step {
        ChecklistStep::Window { start, end } => require_rows_between_anchors(&grid, start, end),
        ChecklistStep::Standardize => standardize_columns(grid),
        ChecklistStep::ContinuationMerge => Ok(merge_continuation_lines(grid)),
        ChecklistStep::CapitalizationMerge { column, new_line } => {
            Ok(merge_rows_by_capitalization_in(grid, column, new_line))
        }
    }
}

/// Extracts the checklist pages and runs the vendor pipeline.
///
/// Overview rows replace the raw rows from the overview anchor on, before
/// any step runs, so the anchor window clips both parts.
pub fn assemble_checklist<S: ReportSource>(
    model: &ReportModel<S>,
    categorize: bool,
) -> Result<InspectionChecklist, ExtractError> {
    let geometry = model.geometry();
    let source = model.source();
    let pages = checklist_pages(source, geometry.checklist_start)?;
    let raw = extract_grid_over_pages(source, pages.0, pages.1, &geometry.checklist_region)?;

    let mut grid = match &geometry.overview {
        Some(hook) => {
            let (main, overview_rows) = split_overview(source, raw, hook, pages);
            append_rows(main, overview_rows)
        }
        None => raw,
    };
    for step in &geometry.checklist_steps {
        grid = apply_step(grid, *step)?;
    }

    let mut items = grid
        .rows()
        .iter()
        .map(|row| ChecklistItem::from_row(row))
        .filter(|item| {
            !(is_blank(&item.item_number) && is_blank(&item.check_item) && is_blank(&item.result))
        })
        .collect::<Vec<_>>();
    if categorize {
        items = categorize_inspection_items(items);
    }

    Ok(InspectionChecklist::new(items, categorize))
}
