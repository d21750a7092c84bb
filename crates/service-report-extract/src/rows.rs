//! Row repair primitives. Every transform takes a grid and returns a new one;
//! vendor pipelines are just an ordered list of these.

use crate::error::ExtractError;
use crate::model::{TableGrid, is_blank};

/// Header row repeated at the top of every checklist page.
pub const NOISE_ROW: &str = "No.";

/// Checklist column names, in order.
pub const CHECKLIST_COLUMNS: [&str; 3] = ["item_number", "check_item", "result"];

fn joined(owner: &str, addition: &str, separator: &str) -> String {
    format!("{owner}{separator}{addition}").trim().to_string()
}

fn first_cell(row: &[String]) -> &str {
    row.first().map_or("", String::as_str)
}

/// Drops rows in which every cell is blank.
#[must_use]
pub fn drop_blank_rows(grid: TableGrid) -> TableGrid {
    let width = grid.width();
    let rows = grid
        .into_rows()
        .into_iter()
        .filter(|row| !row.iter().all(|cell| is_blank(cell)))
        .collect();
    TableGrid::with_width(rows, width)
}

/// Keeps the first `width` columns, padding narrower grids.
#[must_use]
pub fn truncate_columns(grid: TableGrid, width: usize) -> TableGrid {
    let rows = grid
        .into_rows()
        .into_iter()
        .map(|mut row| {
            row.truncate(width);
            row
        })
        .collect();
    TableGrid::with_width(rows, width)
}

/// Unstacks a key/value table laid out as side-by-side column pairs: columns
/// `{0,1}`, `{2,3}`, … become consecutive blocks of one two-column table.
pub fn stack_columns_in_pairs(grid: &TableGrid) -> Result<TableGrid, ExtractError> {
    let width = grid.width();
    if width % 2 != 0 {
        return Err(ExtractError::MalformedGeometry(format!(
            "pair stacking needs an even column count, got {width}"
        )));
    }

    let mut rows = Vec::with_capacity(grid.len() * (width / 2));
    for pair in (0..width).step_by(2) {
        rows.extend(
            grid.rows()
                .iter()
                .map(|row| vec![row[pair].clone(), row[pair + 1].clone()]),
        );
    }

    Ok(drop_blank_rows(TableGrid::with_width(rows, 2)))
}

/// Folds rows with a blank first cell into the nearest earlier row that has
/// one. The continuation's description is appended to the owner's; its result
/// only lands when the owner has none.
#[must_use]
pub fn merge_continuation_lines(grid: TableGrid) -> TableGrid {
    let width = grid.width();
    let mut kept: Vec<Vec<String>> = Vec::with_capacity(grid.len());

    for row in grid.into_rows() {
        if !is_blank(first_cell(&row)) {
            kept.push(row);
            continue;
        }

        let Some(owner) = kept.last_mut() else {
            continue;
        };
        if let (Some(addition), Some(target)) = (row.get(1), owner.get_mut(1)) {
            if !is_blank(addition) {
                *target = joined(target, addition, " ");
            }
        }
        if let (Some(result), Some(target)) = (row.get(2), owner.get_mut(2)) {
            if is_blank(target) && !is_blank(result) {
                *target = result.trim().to_string();
            }
        }
    }

    TableGrid::with_width(kept, width)
}

/// [`merge_rows_by_capitalization_in`] on the first column.
#[must_use]
pub fn merge_rows_by_capitalization(grid: TableGrid, new_line: bool) -> TableGrid {
    merge_rows_by_capitalization_in(grid, 0, new_line)
}

/// Treats a row whose `column` text does not start with an uppercase letter as
/// wrapped text of the previous row. The text is appended to the previous
/// row's `column`, and the next column back-fills the previous row's only when
/// that one is blank.
///
/// Rows with a blank `column` stay where they are and never receive merged
/// text. The first row has nothing to merge into and is always kept.
#[must_use]
pub fn merge_rows_by_capitalization_in(
    grid: TableGrid,
    column: usize,
    new_line: bool,
) -> TableGrid {
    let width = grid.width();
    let separator = if new_line { "\n" } else { " " };
    let mut kept: Vec<Vec<String>> = Vec::with_capacity(grid.len());
    let mut target: Option<usize> = None;

    for row in grid.into_rows() {
        let key = row.get(column).map_or("", |cell| cell.trim());
        let Some(first_char) = key.chars().next() else {
            kept.push(row);
            continue;
        };

        match target {
            Some(index) if !first_char.is_uppercase() => {
                let owner = &mut kept[index];
                owner[column] = joined(&owner[column], key, separator);
                if let (Some(value), Some(slot)) =
                    (row.get(column + 1), owner.get_mut(column + 1))
                {
                    if is_blank(slot) && !is_blank(value) {
                        slot.clone_from(value);
                    }
                }
            }
            _ => {
                target = Some(kept.len());
                kept.push(row);
            }
        }
    }

    TableGrid::with_width(kept, width)
}

/// Locates the rows strictly between the start and end anchors.
///
/// The start anchor must equal the trimmed first cell; the end anchor is the
/// first later row whose first cell contains `end`.
fn anchor_window(grid: &TableGrid, start: &str, end: &str) -> Result<(usize, usize), ExtractError> {
    let rows = grid.rows();
    let start_index = rows
        .iter()
        .position(|row| first_cell(row).trim() == start)
        .ok_or_else(|| ExtractError::AnchorNotFound {
            anchor: start.to_string(),
        })?;
    let end_index = rows[start_index + 1..]
        .iter()
        .position(|row| first_cell(row).contains(end))
        .map(|offset| start_index + 1 + offset)
        .ok_or_else(|| ExtractError::AnchorNotFound {
            anchor: end.to_string(),
        })?;
    Ok((start_index, end_index))
}

/// Rows between two anchors with [`NOISE_ROW`] headers removed. Fails loud
/// when either anchor is missing.
pub fn require_rows_between_anchors(
    grid: &TableGrid,
    start: &str,
    end: &str,
) -> Result<TableGrid, ExtractError> {
    let (start_index, end_index) = anchor_window(grid, start, end)?;
    let rows = grid.rows()[start_index + 1..end_index]
        .iter()
        .filter(|row| first_cell(row).trim() != NOISE_ROW)
        .cloned()
        .collect();
    Ok(TableGrid::with_width(rows, grid.width()))
}

/// Soft variant of [`require_rows_between_anchors`]: a missing anchor returns
/// the grid untouched.
#[must_use]
pub fn filter_rows_between_anchors(grid: TableGrid, start: &str, end: &str) -> TableGrid {
    match require_rows_between_anchors(&grid, start, end) {
        Ok(window) => window,
        Err(_) => grid,
    }
}

/// Checks the checklist arity. Nothing is padded or cut.
pub fn standardize_columns(grid: TableGrid) -> Result<TableGrid, ExtractError> {
    if grid.width() != CHECKLIST_COLUMNS.len() {
        return Err(ExtractError::ColumnCount {
            expected: CHECKLIST_COLUMNS.len(),
            found: grid.width(),
        });
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::{
        filter_rows_between_anchors, merge_continuation_lines, merge_rows_by_capitalization,
        merge_rows_by_capitalization_in, require_rows_between_anchors, stack_columns_in_pairs,
        standardize_columns,
    };
    use crate::error::ExtractError;
    use crate::model::TableGrid;

    #[test]
    fn stacks_pairs_in_column_order() {
        let grid = TableGrid::from_strs(&[
            &["Type", "E-82", "Serial number", "820001"],
            &["Hub height", "108 m", "", ""],
        ]);

        let stacked = stack_columns_in_pairs(&grid).expect("even width");
        assert_eq!(stacked.width(), 2);
        assert_eq!(
            stacked.rows(),
            &[
                vec!["Type", "E-82"],
                vec!["Hub height", "108 m"],
                vec!["Serial number", "820001"],
            ]
        );

        let again = stack_columns_in_pairs(&stacked).expect("still even");
        assert_eq!(again, stacked);
    }

    #[test]
    fn odd_width_pair_stacking_is_malformed() {
        let grid = TableGrid::from_strs(&[&["a", "b", "c"]]);
        assert!(matches!(
            stack_columns_in_pairs(&grid),
            Err(ExtractError::MalformedGeometry(_))
        ));
    }

    #[test]
    fn continuation_rows_fold_into_nearest_owner() {
        let grid = TableGrid::from_strs(&[
            &["", "orphan", "x"],
            &["1", "Check tower", ""],
            &["", "flange bolts", "OK"],
            &["2", "Check blades", "OK"],
            &[" ", "for cracks", "NOK"],
        ]);

        let merged = merge_continuation_lines(grid);
        assert_eq!(
            merged.rows(),
            &[
                vec!["1", "Check tower flange bolts", "OK"],
                vec!["2", "Check blades for cracks", "OK"],
            ]
        );
    }

    #[test]
    fn capitalization_merge_joins_lowercase_rows() {
        let grid = TableGrid::from_strs(&[
            &["continued", "first"],
            &["Order number", ""],
            &["of the converter", "4711"],
            &["", "loose"],
            &["and more", "ignored"],
        ]);

        let merged = merge_rows_by_capitalization(grid.clone(), false);
        assert_eq!(
            merged.rows(),
            &[
                vec!["continued", "first"],
                vec!["Order number of the converter and more", "4711"],
                vec!["", "loose"],
            ]
        );

        let with_newlines = merge_rows_by_capitalization(grid, true);
        assert_eq!(
            with_newlines.cell(1, 0),
            Some("Order number\nof the converter\nand more")
        );
    }

    #[test]
    fn capitalization_merge_on_check_item_column() {
        let grid = TableGrid::from_strs(&[
            &["1.1", "Check oil level", ""],
            &["", "in gearbox", "OK"],
            &["1.2", "Grease bearings", "OK"],
        ]);

        let merged = merge_rows_by_capitalization_in(grid, 1, true);
        assert_eq!(
            merged.rows(),
            &[
                vec!["1.1", "Check oil level\nin gearbox", "OK"],
                vec!["1.2", "Grease bearings", "OK"],
            ]
        );
    }

    #[test]
    fn anchor_window_is_exclusive_and_drops_noise() {
        let grid = TableGrid::from_strs(&[
            &["Header"],
            &["Details"],
            &["No."],
            &["A"],
            &["B"],
            &["Signature of technician"],
            &["Footer"],
        ]);

        let window =
            require_rows_between_anchors(&grid, "Details", "Signature").expect("both anchors");
        assert_eq!(window.rows(), &[vec!["A"], vec!["B"]]);
    }

    #[test]
    fn end_anchor_before_start_is_not_used() {
        let grid = TableGrid::from_strs(&[&["Signature"], &["Details"], &["A"], &["Signature"]]);
        let window = require_rows_between_anchors(&grid, "Details", "Signature").expect("anchors");
        assert_eq!(window.rows(), &[vec!["A"]]);
    }

    #[test]
    fn missing_anchor_soft_and_loud() {
        let grid = TableGrid::from_strs(&[&["Details"], &["A"]]);
        assert_eq!(
            filter_rows_between_anchors(grid.clone(), "Details", "Signature"),
            grid
        );
        assert!(matches!(
            require_rows_between_anchors(&grid, "Details", "Signature"),
            Err(ExtractError::AnchorNotFound { anchor }) if anchor == "Signature"
        ));
    }

    #[test]
    fn standardize_rejects_wrong_arity() {
        let grid = TableGrid::from_strs(&[&["1", "Check", "OK", "extra"]]);
        assert!(matches!(
            standardize_columns(grid),
            Err(ExtractError::ColumnCount { expected: 3, found: 4 })
        ));
        let ok = TableGrid::from_strs(&[&["1", "Check", "OK"]]);
        assert!(standardize_columns(ok).is_ok());
    }
}
