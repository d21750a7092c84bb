use crate::model::{TableGrid, TextRun};
use crate::options::ExtractionRegion;

/// A fragment of text already assigned to one column.
#[derive(Debug)]
struct Piece {
    column: usize,
    x: f32,
    y: f32,
    text: String,
}

fn overlap(left: (f32, f32), right: (f32, f32)) -> f32 {
    (left.1.min(right.1) - left.0.max(right.0)).max(0.0)
}

fn column_at(bands: &[(f32, f32)], x: f32) -> Option<usize> {
    bands
        .iter()
        .position(|&(left, right)| x >= left && x < right)
        .or_else(|| {
            bands
                .last()
                .filter(|&&(_, right)| (x - right).abs() < f32::EPSILON)
                .map(|_| bands.len() - 1)
        })
}

fn column_with_largest_overlap(bands: &[(f32, f32)], run: &TextRun) -> Option<usize> {
    if run.width <= 0.0 {
        return column_at(bands, run.x);
    }

    let span = (run.x, run.x_end());
    bands
        .iter()
        .enumerate()
        .map(|(index, &band)| (index, overlap(span, band)))
        .filter(|&(_, shared)| shared > 0.0)
        .max_by(|left, right| left.1.total_cmp(&right.1))
        .map(|(index, _)| index)
}

/// Cuts a run at column boundaries. Glyph positions are interpolated evenly
/// across the run width and each glyph goes to the band holding its centre.
#[allow(clippy::cast_precision_loss)]
fn split_run(bands: &[(f32, f32)], run: &TextRun) -> Vec<Piece> {
    let chars = run.text.chars().collect::<Vec<_>>();
    if chars.is_empty() {
        return Vec::new();
    }
    let advance = run.width / chars.len() as f32;

    let mut pieces: Vec<Piece> = Vec::new();
    for (index, ch) in chars.into_iter().enumerate() {
        let x = run.x + advance * index as f32;
        let Some(column) = column_at(bands, x + advance / 2.0) else {
            continue;
        };
        match pieces.last_mut() {
            Some(piece) if piece.column == column => piece.text.push(ch),
            _ => pieces.push(Piece {
                column,
                x,
                y: run.y,
                text: ch.to_string(),
            }),
        }
    }
    pieces
}

/// Stream-flavour detection over positioned text: no ruling lines, the region
/// supplies the columns and rows come from baseline proximity.
///
/// Returns at most one grid. A region without text yields no table.
pub(crate) fn detect_stream_tables(runs: &[TextRun], region: &ExtractionRegion) -> Vec<TableGrid> {
    let area = region.area;
    let bands = region.column_bands();

    let mut pieces = Vec::new();
    for run in runs {
        if run.text.trim().is_empty() || run.y > area.y1 || run.y < area.y2 {
            continue;
        }
        if run.x_end() < area.x1 || run.x > area.x2 {
            continue;
        }

        if region.split_text {
            pieces.extend(split_run(&bands, run));
        } else if let Some(column) = column_with_largest_overlap(&bands, run) {
            pieces.push(Piece {
                column,
                x: run.x,
                y: run.y,
                text: run.text.clone(),
            });
        }
    }
    pieces.retain(|piece| !piece.text.trim().is_empty());

    if pieces.is_empty() {
        return Vec::new();
    }

    pieces.sort_by(|left, right| right.y.total_cmp(&left.y).then(left.x.total_cmp(&right.x)));

    let mut rows: Vec<Vec<Piece>> = Vec::new();
    let mut row_y = f32::NAN;
    for piece in pieces {
        if rows.is_empty() || (row_y - piece.y).abs() > region.row_tol {
            row_y = piece.y;
            rows.push(Vec::new());
        }
        if let Some(row) = rows.last_mut() {
            row.push(piece);
        }
    }

    let width = region.column_count();
    let grid_rows = rows
        .into_iter()
        .map(|mut row| {
            row.sort_by(|left, right| left.x.total_cmp(&right.x));
            let mut cells = vec![String::new(); width];
            for piece in row {
                let cell = &mut cells[piece.column];
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(piece.text.trim());
            }
            cells
        })
        .collect();

    vec![TableGrid::with_width(grid_rows, width)]
}

#[cfg(test)]
mod tests {
    use super::detect_stream_tables;
    use crate::model::TextRun;
    use crate::options::{ExtractionRegion, Rect};

    fn run(text: &str, x: f32, y: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            x,
            y,
            width: text.chars().count() as f32 * 5.0,
        }
    }

    fn checklist_region(split_text: bool) -> ExtractionRegion {
        ExtractionRegion::new(Rect::new(20.0, 730.0, 600.0, 40.0), &[65.0, 450.0], 13.0)
            .with_split_text(split_text)
    }

    #[test]
    fn groups_rows_by_baseline_tolerance() {
        let runs = vec![
            run("1.1", 25.0, 700.0),
            run("Check oil level", 70.0, 702.0),
            run("OK", 460.0, 700.0),
            run("1.2", 25.0, 680.0),
            run("Check filter", 70.0, 680.0),
        ];

        let tables = detect_stream_tables(&runs, &checklist_region(false));
        assert_eq!(tables.len(), 1);
        let grid = &tables[0];
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.rows()[0], vec!["1.1", "Check oil level", "OK"]);
        assert_eq!(grid.rows()[1], vec!["1.2", "Check filter", ""]);
    }

    #[test]
    fn joins_runs_sharing_a_cell_left_to_right() {
        let runs = vec![run("level", 120.0, 600.0), run("Oil", 70.0, 600.0)];
        let tables = detect_stream_tables(&runs, &checklist_region(false));
        assert_eq!(tables[0].cell(0, 1), Some("Oil level"));
    }

    #[test]
    fn split_text_cuts_runs_crossing_column_boundaries() {
        // 9 glyphs at 5pt: "Key" lands left of 65, "Value" right of it.
        let runs = vec![TextRun {
            text: "Key Value".to_string(),
            x: 45.0,
            y: 500.0,
            width: 45.0,
        }];

        let split = detect_stream_tables(&runs, &checklist_region(true));
        assert_eq!(split[0].rows()[0], vec!["Key", "Value", ""]);

        let whole = detect_stream_tables(&runs, &checklist_region(false));
        assert_eq!(whole[0].rows()[0], vec!["", "Key Value", ""]);
    }

    #[test]
    fn ignores_text_outside_the_area() {
        let runs = vec![run("Header", 25.0, 800.0), run("Footer", 25.0, 20.0)];
        assert!(detect_stream_tables(&runs, &checklist_region(false)).is_empty());
    }
}
