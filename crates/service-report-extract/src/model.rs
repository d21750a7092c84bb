use serde::Serialize;

/// A positioned piece of text decoded from a page content stream.
///
/// Coordinates are PDF points with the origin at the bottom-left corner of the
/// page; `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

impl TextRun {
    #[must_use]
    pub fn x_end(&self) -> f32 {
        self.x + self.width
    }
}

/// Rows of cell strings with one column count shared by every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableGrid {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl TableGrid {
    /// Builds a grid, padding ragged rows with empty cells up to the widest row.
    #[must_use]
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self::with_width(rows, width)
    }

    #[must_use]
    pub fn with_width(rows: Vec<Vec<String>>, width: usize) -> Self {
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { rows, width }
    }

    /// Convenience for tests and literal geometry: `&[&["a", "b"]]`.
    #[must_use]
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        )
    }

    /// Concatenates grids top to bottom. Narrower grids are padded to the
    /// widest one so the column count stays constant.
    #[must_use]
    pub fn concat(grids: impl IntoIterator<Item = TableGrid>) -> Self {
        let grids = grids.into_iter().collect::<Vec<_>>();
        let width = grids.iter().map(TableGrid::width).max().unwrap_or(0);
        let rows = grids.into_iter().flat_map(|grid| grid.rows).collect();
        Self::with_width(rows, width)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }
}

pub(crate) fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}
