use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::ExtractError;

/// Rectangle in PDF points: `(x1, y1)` is the top-left corner, `(x2, y2)` the
/// bottom-right one. The y axis grows upward, so `y1 > y2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x1 && x <= self.x2 && y <= self.y1 && y >= self.y2
    }
}

impl FromStr for Rect {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts = value.split(',').map(str::trim).collect::<Vec<_>>();
        if parts.len() != 4 {
            return Err(format!(
                "invalid area format '{value}', expected exactly 4 coordinates"
            ));
        }

        let mut coords = [0.0_f32; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid coordinate: '{part}'"))?;
        }
        let [x1, y1, x2, y2] = coords;

        if x2 <= x1 || y1 <= y2 {
            return Err("area requires x2>x1 and y1>y2 (top-left, bottom-right)".to_string());
        }

        Ok(Self { x1, y1, x2, y2 })
    }
}

/// Region handed to the table detector: where to look, where the columns
/// split and how close two baselines must be to share a row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRegion {
    pub area: Rect,
    pub columns: Vec<f32>,
    pub row_tol: f32,
    pub split_text: bool,
}

impl ExtractionRegion {
    #[must_use]
    pub fn new(area: Rect, columns: &[f32], row_tol: f32) -> Self {
        Self {
            area,
            columns: columns.to_vec(),
            row_tol,
            split_text: false,
        }
    }

    #[must_use]
    pub fn with_split_text(mut self, split_text: bool) -> Self {
        self.split_text = split_text;
        self
    }

    /// Number of cells per detected row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len() + 1
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        let area = self.area;
        if area.x2 <= area.x1 || area.y1 <= area.y2 {
            return Err(ExtractError::InvalidRegion(format!(
                "area {},{},{},{} is empty",
                area.x1, area.y1, area.x2, area.y2
            )));
        }
        if self.row_tol < 0.0 {
            return Err(ExtractError::InvalidRegion(
                "row tolerance must not be negative".to_string(),
            ));
        }
        if self.columns.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(ExtractError::MalformedGeometry(format!(
                "column boundaries {:?} are not strictly increasing",
                self.columns
            )));
        }
        if self
            .columns
            .iter()
            .any(|&column| column <= area.x1 || column >= area.x2)
        {
            return Err(ExtractError::MalformedGeometry(format!(
                "column boundaries {:?} fall outside x range {}..{}",
                self.columns, area.x1, area.x2
            )));
        }
        Ok(())
    }

    /// Column bands as `(left, right)` pairs covering the whole area width.
    pub(crate) fn column_bands(&self) -> Vec<(f32, f32)> {
        let mut edges = Vec::with_capacity(self.columns.len() + 2);
        edges.push(self.area.x1);
        edges.extend(self.columns.iter().copied());
        edges.push(self.area.x2);
        edges.windows(2).map(|pair| (pair[0], pair[1])).collect()
    }
}

/// Inclusive 1-based page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub start: u32,
    pub end: u32,
}

impl PageSpan {
    pub fn new(start: u32, end: u32) -> Result<Self, ExtractError> {
        if start == 0 || end < start {
            return Err(ExtractError::InvalidPageRange { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn pages(self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl FromStr for PageSpan {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid page number: '{part}'"))
        };

        let (start, end) = match value.split_once('-') {
            Some((start, end)) => (parse(start)?, parse(end)?),
            None => {
                let page = parse(value)?;
                (page, page)
            }
        };

        if start == 0 || end == 0 {
            return Err("pages are 1-based".to_string());
        }
        Self::new(start, end).map_err(|error| error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub include_index: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            include_index: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Annotate checklist rows with their category header.
    pub categorize: bool,
}
