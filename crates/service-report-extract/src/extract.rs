use tracing::debug;

use crate::error::ExtractError;
use crate::model::TableGrid;
use crate::options::{ExtractionRegion, PageSpan};
use crate::source::ReportSource;

fn check_page(page: u32, page_count: u32) -> Result<(), ExtractError> {
    if page == 0 || page > page_count {
        return Err(ExtractError::PageOutOfRange { page, page_count });
    }
    Ok(())
}

/// First table detected in `region` on a single page.
pub fn extract_grid(
    source: &impl ReportSource,
    page: u32,
    region: &ExtractionRegion,
) -> Result<TableGrid, ExtractError> {
    region.validate()?;
    check_page(page, source.page_count()?)?;

    source
        .detect_tables(page, region)?
        .into_iter()
        .next()
        .ok_or(ExtractError::NoTableFound { page })
}

/// Extracts `region` from every page in `start..=end` and stacks the rows in
/// page order. A page that fails or holds no table contributes nothing; only
/// a range where every page came back empty is an error.
pub fn extract_grid_over_pages(
    source: &impl ReportSource,
    start: u32,
    end: u32,
    region: &ExtractionRegion,
) -> Result<TableGrid, ExtractError> {
    let span = PageSpan::new(start, end)?;
    region.validate()?;
    let page_count = source.page_count()?;
    check_page(span.start, page_count)?;
    check_page(span.end, page_count)?;

    let mut grids = Vec::new();
    for page in span.pages() {
        match extract_grid(source, page, region) {
            Ok(grid) => grids.push(grid),
            Err(error) => debug!(page, %error, "page contributed no table rows"),
        }
    }

    if grids.is_empty() {
        return Err(ExtractError::NoTableInRange { start, end });
    }
    Ok(TableGrid::concat(grids))
}


#[cfg(test)]
mod tests {
    use super::fake::FakeSource;
    use super::{extract_grid, extract_grid_over_pages};
    use crate::error::ExtractError;
    use crate::options::{ExtractionRegion, Rect};

    fn region() -> ExtractionRegion {
        ExtractionRegion::new(Rect::new(20.0, 730.0, 600.0, 40.0), &[65.0, 450.0], 13.0)
    }

    #[test]
    fn single_page_without_table_is_an_error() {
        let source = FakeSource::with_pages(&["p1", "p2"]);
        let error = extract_grid(&source, 2, &region()).expect_err("no table on page 2");
        assert!(matches!(error, ExtractError::NoTableFound { page: 2 }));
    }

    #[test]
    fn rejects_pages_outside_the_document() {
        let source = FakeSource::with_pages(&["p1"]);
        assert!(matches!(
            extract_grid(&source, 3, &region()),
            Err(ExtractError::PageOutOfRange { page: 3, page_count: 1 })
        ));
        assert!(matches!(
            extract_grid_over_pages(&source, 2, 1, &region()),
            Err(ExtractError::InvalidPageRange { start: 2, end: 1 })
        ));
    }

    #[test]
    fn concatenates_pages_and_skips_empty_or_failing_ones() {
        let mut source = FakeSource::with_pages(&["p1", "p2", "p3", "p4"])
            .table(2, 730.0, &[&["1", "Tower", "OK"]])
            .table(4, 730.0, &[&["2", "Blades", "NOK"]])
            .table(3, 730.0, &[&["x", "never read", ""]]);
        source.failing_pages.push(3);

        let grid = extract_grid_over_pages(&source, 2, 4, &region()).expect("rows from 2 and 4");
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell(0, 1), Some("Tower"));
        assert_eq!(grid.cell(1, 1), Some("Blades"));
    }

    #[test]
    fn all_pages_empty_is_an_error() {
        let source = FakeSource::with_pages(&["p1", "p2", "p3"]);
        assert!(matches!(
            extract_grid_over_pages(&source, 2, 3, &region()),
            Err(ExtractError::NoTableInRange { start: 2, end: 3 })
        ));
    }
}
