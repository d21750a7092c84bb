use std::path::{Path, PathBuf};

use lopdf::{Document, ObjectId};
use tracing::debug;

use crate::error::ExtractError;
use crate::model::TableGrid;
use crate::options::ExtractionRegion;
use crate::pdf_reader::{looks_decoding_broken, page_runs, runs_to_text, split_text_into_pages};
use crate::table_detect::detect_stream_tables;

/// Page-level access to one report document. Pages are 1-based.
///
/// Everything above this trait is pure data transformation, so tests swap in
/// in-memory sources.
pub trait ReportSource {
    fn page_count(&self) -> Result<u32, ExtractError>;

    fn page_text(&self, page: u32) -> Result<String, ExtractError>;

    /// Detects tables inside `region` on `page`. An empty vector means the
    /// region holds nothing table-like; it is not an error at this level.
    fn detect_tables(
        &self,
        page: u32,
        region: &ExtractionRegion,
    ) -> Result<Vec<TableGrid>, ExtractError>;
}

impl<S: ReportSource + ?Sized> ReportSource for &S {
    fn page_count(&self) -> Result<u32, ExtractError> {
        (**self).page_count()
    }

    fn page_text(&self, page: u32) -> Result<String, ExtractError> {
        (**self).page_text(page)
    }

    fn detect_tables(
        &self,
        page: u32,
        region: &ExtractionRegion,
    ) -> Result<Vec<TableGrid>, ExtractError> {
        (**self).detect_tables(page, region)
    }
}

impl<S: ReportSource + ?Sized> ReportSource for Box<S> {
    fn page_count(&self) -> Result<u32, ExtractError> {
        (**self).page_count()
    }

    fn page_text(&self, page: u32) -> Result<String, ExtractError> {
        (**self).page_text(page)
    }

    fn detect_tables(
        &self,
        page: u32,
        region: &ExtractionRegion,
    ) -> Result<Vec<TableGrid>, ExtractError> {
        (**self).detect_tables(page, region)
    }
}

/// A PDF on disk. Every call loads the document and drops it before
/// returning, so no handle outlives a single read.
#[derive(Debug, Clone)]
pub struct PdfSource {
    path: PathBuf,
}

impl PdfSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document, ExtractError> {
        Ok(Document::load(&self.path)?)
    }

    fn page_id(document: &Document, page: u32) -> Result<ObjectId, ExtractError> {
        let pages = document.get_pages();
        let page_count = u32::try_from(pages.len()).unwrap_or(u32::MAX);
        pages
            .get(&page)
            .copied()
            .ok_or(ExtractError::PageOutOfRange { page, page_count })
    }

    fn fallback_page_text(&self, page: u32) -> Option<String> {
        let text = match pdf_extract::extract_text(&self.path) {
            Ok(text) => text,
            Err(error) => {
                debug!(path = %self.path.display(), ?error, "pdf-extract fallback failed");
                return None;
            }
        };
        let index = usize::try_from(page).ok()?.checked_sub(1)?;
        split_text_into_pages(&text)
            .into_iter()
            .nth(index)
            .filter(|text| !text.trim().is_empty())
    }
}

impl ReportSource for PdfSource {
    fn page_count(&self) -> Result<u32, ExtractError> {
        let document = self.load()?;
        Ok(u32::try_from(document.get_pages().len()).unwrap_or(u32::MAX))
    }

    fn page_text(&self, page: u32) -> Result<String, ExtractError> {
        let document = self.load()?;
        let page_id = Self::page_id(&document, page)?;
        let text = runs_to_text(&page_runs(&document, page_id));
        drop(document);

        if !text.trim().is_empty() && !looks_decoding_broken(&text) {
            return Ok(text);
        }

        debug!(
            page,
            path = %self.path.display(),
            "content stream text unusable, trying pdf-extract"
        );
        match self.fallback_page_text(page) {
            Some(fallback) => Ok(fallback),
            None if text.trim().is_empty() => Err(ExtractError::PdfText(format!(
                "page {page} of '{}' has no extractable text",
                self.path.display()
            ))),
            None => Ok(text),
        }
    }

    fn detect_tables(
        &self,
        page: u32,
        region: &ExtractionRegion,
    ) -> Result<Vec<TableGrid>, ExtractError> {
        let document = self.load()?;
        let page_id = Self::page_id(&document, page)?;
        let runs = page_runs(&document, page_id);
        Ok(detect_stream_tables(&runs, region))
    }
}
