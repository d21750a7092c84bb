use tracing::warn;

use crate::geometry::{FilenamePart, Vendor, VendorGeometry};
use crate::metadata::ReportMetadataRecord;
use crate::source::ReportSource;

const UNKNOWN: &str = "unknown";

/// One report document bound to its vendor layout.
///
/// Order type and master flag are read once when the model is built; the
/// metadata and checklist assemblers derive everything else on demand.
#[derive(Debug)]
pub struct ReportModel<S> {
    source: S,
    geometry: VendorGeometry,
    order_type: Option<String>,
    is_master: bool,
}

impl<S: ReportSource> ReportModel<S> {
    pub fn new(source: S, vendor: Vendor) -> Self {
        let order_type = read_order_type(&source);
        let is_master = is_master_order(order_type.as_deref());
        Self {
            source,
            geometry: vendor.geometry(),
            order_type,
            is_master,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn geometry(&self) -> &VendorGeometry {
        &self.geometry
    }

    pub fn vendor(&self) -> Vendor {
        self.geometry.vendor
    }

    pub fn order_type(&self) -> Option<&str> {
        self.order_type.as_deref()
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    /// Output stem built from the vendor's filename template.
    pub fn filename(&self, metadata: &ReportMetadataRecord) -> String {
        derive_filename(&self.geometry.filename, self.order_type(), metadata)
    }
}

/// First non-empty line of page 1. A page that cannot be read yields `None`.
pub fn read_order_type(source: &impl ReportSource) -> Option<String> {
    match source.page_text(1) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string),
        Err(error) => {
            warn!(%error, "could not read order type from page 1");
            None
        }
    }
}

/// Master and yearly orders carry extra header rows on page 2.
#[must_use]
pub fn is_master_order(order_type: Option<&str>) -> bool {
    order_type.is_some_and(|order_type| {
        order_type.contains("MASTER") || order_type.contains("YEARLY")
    })
}

fn sanitize(part: &str) -> String {
    part.trim()
        .to_lowercase()
        .chars()
        .map(|ch| if ch.is_whitespace() || ch == '/' { '_' } else { ch })
        .collect()
}

#[must_use]
pub fn derive_filename(
    template: &[FilenamePart],
    order_type: Option<&str>,
    metadata: &ReportMetadataRecord,
) -> String {
    template
        .iter()
        .map(|part| {
            let value = match part {
                FilenamePart::Literal(text) => Some(*text),
                FilenamePart::OrderType => order_type,
                FilenamePart::Field(key) => metadata.get(key),
            };
            value
                .filter(|value| !value.trim().is_empty())
                .map_or_else(|| UNKNOWN.to_string(), sanitize)
        })
        .collect::<Vec<_>>()
        .join("_")
}
