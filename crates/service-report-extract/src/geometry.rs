//! Calibrated vendor layouts. Everything vendor specific lives here as data;
//! the report model only interprets it.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

use crate::error::ExtractError;
use crate::options::{ExtractionRegion, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Enercon,
    Vestas,
}

impl Vendor {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enercon => "enercon",
            Self::Vestas => "vestas",
        }
    }

    /// Calibrated layout for this vendor's reports.
    #[must_use]
    pub fn geometry(self) -> VendorGeometry {
        match self {
            Self::Enercon => enercon(),
            Self::Vestas => vestas(),
        }
    }
}

impl Display for Vendor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = ExtractError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enercon" => Ok(Self::Enercon),
            "vestas" => Ok(Self::Vestas),
            _ => Err(ExtractError::UnknownVendor(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTransform {
    PairStack,
    CapitalizationMerge,
}

/// One metadata sub-table read from a fixed page region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSection {
    pub name: &'static str,
    pub page: u32,
    pub region: ExtractionRegion,
    /// Replacement region for master and yearly reports, whose extra header
    /// rows push the section down the page.
    pub master_region: Option<ExtractionRegion>,
    pub transform: SectionTransform,
}

impl RegionSection {
    #[must_use]
    pub fn region_for(&self, is_master: bool) -> &ExtractionRegion {
        match (&self.master_region, is_master) {
            (Some(master), true) => master,
            _ => &self.region,
        }
    }
}

/// A metadata value captured from page text. `pattern` carries one capture
/// group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField {
    pub key: &'static str,
    pub pattern: &'static str,
    /// Joins the non-blank lines of a multi-line capture with `", "`.
    pub multi_line: bool,
}

impl HeaderField {
    const fn line(key: &'static str, pattern: &'static str) -> Self {
        Self {
            key,
            pattern,
            multi_line: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataSource {
    /// Sub-tables on fixed regions, concatenated in order.
    Sections(Vec<RegionSection>),
    /// Regex captures over the text of one page.
    HeaderFields { page: u32, fields: Vec<HeaderField> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistStart {
    Page(u32),
    FirstPageContaining(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistStep {
    /// Fail-loud anchor window.
    Window {
        start: &'static str,
        end: &'static str,
    },
    Standardize,
    ContinuationMerge,
    CapitalizationMerge { column: usize, new_line: bool },
}

/// Trailing "report overview" section appended to the main checklist.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewHook {
    pub anchor: &'static str,
    pub region: ExtractionRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenamePart {
    Field(&'static str),
    Literal(&'static str),
    OrderType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorGeometry {
    pub vendor: Vendor,
    pub metadata: MetadataSource,
    pub checklist_region: ExtractionRegion,
    pub checklist_start: ChecklistStart,
    pub checklist_steps: Vec<ChecklistStep>,
    pub overview: Option<OverviewHook>,
    pub filename: Vec<FilenamePart>,
}

const ENERCON_CHECKLIST_AREA: Rect = Rect::new(20.0, 730.0, 600.0, 40.0);

fn enercon() -> VendorGeometry {
    let master_data = RegionSection {
        name: "converter master data",
        page: 2,
        region: ExtractionRegion::new(
            Rect::new(20.0, 700.0, 600.0, 620.0),
            &[125.0, 290.0, 390.0],
            13.0,
        )
        .with_split_text(true),
        master_region: None,
        transform: SectionTransform::PairStack,
    };

    let details_columns = [198.0];
    let details_on_order = RegionSection {
        name: "details on order",
        page: 2,
        region: ExtractionRegion::new(Rect::new(20.0, 585.0, 600.0, 430.0), &details_columns, 10.0)
            .with_split_text(true),
        master_region: Some(
            ExtractionRegion::new(Rect::new(20.0, 585.0, 600.0, 380.0), &details_columns, 10.0)
                .with_split_text(true),
        ),
        transform: SectionTransform::CapitalizationMerge,
    };

    let defects_columns = [115.0, 155.0, 235.0, 280.0, 330.0];
    let defects_summary = RegionSection {
        name: "defects summary",
        page: 2,
        region: ExtractionRegion::new(Rect::new(20.0, 370.0, 600.0, 340.0), &defects_columns, 13.0)
            .with_split_text(true),
        master_region: Some(
            ExtractionRegion::new(Rect::new(20.0, 305.0, 600.0, 275.0), &defects_columns, 13.0)
                .with_split_text(true),
        ),
        transform: SectionTransform::PairStack,
    };

    VendorGeometry {
        vendor: Vendor::Enercon,
        metadata: MetadataSource::Sections(vec![master_data, details_on_order, defects_summary]),
        checklist_region: ExtractionRegion::new(ENERCON_CHECKLIST_AREA, &[65.0, 450.0], 13.0),
        checklist_start: ChecklistStart::Page(2),
        checklist_steps: vec![
            ChecklistStep::Window {
                start: "Details",
                end: "Signature",
            },
            ChecklistStep::Standardize,
            ChecklistStep::CapitalizationMerge {
                column: 1,
                new_line: true,
            },
        ],
        overview: Some(OverviewHook {
            anchor: "Report overview",
            region: ExtractionRegion::new(ENERCON_CHECKLIST_AREA, &[65.0, 450.0, 520.0], 13.0),
        }),
        filename: vec![
            FilenamePart::Field("Serial number"),
            FilenamePart::Literal("enercon"),
            FilenamePart::OrderType,
            FilenamePart::Field("Order number"),
        ],
    }
}

fn vestas() -> VendorGeometry {
    VendorGeometry {
        vendor: Vendor::Vestas,
        metadata: MetadataSource::HeaderFields {
            page: 1,
            fields: vec![
                HeaderField::line("turbine_number", r"Turbine No\./Id:\s*(\d+)"),
                HeaderField::line("service_order", r"Service Order:\s*(\d+)"),
                HeaderField::line("pad_no", r"PAD No\.\s*([^\n]+)"),
                HeaderField::line("turbine_type", r"Turbine Type:\s*(\w+)"),
                HeaderField::line("start_date", r"Start Date:\s*([\d.]+)"),
                HeaderField::line("end_date", r"End Date:\s*([\d.]+)"),
                HeaderField {
                    key: "customer_address",
                    pattern: r"(?s)Customer's Address:\s*(.*?)Site's Address:",
                    multi_line: true,
                },
                HeaderField::line(
                    "date_and_time_of_receipt",
                    r"Date & Time of Receipt\s*([\d.\s:]+)",
                ),
                HeaderField::line("reason_for_call_out", r"Reason for Call Out:\s*([^\n]+)"),
            ],
        },
        checklist_region: ExtractionRegion::new(
            Rect::new(30.0, 730.0, 600.0, 100.0),
            &[65.0, 330.0],
            13.0,
        )
        .with_split_text(true),
        checklist_start: ChecklistStart::FirstPageContaining("Service Inspection Form"),
        checklist_steps: vec![ChecklistStep::ContinuationMerge, ChecklistStep::Standardize],
        overview: None,
        filename: vec![
            FilenamePart::Field("turbine_number"),
            FilenamePart::Literal("vestas"),
            FilenamePart::Field("service_order"),
            FilenamePart::Field("reason_for_call_out"),
        ],
    }
}
