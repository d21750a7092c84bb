#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Text drawn at an absolute baseline position, in PDF points.
pub type Placed<'a> = (i64, i64, &'a str);

/// Writes a PDF whose pages carry text at the given positions. Courier 10pt
/// with WinAnsi encoding, one text object per page.
pub fn create_report_pdf(
    path: &Path,
    pages: &[Vec<Placed<'_>>],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for placed in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
        ];
        for (x, y, text) in placed {
            operations.push(Operation::new(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), (*x).into(), (*y).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}

/// A regular Enercon report: order type on page 1, header tables and the
/// start of the checklist on page 2, the rest of the checklist on page 3.
pub fn create_enercon_report(
    path: &Path,
    serial_number: &str,
    order_number: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    create_report_pdf(
        path,
        &[
            vec![(40, 800, "REGULAR SERVICE ORDER"), (40, 780, "Wind turbine service")],
            vec![
                (25, 680, "Type"),
                (130, 680, "E-82"),
                (295, 680, "Serial number"),
                (395, 680, serial_number),
                (25, 560, "Order number"),
                (205, 560, order_number),
                (25, 540, "Completion date"),
                (205, 540, "12.05.2023"),
                (25, 355, "Defects"),
                (120, 355, "0"),
                (25, 300, "Details"),
                (25, 280, "1.1"),
                (70, 280, "Check tower flange"),
                (460, 280, "OK"),
            ],
            vec![
                (25, 700, "1.2"),
                (70, 700, "Check blades"),
                (70, 686, "for cracks"),
                (460, 686, "NOK"),
                (25, 600, "Signature"),
            ],
        ],
    )
}

/// A Vestas report: header fields on page 1, checklist from page 2.
pub fn create_vestas_report(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    create_report_pdf(
        path,
        &[
            vec![
                (40, 800, "SERVICE REPORT"),
                (40, 780, "Turbine No./Id: 21187"),
                (40, 760, "Service Order: 5502311"),
                (40, 740, "Turbine Type: V112"),
                (40, 720, "End Date: 04.05.2023"),
                (40, 700, "Customer's Address:"),
                (40, 680, "Windpark Nord GmbH"),
                (40, 660, "Site's Address:"),
                (40, 640, "Reason for Call Out: Annual service"),
            ],
            vec![
                (40, 780, "Service Inspection Form"),
                (35, 700, "10"),
                (70, 700, "Check nacelle"),
                (340, 700, "OK"),
                (70, 686, "cover bolts"),
                (35, 660, "11"),
                (70, 660, "Check hub"),
                (340, 660, "Done"),
            ],
        ],
    )
}
