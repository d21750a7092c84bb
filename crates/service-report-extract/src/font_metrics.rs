use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object};

/// Every glyph of the standard Courier faces is 600 units wide.
const COURIER_WIDTH: f32 = 600.0;

/// `/DW` when a CID font leaves it out.
const CID_DEFAULT_WIDTH: f32 = 1000.0;

/// Glyph widths of one font, in thousandths of text space units.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FontMetrics {
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: BTreeMap<u32, f32>,
    default_width: Option<f32>,
    two_byte: bool,
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    document.dereference(object).ok().map(|(_, object)| object)
}

fn deref_key<'a>(
    document: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dict.get_deref(key, document).ok()
}

fn float(document: &Document, object: &Object) -> Option<f32> {
    resolve(document, object)?.as_float().ok()
}

fn code(document: &Document, object: &Object) -> Option<u32> {
    u32::try_from(resolve(document, object)?.as_i64().ok()?).ok()
}

/// Parses a `/W` array: `c [w1 w2 ...]` and `c_first c_last w` entries.
fn cid_widths(document: &Document, entries: &[Object]) -> BTreeMap<u32, f32> {
    let mut widths = BTreeMap::new();
    let mut index = 0;
    while index + 1 < entries.len() {
        let Some(first) = code(document, &entries[index]) else {
            break;
        };
        match resolve(document, &entries[index + 1]) {
            Some(Object::Array(run)) => {
                for (offset, width) in (0_u32..).zip(run) {
                    if let Some(width) = float(document, width) {
                        widths.insert(first + offset, width);
                    }
                }
                index += 2;
            }
            Some(_) => {
                let last = code(document, &entries[index + 1]);
                let width = entries.get(index + 2).and_then(|width| float(document, width));
                if let (Some(last), Some(width)) = (last, width) {
                    for cid in first..=last {
                        widths.insert(cid, width);
                    }
                }
                index += 3;
            }
            None => break,
        }
    }
    widths
}

impl FontMetrics {
    /// Reads `/Widths` and `/FirstChar` of a simple font, or `/DW` and `/W`
    /// of a Type 0 font's descendant. Returns `None` when the font carries no
    /// usable widths.
    pub(crate) fn from_font(document: &Document, font: &Dictionary) -> Option<Self> {
        let subtype =
            deref_key(document, font, b"Subtype").and_then(|object| object.as_name().ok());
        if subtype == Some(b"Type0".as_slice()) {
            return Self::from_type0(document, font);
        }

        let base_font = deref_key(document, font, b"BaseFont")
            .and_then(|object| object.as_name_str().ok())
            .unwrap_or_default();
        let missing_width = deref_key(document, font, b"FontDescriptor")
            .and_then(|object| object.as_dict().ok())
            .and_then(|descriptor| deref_key(document, descriptor, b"MissingWidth"))
            .and_then(|object| object.as_float().ok())
            .filter(|width| *width > 0.0);
        let default_width =
            missing_width.or_else(|| base_font.contains("Courier").then_some(COURIER_WIDTH));

        let widths = deref_key(document, font, b"Widths")
            .and_then(|object| object.as_array().ok())
            .map(|widths| {
                widths
                    .iter()
                    .map(|width| float(document, width).unwrap_or(0.0))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if widths.is_empty() && default_width.is_none() {
            return None;
        }

        Some(Self {
            first_char: deref_key(document, font, b"FirstChar")
                .and_then(|object| code(document, object))
                .unwrap_or(0),
            widths,
            default_width,
            ..Self::default()
        })
    }

    fn from_type0(document: &Document, font: &Dictionary) -> Option<Self> {
        let descendant = deref_key(document, font, b"DescendantFonts")
            .and_then(|object| object.as_array().ok())
            .and_then(|fonts| fonts.first())
            .and_then(|object| resolve(document, object))
            .and_then(|object| object.as_dict().ok())?;

        let default_width = deref_key(document, descendant, b"DW")
            .and_then(|object| object.as_float().ok())
            .unwrap_or(CID_DEFAULT_WIDTH);
        let widths = deref_key(document, descendant, b"W")
            .and_then(|object| object.as_array().ok())
            .map(|entries| cid_widths(document, entries))
            .unwrap_or_default();

        Some(Self {
            cid_widths: widths,
            default_width: Some(default_width),
            two_byte: true,
            ..Self::default()
        })
    }

    fn simple_width(&self, code: u32) -> Option<f32> {
        code.checked_sub(self.first_char)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.widths.get(index))
            .copied()
            .filter(|width| *width > 0.0)
            .or(self.default_width)
    }

    /// Summed width of the glyphs a string operand selects. `None` when a
    /// glyph has no known width.
    pub(crate) fn advance(&self, bytes: &[u8]) -> Option<f32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| {
                    let cid = pair
                        .iter()
                        .fold(0_u32, |cid, byte| (cid << 8) | u32::from(*byte));
                    self.cid_widths.get(&cid).copied().or(self.default_width)
                })
                .sum()
        } else {
            bytes.iter().map(|byte| self.simple_width(u32::from(*byte))).sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{Document, Object, dictionary};

    use super::FontMetrics;

    #[test]
    fn simple_font_widths_start_at_first_char() {
        let document = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "Arial",
            "FirstChar" => 65,
            "Widths" => vec![Object::Integer(667), Object::Integer(667), Object::Real(722.0)],
        };

        let metrics = FontMetrics::from_font(&document, &font).expect("widths present");
        assert_eq!(metrics.advance(b"ABC"), Some(2056.0));
        assert_eq!(metrics.advance(b"AZ"), None);
    }

    #[test]
    fn courier_without_widths_is_monospaced() {
        let document = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        };

        let metrics = FontMetrics::from_font(&document, &font).expect("courier is known");
        assert_eq!(metrics.advance(b"Signature"), Some(5400.0));
    }

    #[test]
    fn standard_proportional_font_without_widths_is_unknown() {
        let document = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        };
        assert_eq!(FontMetrics::from_font(&document, &font), None);
    }

    #[test]
    fn type0_font_reads_both_w_entry_forms() {
        let mut document = Document::with_version("1.5");
        let descendant = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "DW" => 500,
            "W" => vec![
                Object::Integer(3),
                Object::Array(vec![Object::Integer(250), Object::Integer(300)]),
                Object::Integer(10),
                Object::Integer(12),
                Object::Integer(700),
            ],
        });
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
        };

        let metrics = FontMetrics::from_font(&document, &font).expect("descendant present");
        assert_eq!(metrics.advance(&[0, 3, 0, 4]), Some(550.0));
        assert_eq!(metrics.advance(&[0, 11]), Some(700.0));
        assert_eq!(metrics.advance(&[0, 99]), Some(500.0));
    }
}
