use std::collections::BTreeMap;

use encoding_rs::{BIG5, UTF_16BE};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::font_metrics::FontMetrics;
use crate::model::TextRun;

/// Average glyph advance as a fraction of the font size, for fonts whose
/// dictionary carries no widths.
const GLYPH_WIDTH_RATIO: f32 = 0.5;

/// Two runs whose baselines are closer than this share a text line.
const LINE_Y_TOLERANCE: f32 = 2.0;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

pub(crate) fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

pub(crate) fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        let bytes = if bytes.len() > 2 { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();

        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }

        if lower.contains("big5") || lower.contains("eten") {
            let (big5, _, had_errors) = BIG5.decode(bytes);
            if !had_errors && !big5.is_empty() {
                return big5.into_owned();
            }
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn multiply(lhs: &Matrix, rhs: &Matrix) -> Matrix {
    [
        lhs[0] * rhs[0] + lhs[1] * rhs[2],
        lhs[0] * rhs[1] + lhs[1] * rhs[3],
        lhs[2] * rhs[0] + lhs[3] * rhs[2],
        lhs[2] * rhs[1] + lhs[3] * rhs[3],
        lhs[4] * rhs[0] + lhs[5] * rhs[2] + rhs[4],
        lhs[4] * rhs[1] + lhs[5] * rhs[3] + rhs[5],
    ]
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0_f32; N];
    for (slot, operand) in out.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(out)
}

/// Graphics and text state needed to place glyphs on the page.
struct TextCursor<'a> {
    ctm: Matrix,
    saved: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f32,
    leading: f32,
    encoding: Option<&'a str>,
    metrics: Option<&'a FontMetrics>,
    runs: Vec<TextRun>,
}

/// What `Tf` selects: the font's text encoding and its glyph widths.
struct PageFont<'a> {
    encoding: &'a str,
    metrics: Option<FontMetrics>,
}

impl<'a> TextCursor<'a> {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            saved: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 0.0,
            leading: 0.0,
            encoding: None,
            metrics: None,
            runs: Vec::new(),
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    /// Records `text` at the current text position and advances past it.
    /// `advance` is the horizontal displacement in text space units.
    fn show(&mut self, text: String, advance: f32) {
        let device = multiply(&self.text_matrix, &self.ctm);
        let scale_x = (device[0] * device[0] + device[1] * device[1]).sqrt();
        if !text.trim().is_empty() {
            self.runs.push(TextRun {
                text,
                x: device[4],
                y: device[5],
                width: advance * scale_x,
            });
        }
        self.text_matrix = multiply(&translation(advance, 0.0), &self.text_matrix);
    }

    /// Horizontal advance of one string operand. Font widths win, the flat
    /// ratio covers fonts without them.
    #[allow(clippy::cast_precision_loss)]
    fn glyph_advance(&self, bytes: &[u8], decoded: &str) -> f32 {
        match self.metrics.and_then(|metrics| metrics.advance(bytes)) {
            Some(thousandths) => thousandths / 1000.0 * self.font_size,
            None => decoded.chars().count() as f32 * self.font_size * GLYPH_WIDTH_RATIO,
        }
    }

    fn show_string(&mut self, bytes: &[u8]) {
        let text = decode_pdf_bytes(self.encoding, bytes);
        let advance = self.glyph_advance(bytes, &text);
        self.show(text, advance);
    }

    /// `TJ` arrays: strings interleaved with kerning in thousandths of an em.
    /// Large negative kerning reads as a word gap.
    fn show_array(&mut self, items: &[Object]) {
        let mut text = String::new();
        let mut advance = 0.0;
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    let decoded = decode_pdf_bytes(self.encoding, bytes);
                    advance += self.glyph_advance(bytes, &decoded);
                    text.push_str(&decoded);
                }
                other => {
                    if let Some(kerning) = number(other) {
                        advance -= kerning / 1000.0 * self.font_size;
                        if kerning < -100.0 && !text.ends_with(' ') {
                            text.push(' ');
                        }
                    }
                }
            }
        }
        self.show(text, advance);
    }
}

/// Decodes a page content stream into positioned text runs, one per text
/// showing operator.
pub(crate) fn page_runs(document: &Document, page_id: ObjectId) -> Vec<TextRun> {
    let Ok(raw_content) = document.get_page_content(page_id) else {
        return Vec::new();
    };
    let Ok(content) = Content::decode(&raw_content) else {
        return Vec::new();
    };
    let fonts = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| {
            let page_font = PageFont {
                encoding: font.get_font_encoding(),
                metrics: FontMetrics::from_font(document, font),
            };
            (name, page_font)
        })
        .collect::<BTreeMap<Vec<u8>, PageFont<'_>>>();

    let mut cursor = TextCursor::new();
    for operation in &content.operations {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "q" => cursor.saved.push(cursor.ctm),
            "Q" => {
                if let Some(ctm) = cursor.saved.pop() {
                    cursor.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(matrix) = numbers::<6>(operands) {
                    cursor.ctm = multiply(&matrix, &cursor.ctm);
                }
            }
            "BT" => {
                cursor.text_matrix = IDENTITY;
                cursor.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    let font = fonts.get(font_name);
                    cursor.encoding = font.map(|font| font.encoding);
                    cursor.metrics = font.and_then(|font| font.metrics.as_ref());
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    cursor.font_size = size;
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(operands) {
                    cursor.leading = leading;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    cursor.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    cursor.leading = -ty;
                    cursor.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(matrix) = numbers::<6>(operands) {
                    cursor.line_matrix = matrix;
                    cursor.text_matrix = matrix;
                }
            }
            "T*" => cursor.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    cursor.show_string(bytes);
                }
            }
            "'" => {
                cursor.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    cursor.show_string(bytes);
                }
            }
            "\"" => {
                cursor.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    cursor.show_string(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    cursor.show_array(items);
                }
            }
            _ => {}
        }
    }

    cursor.runs
}

/// Groups runs into text lines, top of the page first, left to right within a
/// line.
pub(crate) fn runs_to_text(runs: &[TextRun]) -> String {
    let mut ordered = runs.iter().collect::<Vec<_>>();
    ordered.sort_by(|left, right| right.y.total_cmp(&left.y).then(left.x.total_cmp(&right.x)));

    let mut lines: Vec<(f32, Vec<&TextRun>)> = Vec::new();
    for run in ordered {
        match lines.last_mut() {
            Some((baseline, members)) if (*baseline - run.y).abs() <= LINE_Y_TOLERANCE => {
                members.push(run);
            }
            _ => lines.push((run.y, vec![run])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|left, right| left.x.total_cmp(&right.x));
            members
                .iter()
                .map(|run| run.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use lopdf::{Document, Object, dictionary};

    use super::{
        TextCursor, decode_pdf_bytes, looks_decoding_broken, runs_to_text, split_text_into_pages,
    };
    use crate::font_metrics::FontMetrics;
    use crate::model::TextRun;

    fn run(text: &str, x: f32, y: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            x,
            y,
            width: 10.0,
        }
    }

    #[test]
    fn splits_form_feed_delimited_pages() {
        let pages = split_text_into_pages("p1\u{000C}p2\u{000C}");
        assert_eq!(pages, vec!["p1", "p2"]);
    }

    #[test]
    fn decodes_utf16_with_byte_order_mark() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9];
        assert_eq!(decode_pdf_bytes(Some("Identity-H"), &bytes), "Aé");
    }

    #[test]
    fn flags_replacement_heavy_text_as_broken() {
        assert!(looks_decoding_broken("\u{FFFD}\u{FFFD}ab"));
        assert!(!looks_decoding_broken("Order number 1234"));
    }

    #[test]
    fn orders_lines_top_down_and_runs_left_to_right() {
        let runs = vec![
            run("Service Order:", 40.0, 700.0),
            run("MASTER SERVICE ORDER", 40.0, 780.0),
            run("4711", 140.0, 700.5),
        ];
        assert_eq!(
            runs_to_text(&runs),
            "MASTER SERVICE ORDER\nService Order: 4711"
        );
    }

    #[test]
    fn tracks_text_matrix_and_kerning_gaps() {
        let mut cursor = TextCursor::new();
        cursor.font_size = 10.0;
        cursor.line_matrix = [1.0, 0.0, 0.0, 1.0, 100.0, 500.0];
        cursor.text_matrix = cursor.line_matrix;
        cursor.show_array(&[
            Object::string_literal("Oil"),
            Object::Integer(-250),
            Object::string_literal("level"),
        ]);
        cursor.move_line(0.0, -12.0);
        cursor.show_string(b"OK");

        assert_eq!(cursor.runs.len(), 2);
        assert_eq!(cursor.runs[0].text, "Oil level");
        assert!((cursor.runs[0].x - 100.0).abs() < f32::EPSILON);
        assert!((cursor.runs[1].y - 488.0).abs() < f32::EPSILON);
        assert!(cursor.runs[0].width > 40.0);
    }

    #[test]
    fn font_widths_drive_run_width() {
        let document = Document::with_version("1.5");
        let courier = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        };
        let metrics = FontMetrics::from_font(&document, &courier).expect("courier metrics");

        let mut cursor = TextCursor::new();
        cursor.font_size = 10.0;
        cursor.metrics = Some(&metrics);
        cursor.show_string(b"Signature");
        cursor.show_string(b"OK");

        assert!((cursor.runs[0].width - 54.0).abs() < 1e-3);
        assert!((cursor.runs[1].x - 54.0).abs() < 1e-3);
        assert!((cursor.runs[1].width - 12.0).abs() < 1e-3);
    }
}
