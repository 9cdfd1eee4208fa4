//! WordprocessingML snippets for the generated blocks.

use quick_xml::escape::escape;

use crate::models::VerificationTable;

/// Accent color of the status column.
pub const STATUS_GREEN: &str = "008000";
pub const DARK_BLUE: &str = "003366";
pub const BLUE: &str = "0066CC";

/// Table column width in twentieths of a point (3 × 2 in).
const COLUMN_WIDTH: u32 = 2880;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunStyle<'a> {
    pub bold: bool,
    pub italic: bool,
    pub size_pt: Option<u32>,
    pub color: Option<&'a str>,
}

impl RunStyle<'_> {
    pub fn bold() -> Self {
        RunStyle {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        RunStyle {
            italic: true,
            ..Default::default()
        }
    }

    fn properties(&self) -> String {
        let mut out = String::new();
        if self.bold {
            out.push_str("<w:b/>");
        }
        if self.italic {
            out.push_str("<w:i/>");
        }
        if let Some(color) = self.color {
            out.push_str(&format!(r#"<w:color w:val="{}"/>"#, color));
        }
        if let Some(size) = self.size_pt {
            // sizes are stored in half-points
            out.push_str(&format!(r#"<w:sz w:val="{}"/><w:szCs w:val="{}"/>"#, size * 2, size * 2));
        }
        if out.is_empty() {
            out
        } else {
            format!("<w:rPr>{}</w:rPr>", out)
        }
    }
}

/// One run. Newlines in `text` become `<w:br/>`.
pub fn run(text: &str, style: &RunStyle) -> String {
    let mut out = String::from("<w:r>");
    out.push_str(&style.properties());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        if !line.is_empty() {
            out.push_str(r#"<w:t xml:space="preserve">"#);
            out.push_str(&escape(line));
            out.push_str("</w:t>");
        }
    }
    out.push_str("</w:r>");
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphStyle<'a> {
    pub style_id: Option<&'a str>,
    pub centered: bool,
}

pub fn paragraph(runs: &[String], style: &ParagraphStyle) -> String {
    let mut ppr = String::new();
    if let Some(id) = style.style_id {
        ppr.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, id));
    }
    if style.centered {
        ppr.push_str(r#"<w:jc w:val="center"/>"#);
    }
    let mut out = String::from("<w:p>");
    if !ppr.is_empty() {
        out.push_str("<w:pPr>");
        out.push_str(&ppr);
        out.push_str("</w:pPr>");
    }
    for r in runs {
        out.push_str(r);
    }
    out.push_str("</w:p>");
    out
}

pub fn page_break() -> String {
    r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#.to_string()
}

pub fn heading(text: &str, style_id: &str) -> String {
    paragraph(
        &[run(text, &RunStyle::default())],
        &ParagraphStyle {
            style_id: Some(style_id),
            centered: false,
        },
    )
}

/// Table markup plus the data-row indices whose status cell had no run to color.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMarkup {
    pub xml: String,
    pub uncolored_rows: Vec<usize>,
}

fn cell(text: &str, style: &RunStyle) -> String {
    let content = if text.is_empty() {
        "<w:p/>".to_string()
    } else {
        format!("<w:p>{}</w:p>", run(text, style))
    };
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/></w:tcPr>{}</w:tc>"#,
        COLUMN_WIDTH, content
    )
}

/// Bordered 3-column table: header row, then one row per verification row.
pub fn verification_table(table: &VerificationTable) -> TableMarkup {
    let plain = RunStyle::default();
    let accent = RunStyle {
        color: Some(STATUS_GREEN),
        ..Default::default()
    };
    let border = |side: &str| format!(r#"<w:{} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#, side);

    let mut xml = String::from("<w:tbl><w:tblPr>");
    xml.push_str(r#"<w:tblW w:w="0" w:type="auto"/><w:tblBorders>"#);
    for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        xml.push_str(&border(side));
    }
    xml.push_str(r#"</w:tblBorders><w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/></w:tblPr>"#);
    xml.push_str("<w:tblGrid>");
    for _ in 0..3 {
        xml.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, COLUMN_WIDTH));
    }
    xml.push_str("</w:tblGrid>");

    xml.push_str("<w:tr><w:trPr><w:tblHeader/></w:trPr>");
    for h in &table.header {
        xml.push_str(&cell(h, &plain));
    }
    xml.push_str("</w:tr>");

    let mut uncolored_rows = Vec::new();
    for (i, row) in table.rows.iter().enumerate() {
        if row.status.is_empty() {
            uncolored_rows.push(i);
        }
        xml.push_str("<w:tr>");
        xml.push_str(&cell(&row.indicator, &plain));
        xml.push_str(&cell(&row.value, &plain));
        xml.push_str(&cell(&row.status, &accent));
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    TableMarkup {
        xml,
        uncolored_rows,
    }
}
