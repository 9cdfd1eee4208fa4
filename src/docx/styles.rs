//! Paragraph style edits on `word/styles.xml`.
//!
//! Heading styles are found by their `w:name` ("heading 1"), which is stable across Word
//! languages; the `w:styleId` ("Heading1", "Titre1", ...) is whatever the template uses.

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct HeadingStyle {
    /// Used only when the template has no style with `name`.
    pub id: &'static str,
    pub name: &'static str,
    pub outline_level: u8,
    pub font: &'static str,
    pub size_pt: u32,
    pub color: &'static str,
}

impl HeadingStyle {
    fn fonts_attributes(&self) -> String {
        format!(r#" w:ascii="{f}" w:hAnsi="{f}" w:cs="{f}""#, f = self.font)
    }

    /// The run properties this style sets, keyed by element name.
    fn run_property_elements(&self) -> [(&'static str, String); 6] {
        [
            ("rFonts", format!("<w:rFonts{}/>", self.fonts_attributes())),
            ("b", "<w:b/>".to_string()),
            ("bCs", "<w:bCs/>".to_string()),
            ("color", format!(r#"<w:color w:val="{}"/>"#, self.color)),
            ("sz", format!(r#"<w:sz w:val="{}"/>"#, self.size_pt * 2)),
            ("szCs", format!(r#"<w:szCs w:val="{}"/>"#, self.size_pt * 2)),
        ]
    }

    fn run_properties(&self) -> String {
        let mut out = String::from("<w:rPr>");
        for (_, element) in self.run_property_elements() {
            out.push_str(&element);
        }
        out.push_str("</w:rPr>");
        out
    }

    fn definition(&self) -> String {
        format!(
            r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:uiPriority w:val="9"/><w:qFormat/><w:pPr><w:keepNext/><w:keepLines/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="{lvl}"/></w:pPr>{rpr}</w:style>"#,
            id = self.id,
            name = self.name,
            lvl = self.outline_level,
            rpr = self.run_properties()
        )
    }
}

/// Used when the template lacks a Heading 1 and nothing asks to restyle it.
pub const HEADING_1_DEFAULT: HeadingStyle = HeadingStyle {
    id: "Heading1",
    name: "heading 1",
    outline_level: 0,
    font: "Arial",
    size_pt: 16,
    color: "000000",
};

pub const HEADING_1_ENHANCED: HeadingStyle = HeadingStyle {
    id: "Heading1",
    name: "heading 1",
    outline_level: 0,
    font: "Arial",
    size_pt: 16,
    color: "003366",
};

pub const HEADING_2_ENHANCED: HeadingStyle = HeadingStyle {
    id: "Heading2",
    name: "heading 2",
    outline_level: 1,
    font: "Arial",
    size_pt: 14,
    color: "0066CC",
};

/// Styles part for packages that ship without one.
pub const MINIMAL_STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    r#"</w:styles>"#
);

/// `w:rPr` child order from the WordprocessingML schema.
const RUN_PROPERTY_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath", "rPrChange",
];

fn style_element_re(id: &str) -> Regex {
    Regex::new(&format!(
        r#"(?s)<w:style\b[^>]*\bw:styleId="{}"[^>]*>.*?</w:style>"#,
        regex::escape(id)
    ))
    .expect("style element regex")
}

fn any_style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<w:style\b[^>]*>.*?</w:style>").expect("style regex"))
}

fn style_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<w:name\s+w:val="([^"]*)""#).expect("style name regex"))
}

fn style_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bw:styleId="([^"]*)""#).expect("style id regex"))
}

fn rpr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<w:rPr>.*?</w:rPr>|<w:rPr/>").expect("rPr regex"))
}

fn font_attribute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\s+w:(?:ascii|hAnsi|cs)="[^"]*""#).expect("font attribute regex"))
}

pub fn has_style(styles_xml: &str, id: &str) -> bool {
    style_element_re(id).is_match(styles_xml)
}

/// Id and span of the style whose `w:name` matches `name`, ignoring ASCII case.
fn find_by_name(styles_xml: &str, name: &str) -> Option<(String, Range<usize>)> {
    any_style_re().find_iter(styles_xml).find_map(|m| {
        let element = m.as_str();
        let open_end = element.find('>')?;
        let style_name = style_name_re().captures(element)?.get(1)?.as_str();
        if !style_name.eq_ignore_ascii_case(name) {
            return None;
        }
        let id = style_id_re().captures(&element[..open_end])?.get(1)?.as_str();
        Some((id.to_string(), m.range()))
    })
}

/// The template's definition of `style`: by name first, then by the default id.
fn locate(styles_xml: &str, style: &HeadingStyle) -> Option<(String, Range<usize>)> {
    find_by_name(styles_xml, style.name).or_else(|| {
        style_element_re(style.id)
            .find(styles_xml)
            .map(|m| (style.id.to_string(), m.range()))
    })
}

fn insert_before_close(styles_xml: &str, element: &str) -> String {
    match styles_xml.rfind("</w:styles>") {
        Some(idx) => format!("{}{}{}", &styles_xml[..idx], element, &styles_xml[idx..]),
        None => format!("{}{}", styles_xml, element),
    }
}

/// Add the style when the template does not define it. Existing definitions win.
/// Returns the styles part and the style id paragraphs should reference.
pub fn ensure_style(styles_xml: &str, style: &HeadingStyle) -> (String, String) {
    match locate(styles_xml, style) {
        Some((id, _)) => (styles_xml.to_string(), id),
        None => (
            insert_before_close(styles_xml, &style.definition()),
            style.id.to_string(),
        ),
    }
}

/// Set the style's font, size, weight and color, keeping its other run properties and
/// its paragraph settings. The style is added when missing.
/// Returns the styles part and the style id paragraphs should reference.
pub fn restyle(styles_xml: &str, style: &HeadingStyle) -> Result<(String, String)> {
    let Some((id, range)) = locate(styles_xml, style) else {
        return Ok((
            insert_before_close(styles_xml, &style.definition()),
            style.id.to_string(),
        ));
    };
    let element = &styles_xml[range.clone()];
    let updated = match rpr_re().find(element) {
        Some(rpr) => {
            let inner = rpr
                .as_str()
                .strip_prefix("<w:rPr>")
                .and_then(|s| s.strip_suffix("</w:rPr>"))
                .unwrap_or("");
            format!(
                "{}<w:rPr>{}</w:rPr>{}",
                &element[..rpr.start()],
                merge_run_properties(inner, style)?,
                &element[rpr.end()..]
            )
        }
        None => {
            let close = element.len() - "</w:style>".len();
            format!("{}{}{}", &element[..close], style.run_properties(), &element[close..])
        }
    };
    let xml = format!(
        "{}{}{}",
        &styles_xml[..range.start],
        updated,
        &styles_xml[range.end..]
    );
    Ok((xml, id))
}

/// Top-level elements of an XML fragment as (local name, markup).
fn child_elements(fragment: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(fragment);
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut name = String::new();
    loop {
        let pos = reader.buffer_position() as usize;
        let event = reader.read_event()?;
        let end = reader.buffer_position() as usize;
        match event {
            Event::Eof => break,
            Event::Start(e) => {
                if depth == 0 {
                    start = pos;
                    name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    out.push((name.clone(), fragment[start..end].to_string()));
                }
            }
            Event::Empty(e) if depth == 0 => {
                let local = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                out.push((local, fragment[pos..end].to_string()));
            }
            _ => {}
        }
    }
    Ok(out)
}

fn order_rank(name: &str) -> usize {
    RUN_PROPERTY_ORDER
        .iter()
        .position(|n| *n == name)
        .unwrap_or(RUN_PROPERTY_ORDER.len() - 1)
}

/// Existing run properties with this style's font, weight, color and size set.
fn merge_run_properties(inner: &str, style: &HeadingStyle) -> Result<String> {
    let mut old_fonts = None;
    let mut children: Vec<(String, String)> = Vec::new();
    for (name, element) in child_elements(inner)? {
        match name.as_str() {
            "rFonts" => old_fonts = Some(element),
            "b" | "bCs" | "color" | "sz" | "szCs" => {}
            _ => children.push((name, element)),
        }
    }
    for (name, element) in style.run_property_elements() {
        let element = match (name, old_fonts.as_deref()) {
            ("rFonts", Some(old)) => {
                let kept = font_attribute_re().replace_all(old, "");
                let rest = kept.strip_prefix("<w:rFonts").unwrap_or("/>");
                format!("<w:rFonts{}{}", style.fonts_attributes(), rest)
            }
            _ => element,
        };
        children.push((name.to_string(), element));
    }
    children.sort_by_key(|(name, _)| order_rank(name));
    Ok(children.into_iter().map(|(_, element)| element).collect())
}
