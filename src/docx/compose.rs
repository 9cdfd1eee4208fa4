//! Rebuild `word/document.xml` from scanned blocks plus inserted markup.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::body::{BlockKind, Body, ParagraphInfo};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphEdit {
    pub style_id: Option<String>,
    /// Drop text runs; paragraph properties and drawing runs stay.
    pub blank: bool,
}

#[derive(Debug, Default)]
pub struct BodyPlan {
    /// Inserted before the first body paragraph.
    pub prefix: Option<String>,
    /// Keyed by block index.
    pub edits: BTreeMap<usize, ParagraphEdit>,
    /// Inserted before the final section properties.
    pub suffix: String,
}

/// Heading level a paragraph should take, from its plain text.
///
/// Upper-case lines under 60 characters become level 1. Numbered lines under 80 characters
/// with a dot in the first four characters become level 2 for "1.1"-style numbers, else level 1.
pub fn heading_level(text: &str, run_count: usize) -> Option<u8> {
    let text = text.trim();
    let chars: Vec<char> = text.chars().collect();
    let first = *chars.first()?;

    if is_upper(text) && chars.len() < 60 && run_count > 0 {
        return Some(1);
    }
    if first.is_ascii_digit() && chars.len() < 80 && chars.iter().take(4).any(|&c| c == '.') {
        let first_word = text.split_whitespace().next().unwrap_or("");
        let sub_numbered = first_word.matches('.').count() > 1 || chars.get(2) == Some(&'.');
        return Some(if sub_numbered { 2 } else { 1 });
    }
    None
}

/// At least one cased character and no lower-case ones.
fn is_upper(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

fn pstyle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<w:pStyle\b[^>]*/>").expect("pStyle regex"))
}

fn ppr_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<w:pPr\b[^>]*>").expect("pPr open regex"))
}

/// Paragraph properties with the style set. `<w:pStyle>` must be the first child.
fn properties_with_style(existing: Option<&str>, style_id: &str) -> String {
    let pstyle = format!(r#"<w:pStyle w:val="{}"/>"#, style_id);
    let Some(ppr) = existing else {
        return format!("<w:pPr>{}</w:pPr>", pstyle);
    };
    if pstyle_re().is_match(ppr) {
        return pstyle_re().replace(ppr, pstyle.as_str()).into_owned();
    }
    if ppr.ends_with("/>") {
        return format!("<w:pPr>{}</w:pPr>", pstyle);
    }
    match ppr_open_re().find(ppr) {
        Some(open) => format!("{}{}{}", open.as_str(), pstyle, &ppr[open.end()..]),
        None => ppr.to_string(),
    }
}

fn open_tag(xml: &str, p: &ParagraphInfo) -> String {
    let tag = &xml[p.open_tag.clone()];
    if p.self_closing {
        format!("{}>", tag.trim_end_matches("/>").trim_end())
    } else {
        tag.to_string()
    }
}

fn render_paragraph(xml: &str, p: &ParagraphInfo, edit: &ParagraphEdit) -> String {
    let ppr_text = p.properties.clone().map(|r| &xml[r]);
    let ppr = match &edit.style_id {
        Some(id) => properties_with_style(ppr_text, id),
        None => ppr_text.unwrap_or_default().to_string(),
    };

    let mut out = open_tag(xml, p);
    if edit.blank || p.self_closing {
        out.push_str(&ppr);
        for r in p.runs.iter().filter(|r| r.has_drawing && edit.blank) {
            out.push_str(&xml[r.span.clone()]);
        }
        out.push_str("</w:p>");
        return out;
    }
    let end = p.open_tag.end;
    match p.properties.clone() {
        Some(r) => {
            out.push_str(&xml[end..r.start]);
            out.push_str(&ppr);
            out.push_str(&xml[r.end..]);
        }
        None => {
            out.push_str(&ppr);
            out.push_str(&xml[end..]);
        }
    }
    out
}

/// Apply `plan` to `xml`, whose body was scanned into `body`.
pub fn compose(xml: &str, body: &Body, plan: &BodyPlan) -> String {
    let prefix_at = body
        .paragraphs()
        .next()
        .map(|(i, _)| body.blocks[i].span.start)
        .unwrap_or_else(|| body.append_position());
    let suffix_at = body.append_position();

    let mut out = String::with_capacity(xml.len() + plan.suffix.len() + 4096);
    let mut cursor = 0usize;
    let emit_until = |out: &mut String, cursor: &mut usize, at: usize| {
        out.push_str(&xml[*cursor..at]);
        *cursor = at;
    };

    for (i, block) in body.blocks.iter().enumerate() {
        if block.span.start == prefix_at {
            emit_until(&mut out, &mut cursor, prefix_at);
            if let Some(prefix) = &plan.prefix {
                out.push_str(prefix);
            }
        }
        if block.span.start == suffix_at {
            emit_until(&mut out, &mut cursor, suffix_at);
            out.push_str(&plan.suffix);
        }
        if let (Some(edit), BlockKind::Paragraph(p)) = (plan.edits.get(&i), &block.kind) {
            emit_until(&mut out, &mut cursor, block.span.start);
            let paragraph_xml = &xml[..block.span.end];
            out.push_str(&render_paragraph(paragraph_xml, p, edit));
            cursor = block.span.end;
        }
    }
    if suffix_at == body.content.end {
        emit_until(&mut out, &mut cursor, suffix_at);
        if prefix_at == suffix_at {
            if let Some(prefix) = &plan.prefix {
                out.push_str(prefix);
            }
        }
        out.push_str(&plan.suffix);
    }
    out.push_str(&xml[cursor..]);
    out
}
