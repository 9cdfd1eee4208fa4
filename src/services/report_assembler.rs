//! Template copy + verification annex.
//!
//! The template package is read once; only the document, styles and (when needed) package
//! bookkeeping parts are rewritten. Everything else is copied through untouched.

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use zip::read::ZipArchive;

use crate::config::{AssemblyMode, CoverPage, ReportConfig, ReportText};
use crate::docx::markup::{self, ParagraphStyle, RunStyle, BLUE, DARK_BLUE};
use crate::docx::package::{
    self, PartEdits, CONTENT_TYPES_PART, CORE_PROPERTIES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART,
    STYLES_PART,
};
use crate::docx::styles::{self, HEADING_1_DEFAULT, HEADING_1_ENHANCED, HEADING_2_ENHANCED};
use crate::docx::{compose, heading_level, Body, BodyPlan, ParagraphEdit};
use crate::error::{ReportError, Result};
use crate::models::VerificationTable;
use crate::types::FinancialTotals;

/// Old title lines are only looked for among the first paragraphs.
const TITLE_SCAN_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyOutcome {
    pub output: PathBuf,
    pub mode: AssemblyMode,
    pub template_paragraphs: usize,
    pub template_drawings: usize,
    pub headings_promoted: usize,
    pub paragraphs_blanked: usize,
    pub data_rows: usize,
    /// Data rows whose status cell kept default formatting.
    pub uncolored_rows: Vec<usize>,
    pub parts_copied: usize,
}

/// Page break, heading, note and table, in that order.
pub fn annex_markup(
    text: &ReportText,
    table: &VerificationTable,
    heading_style: &str,
) -> (String, Vec<usize>) {
    let mut xml = markup::page_break();
    xml.push_str(&markup::heading(&text.heading, heading_style));
    xml.push_str(&markup::paragraph(
        &[markup::run(&text.note, &RunStyle::italic())],
        &ParagraphStyle::default(),
    ));
    let table_markup = markup::verification_table(table);
    xml.push_str(&table_markup.xml);
    (xml, table_markup.uncolored_rows)
}

pub fn cover_markup(cover: &CoverPage) -> String {
    let centered = ParagraphStyle {
        style_id: None,
        centered: true,
    };
    let title = RunStyle {
        bold: true,
        size_pt: Some(24),
        color: Some(DARK_BLUE),
        ..Default::default()
    };
    let subtitle = RunStyle {
        bold: true,
        size_pt: Some(18),
        color: Some(BLUE),
        ..Default::default()
    };
    let bold = RunStyle::bold();

    let mut xml = markup::paragraph(&[markup::run(&cover.title, &title)], &centered);
    xml.push_str(&markup::paragraph(&[markup::run(&cover.subtitle, &subtitle)], &centered));
    xml.push_str(&markup::paragraph(
        &[markup::run("\n\n", &RunStyle::default())],
        &ParagraphStyle::default(),
    ));
    xml.push_str(&markup::paragraph(
        &[
            markup::run(&format!("Localisation : {}\n", cover.location), &bold),
            markup::run(&format!("Promoteur : {}\n", cover.promoter), &bold),
            markup::run(&format!("Date : {}\n", cover.date_text()), &bold),
        ],
        &centered,
    ));
    xml.push_str(&markup::page_break());
    xml
}

/// Heading promotions and title-line blanking for enhance mode.
/// `headings` holds the template's style ids for levels 1 and 2.
fn enhance_edits(
    body: &Body,
    cover: &CoverPage,
    headings: [&str; 2],
    plan: &mut BodyPlan,
) -> (usize, usize) {
    let mut promoted = 0;
    let mut blanked = 0;
    for (n, (idx, p)) in body.paragraphs().enumerate() {
        let mut edit = ParagraphEdit::default();
        if let Some(level) = heading_level(&p.text, p.runs.len()) {
            let id = if level == 1 { headings[0] } else { headings[1] };
            edit.style_id = Some(id.to_string());
            promoted += 1;
        }
        if n < TITLE_SCAN_LIMIT && cover.title_markers.iter().any(|m| p.text.contains(m.as_str())) {
            edit.blank = true;
            blanked += 1;
        }
        if edit != ParagraphEdit::default() {
            plan.edits.insert(idx, edit);
        }
    }
    (promoted, blanked)
}

fn core_modified_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(<dcterms:modified\b[^>]*>)[^<]*(</dcterms:modified>)").expect("core modified regex")
    })
}

fn touch_core_properties(core_xml: &str) -> Option<String> {
    if !core_modified_re().is_match(core_xml) {
        return None;
    }
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let replacement = format!("${{1}}{}${{2}}", now);
    Some(core_modified_re().replace(core_xml, replacement.as_str()).into_owned())
}

/// Copy the template to `config.output_path()` with the verification annex appended.
pub fn assemble_report(config: &ReportConfig, totals: &FinancialTotals) -> Result<AssemblyOutcome> {
    let output = config.output_path();
    assemble(&config.template, &output, config, totals)
}

pub fn assemble(
    template: &Path,
    output: &Path,
    config: &ReportConfig,
    totals: &FinancialTotals,
) -> Result<AssemblyOutcome> {
    if !template.exists() {
        return Err(ReportError::NotFound(template.to_path_buf()));
    }
    let file = File::open(template)?;
    let mut archive = ZipArchive::new(file)?;

    let document_xml = package::read_text_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| ReportError::Template(format!("{} missing from package", DOCUMENT_PART)))?;
    let body = Body::parse(&document_xml)?;
    tracing::debug!(
        template = %template.display(),
        paragraphs = body.paragraph_count(),
        tables = body.table_count(),
        drawings = body.drawing_count(),
        "template scanned"
    );

    let existing_styles = package::read_text_part(&mut archive, STYLES_PART)?;
    let had_styles = existing_styles.is_some();
    let base_styles = existing_styles.unwrap_or_else(|| styles::MINIMAL_STYLES.to_string());

    let mut plan = BodyPlan::default();
    let (styles_xml, heading_1, headings_promoted, paragraphs_blanked) = match config.mode {
        AssemblyMode::Append => {
            let (xml, h1) = styles::ensure_style(&base_styles, &HEADING_1_DEFAULT);
            tracing::debug!(
                heading_1 = %h1,
                added = !styles::has_style(&base_styles, &h1),
                "heading style resolved"
            );
            (xml, h1, 0, 0)
        }
        AssemblyMode::Enhance => {
            let (xml, h1) = styles::restyle(&base_styles, &HEADING_1_ENHANCED)?;
            let (xml, h2) = styles::restyle(&xml, &HEADING_2_ENHANCED)?;
            tracing::debug!(heading_1 = %h1, heading_2 = %h2, "heading styles resolved");
            plan.prefix = Some(cover_markup(&config.cover));
            let (promoted, blanked) =
                enhance_edits(&body, &config.cover, [h1.as_str(), h2.as_str()], &mut plan);
            (xml, h1, promoted, blanked)
        }
    };

    let table = VerificationTable::from_totals(totals, &config.text);
    let (annex, uncolored_rows) = annex_markup(&config.text, &table, &heading_1);
    plan.suffix = annex;
    for row in &uncolored_rows {
        tracing::warn!(row, "status cell has no run to color, default formatting kept");
    }

    let mut edits = PartEdits::default();
    edits.replace(DOCUMENT_PART, compose(&document_xml, &body, &plan));

    if had_styles {
        edits.replace(STYLES_PART, styles_xml);
    } else {
        tracing::info!("template has no styles part, adding one");
        edits.add(STYLES_PART, styles_xml);
        let content_types = package::read_text_part(&mut archive, CONTENT_TYPES_PART)?
            .ok_or_else(|| ReportError::Template(format!("{} missing from package", CONTENT_TYPES_PART)))?;
        edits.replace(CONTENT_TYPES_PART, package::register_styles_content_type(&content_types));
        match package::read_text_part(&mut archive, DOCUMENT_RELS_PART)? {
            Some(rels) => edits.replace(DOCUMENT_RELS_PART, package::add_styles_relationship(Some(&rels))),
            None => edits.add(DOCUMENT_RELS_PART, package::add_styles_relationship(None)),
        }
    }

    if let Some(core) = package::read_text_part(&mut archive, CORE_PROPERTIES_PART)? {
        if let Some(touched) = touch_core_properties(&core) {
            edits.replace(CORE_PROPERTIES_PART, touched);
        }
    }

    let parts_copied = package::write_package(&mut archive, output, &edits)?;
    tracing::info!(output = %output.display(), mode = ?config.mode, "report written");

    Ok(AssemblyOutcome {
        output: output.to_path_buf(),
        mode: config.mode,
        template_paragraphs: body.paragraph_count(),
        template_drawings: body.drawing_count(),
        headings_promoted,
        paragraphs_blanked,
        data_rows: table.rows.len(),
        uncolored_rows,
        parts_copied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annex_is_page_break_heading_note_table() {
        let table = VerificationTable::from_totals(&FinancialTotals::default(), &ReportText::default());
        let (xml, uncolored) = annex_markup(&ReportText::default(), &table, "Heading1");
        assert!(xml.starts_with(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#));
        let heading = xml.find(r#"<w:pStyle w:val="Heading1"/>"#).expect("heading");
        let note = xml.find("<w:i/>").expect("note");
        let tbl = xml.find("<w:tbl>").expect("table");
        assert!(heading < note && note < tbl);
        assert!(xml.ends_with("</w:tbl>"));
        assert!(uncolored.is_empty());
    }

    #[test]
    fn cover_has_titles_info_and_break() {
        let cover = CoverPage {
            date: Some("Février 2026".to_string()),
            ..Default::default()
        };
        let xml = cover_markup(&cover);
        assert!(xml.contains(r#"<w:sz w:val="48"/>"#));
        assert!(xml.contains(r#"<w:sz w:val="36"/>"#));
        assert!(xml.contains("Promoteur : SARL ATLAS AGRO NA"));
        assert!(xml.contains("Date : Février 2026"));
        assert_eq!(xml.matches(r#"<w:jc w:val="center"/>"#).count(), 3);
        assert!(xml.ends_with(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#));
    }

    #[test]
    fn core_modified_timestamp_is_replaced() {
        let core = r#"<cp:coreProperties><dcterms:modified xsi:type="dcterms:W3CDTF">2020-01-01T00:00:00Z</dcterms:modified></cp:coreProperties>"#;
        let out = touch_core_properties(core).expect("modified present");
        assert!(!out.contains("2020-01-01"));
        assert!(out.starts_with(r#"<cp:coreProperties><dcterms:modified xsi:type="dcterms:W3CDTF">"#));
        assert!(touch_core_properties("<cp:coreProperties/>").is_none());
    }

    #[test]
    fn enhance_uses_template_style_ids_and_skips_text_box_anchors() {
        let xml = concat!(
            r#"<w:document xmlns:w="x"><w:body>"#,
            r#"<w:p><w:r><w:drawing><wps:txbx><w:txbxContent><w:p><w:r><w:t>INTRODUCTION</w:t></w:r></w:p>"#,
            r#"</w:txbxContent></wps:txbx></w:drawing></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>PRÉSENTATION</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>1.1. Site</w:t></w:r></w:p>"#,
            r#"</w:body></w:document>"#
        );
        let body = Body::parse(xml).expect("parse");
        let mut plan = BodyPlan::default();
        let (promoted, blanked) =
            enhance_edits(&body, &CoverPage::default(), ["Titre1", "Titre2"], &mut plan);
        assert_eq!((promoted, blanked), (2, 0));
        assert!(!plan.edits.contains_key(&0));
        assert_eq!(plan.edits[&1].style_id.as_deref(), Some("Titre1"));
        assert_eq!(plan.edits[&2].style_id.as_deref(), Some("Titre2"));
    }
}
