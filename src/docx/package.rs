//! Zip-level read/rewrite of a `.docx` package.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{ReportError, Result};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

/// Parts to write instead of (or in addition to) the template's.
#[derive(Debug, Default)]
pub struct PartEdits {
    replaced: HashMap<String, Vec<u8>>,
    added: Vec<(String, Vec<u8>)>,
}

impl PartEdits {
    pub fn replace(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        self.replaced.insert(name.to_string(), data.into());
    }

    pub fn add(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        self.added.push((name.to_string(), data.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.replaced.is_empty() && self.added.is_empty()
    }
}

const STYLES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const STYLES_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

fn insert_before(xml: &str, closing: &str, element: &str) -> String {
    match xml.rfind(closing) {
        Some(idx) => format!("{}{}{}", &xml[..idx], element, &xml[idx..]),
        None => format!("{}{}", xml, element),
    }
}

/// `[Content_Types].xml` with an override for a newly added styles part.
pub fn register_styles_content_type(content_types: &str) -> String {
    if content_types.contains("PartName=\"/word/styles.xml\"") {
        return content_types.to_string();
    }
    let element = format!(
        r#"<Override PartName="/word/styles.xml" ContentType="{}"/>"#,
        STYLES_CONTENT_TYPE
    );
    insert_before(content_types, "</Types>", &element)
}

/// Document relationships with a styles relationship added; `None` input starts a new part.
pub fn add_styles_relationship(rels: Option<&str>) -> String {
    let rels = rels.unwrap_or(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
    ));
    if rels.contains(STYLES_RELATIONSHIP_TYPE) {
        return rels.to_string();
    }
    let mut n = 1;
    while rels.contains(&format!("Id=\"rIdStyles{}\"", n)) {
        n += 1;
    }
    let element = format!(
        r#"<Relationship Id="rIdStyles{}" Type="{}" Target="styles.xml"/>"#,
        n, STYLES_RELATIONSHIP_TYPE
    );
    insert_before(rels, "</Relationships>", &element)
}

/// Read one part as UTF-8 text. `Ok(None)` when the package does not contain it.
pub fn read_text_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(e) => e,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut data = String::new();
    entry
        .read_to_string(&mut data)
        .map_err(|e| ReportError::Template(format!("Read {}: {}", name, e)))?;
    Ok(Some(data))
}

/// Copy `archive` into a new package at `output`, swapping in edited parts.
/// Untouched entries are raw-copied so media stays byte-identical. Returns the number of entries copied.
///
/// The package is written to a temporary sibling first and renamed into place.
pub fn write_package<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    output: &Path,
    edits: &PartEdits,
) -> Result<usize> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let temp_path = output.with_extension("tmp.docx");
    let result = write_entries(archive, &temp_path, edits);
    match result {
        Ok(copied) => {
            std::fs::rename(&temp_path, output)?;
            Ok(copied)
        }
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn write_entries<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    temp_path: &Path,
    edits: &PartEdits,
) -> Result<usize> {
    let out_file = File::create(temp_path)?;
    let mut zip_writer = ZipWriter::new(out_file);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut copied = 0usize;
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        let name = entry.name().replace('\\', "/");
        if let Some(data) = edits.replaced.get(&name) {
            drop(entry);
            zip_writer.start_file(name.as_str(), opts)?;
            zip_writer.write_all(data)?;
        } else {
            zip_writer.raw_copy_file(entry)?;
            copied += 1;
        }
    }
    for (name, data) in &edits.added {
        zip_writer.start_file(name.as_str(), opts)?;
        zip_writer.write_all(data)?;
    }
    zip_writer.finish()?;
    Ok(copied)
}
