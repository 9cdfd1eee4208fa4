#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

/// Statement sheet with a header row, then (label, value) rows in columns A and C.
pub fn write_statement(path: &Path, sheet: &str, rows: &[(&str, Option<f64>)]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).expect("sheet name");
    worksheet.write_string(0, 0, "LIBELLE").expect("header");
    worksheet.write_string(0, 1, "Année 1").expect("header");
    worksheet.write_string(0, 2, "Année 2").expect("header");
    for (i, (label, value)) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, *label).expect("label");
        worksheet.write_number(row, 1, 1.0).expect("year 1");
        if let Some(v) = value {
            worksheet.write_number(row, 2, *v).expect("value");
        }
    }
    workbook.save(path).expect("save workbook");
}

pub fn full_statement() -> Vec<(&'static str, Option<f64>)> {
    vec![
        ("I-PRODUCTION DE L'EXERCICE", Some(245.8)),
        ("Achats consommés", Some(40.0)),
        ("II-CONSOMMATION DE L'EXERCICE", Some(61.2)),
        ("III-VALEUR AJOUTEE D'EXPLOITATION (I-II)", Some(184.6)),
        ("Charges de personnel", Some(38.4)),
        ("IV-EXCEDENT BRUT D'EXPLOITATION", Some(146.2)),
        ("Dotations aux amortissements et pertes de valeur", Some(22.5)),
        ("V- RESULTAT OPERATIONNEL", Some(123.7)),
        ("Charges financières", Some(9.3)),
        ("X-RESULTAT NET DE L'EXERCICE", Some(92.4)),
    ]
}

const NS: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#
);

pub enum TemplateBlock {
    Text(&'static str),
    Image,
    Table,
}

fn paragraph(text: &str) -> String {
    format!(
        r#"<w:p w:rsidR="00A1"><w:pPr><w:spacing w:after="120"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        text
    )
}

fn image_paragraph() -> String {
    concat!(
        r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
        r#"<wp:extent cx="914400" cy="914400"/><wp:docPr id="1" name="Picture 1"/>"#,
        r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
        r#"<pic:pic><pic:blipFill><a:blip r:embed="rIdImg1"/></pic:blipFill></pic:pic>"#,
        r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
    )
    .to_string()
}

fn table() -> String {
    r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid><w:gridCol w:w="4000"/></w:tblGrid><w:tr><w:tc><w:p><w:r><w:t>Surface</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#.to_string()
}

pub fn document_xml(blocks: &[TemplateBlock]) -> String {
    let mut body = String::new();
    for b in blocks {
        body.push_str(&match b {
            TemplateBlock::Text(t) => paragraph(t),
            TemplateBlock::Image => image_paragraph(),
            TemplateBlock::Table => table(),
        });
        body.push('\n');
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:document {}><w:body>\n{}<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/></w:sectPr></w:body></w:document>",
        NS, body
    )
}

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Default Extension="png" ContentType="image/png"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    r#"</Types>"#
);

const CONTENT_TYPE_STYLES: &str = r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#;

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"</Relationships>"#
);

const DOCUMENT_RELS_HEAD: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rIdImg1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>"#
);

const STYLES_REL: &str = r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#;

pub const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style>"#,
    r#"</w:styles>"#
);

/// Styles of a French Word install: built-in headings carry localized ids.
pub const FRENCH_STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Titre1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/><w:lang w:val="fr-FR"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Titre2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style>"#,
    r#"</w:styles>"#
);

const CORE: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    r#"<dcterms:modified xsi:type="dcterms:W3CDTF">2026-02-01T10:00:00Z</dcterms:modified>"#,
    r#"</cp:coreProperties>"#
);

/// Minimal but complete .docx: document, optional styles, one PNG, core properties.
pub fn write_template(path: &Path, blocks: &[TemplateBlock], styles: Option<&str>) {
    let file = File::create(path).expect("create template");
    let mut zip = ZipWriter::new(file);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let content_types = if styles.is_some() {
        CONTENT_TYPES.replace("</Types>", &format!("{}</Types>", CONTENT_TYPE_STYLES))
    } else {
        CONTENT_TYPES.to_string()
    };
    let document_rels = format!(
        "{}{}</Relationships>",
        DOCUMENT_RELS_HEAD,
        if styles.is_some() { STYLES_REL } else { "" }
    );

    let mut entries: Vec<(&str, Vec<u8>, SimpleFileOptions)> = vec![
        ("[Content_Types].xml", content_types.into_bytes(), opts),
        ("_rels/.rels", ROOT_RELS.as_bytes().to_vec(), opts),
        ("word/document.xml", document_xml(blocks).into_bytes(), opts),
        ("word/_rels/document.xml.rels", document_rels.into_bytes(), opts),
        ("word/media/image1.png", PNG_BYTES.to_vec(), stored),
        ("docProps/core.xml", CORE.as_bytes().to_vec(), opts),
    ];
    if let Some(styles) = styles {
        entries.push(("word/styles.xml", styles.as_bytes().to_vec(), opts));
    }
    for (name, data, o) in entries {
        zip.start_file(name, o).expect("start entry");
        zip.write_all(&data).expect("write entry");
    }
    zip.finish().expect("finish template");
}

pub fn read_part(path: &Path, name: &str) -> Option<Vec<u8>> {
    let mut archive = ZipArchive::new(File::open(path).expect("open docx")).expect("zip");
    let mut entry = archive.by_name(name).ok()?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data).expect("read entry");
    Some(data)
}

pub fn read_text(path: &Path, name: &str) -> String {
    String::from_utf8(read_part(path, name).expect("part present")).expect("utf-8 part")
}

/// The last table in the document (the appended annex).
pub fn last_table(document: &str) -> &str {
    let start = document.rfind("<w:tbl>").expect("a table");
    let end = document[start..].find("</w:tbl>").expect("table end") + start + "</w:tbl>".len();
    &document[start..end]
}
