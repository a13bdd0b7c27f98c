//! Minimal WordprocessingML package writer.
//!
//! Emits the three parts Word needs to open a document: content types,
//! package relationships and the main document body. Entries carry a fixed
//! timestamp so identical input packs to identical bytes.

use std::fmt::Write as _;
use std::io::{Cursor, Seek, Write};

use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

use crate::export::document::{Paragraph, TextRun};
use crate::export::error::ExportError;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// A4 portrait with 1" margins, in twentieths of a point.
const SECTION_PROPERTIES_XML: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

/// Packs paragraphs into `.docx` bytes.
pub fn pack(paragraphs: &[Paragraph]) -> Result<Vec<u8>, ExportError> {
    Ok(pack_into(paragraphs, Cursor::new(Vec::new()))?.into_inner())
}

/// Writes the package into `writer` and hands it back once the archive is finished.
/// On error whatever reached `writer` is a partial archive and must be discarded.
pub fn pack_into<W: Write + Seek>(paragraphs: &[Paragraph], writer: W) -> Result<W, ExportError> {
    let document_xml = document_xml(paragraphs)?;

    let mut zip = ZipWriter::new(writer);
    for (path, content) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", PACKAGE_RELS_XML),
        ("word/document.xml", document_xml.as_str()),
    ] {
        zip.start_file(path, entry_options())?;
        zip.write_all(content.as_bytes())
            .map_err(|e| ExportError::Encoding(format!("writing {path}: {e}")))?;
    }

    Ok(zip.finish()?)
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

/// Serializes the document body part.
pub fn document_xml(paragraphs: &[Paragraph]) -> Result<String, ExportError> {
    let mut xml = String::with_capacity(1024 + paragraphs.len() * 128);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>"#);
    for paragraph in paragraphs {
        xml.push_str("<w:p>");
        for run in &paragraph.runs {
            write_run(&mut xml, run)?;
        }
        xml.push_str("</w:p>");
    }
    xml.push_str(SECTION_PROPERTIES_XML);
    xml.push_str("</w:body></w:document>");
    Ok(xml)
}

fn write_run(xml: &mut String, run: &TextRun) -> Result<(), ExportError> {
    xml.push_str("<w:r>");

    let size = run.size.half_points();
    if run.bold || size.is_some() {
        xml.push_str("<w:rPr>");
        if run.bold {
            xml.push_str("<w:b/>");
        }
        if let Some(size) = size {
            write!(xml, "<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>")
                .map_err(|e| ExportError::Encoding(e.to_string()))?;
        }
        xml.push_str("</w:rPr>");
    }

    // Line ends pasted from other platforms, and the vertical tab and form
    // feed some editors use as soft breaks, all become `<w:br/>`.
    let text = run
        .text
        .replace("\r\n", "\n")
        .replace(['\r', '\u{0B}', '\u{0C}'], "\n");
    for (i, segment) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        if !segment.is_empty() {
            write!(
                xml,
                "<w:t xml:space=\"preserve\">{}</w:t>",
                escape_xml(segment)
            )
            .map_err(|e| ExportError::Encoding(e.to_string()))?;
        }
    }

    xml.push_str("</w:r>");
    Ok(())
}

/// Escapes markup characters and drops characters XML 1.0 cannot represent.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_char(c) => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}
