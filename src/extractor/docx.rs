//! DOCX text extraction
//!
//! A .docx is a zip archive; the body lives in `word/document.xml`. Each
//! `<w:p>` paragraph becomes one line built from its `<w:t>` runs.

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

const DOCUMENT_XML: &str = "word/document.xml";

/// Self-closing `<w:p .../>` is matched first so it cannot open a paragraph
fn paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>(.*?)</w:p>")
            .expect("valid paragraph regex")
    })
}

fn run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab/>|<w:br/>|<w:cr/>")
            .expect("valid run regex")
    })
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|[a-z]+);").expect("valid entity regex"))
}

/// Extract paragraph text from DOCX bytes
pub fn extract_text_from_docx(bytes: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Not a valid DOCX (zip) file")?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_XML)
        .with_context(|| format!("DOCX is missing {}", DOCUMENT_XML))?
        .read_to_string(&mut xml)
        .context("Failed to read DOCX document body")?;

    Ok(document_xml_to_text(&xml))
}

/// `word/document.xml` -> one line per paragraph
pub fn document_xml_to_text(xml: &str) -> String {
    paragraph_re()
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1).map(|inner| paragraph_text(inner.as_str())))
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(inner: &str) -> String {
    let mut line = String::new();
    for cap in run_re().captures_iter(inner) {
        match cap.get(1) {
            Some(text) => line.push_str(&decode_entities(text.as_str())),
            None if &cap[0] == "<w:tab/>" => line.push('\t'),
            None => line.push('\n'),
        }
    }
    line
}

/// Decode the predefined XML entities and numeric character references
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    entity_re()
        .replace_all(s, |cap: &regex::Captures| {
            let name = &cap[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = if let Some(hex) = name.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = name.strip_prefix('#') {
                        dec.parse().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| cap[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p w:rsidR="00A1"><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>IN THE HIGH COURT</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Petitioner </w:t></w:r><w:r><w:t>&amp; Others</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>Section</w:t><w:tab/><w:t>420 &lt;IPC&gt;</w:t></w:r></w:p>
<w:sectPr/>
</w:body>
</w:document>"#;

    fn build_docx(xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(b"<Types/>").unwrap();
            zip.start_file(DOCUMENT_XML, options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_document_xml_to_text() {
        let text = document_xml_to_text(BODY);
        assert_eq!(
            text,
            "IN THE HIGH COURT\nPetitioner & Others\nSection\t420 <IPC>"
        );
    }

    #[test]
    fn test_self_closing_paragraph_with_attributes() {
        let xml = r#"<w:body><w:p w:rsidR="00B2"/><w:p><w:r><w:t>First line</w:t></w:r></w:p><w:p w:rsidR="00B3" /><w:p><w:r><w:t>Second line</w:t></w:r></w:p></w:body>"#;
        assert_eq!(document_xml_to_text(xml), "First line\nSecond line");
    }

    #[test]
    fn test_extract_text_from_docx() {
        let bytes = build_docx(BODY);
        let text = extract_text_from_docx(&bytes).unwrap();
        assert!(text.starts_with("IN THE HIGH COURT"));
        assert!(text.contains("Petitioner & Others"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract_text_from_docx(b"plain text").unwrap_err();
        assert!(err.to_string().contains("Not a valid DOCX"));
    }

    #[test]
    fn test_missing_document_xml() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        let err = extract_text_from_docx(&buf.into_inner()).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#8377;500"), "₹500");
        assert_eq!(decode_entities("&#x2014;"), "\u{2014}");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
        assert_eq!(decode_entities("no entities"), "no entities");
    }
}
