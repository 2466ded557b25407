//! XFDL form loader
//!
//! XFDL files come in three shapes:
//! - a `application/vnd.xfdl; content-encoding="base64-gzip"` header line
//!   followed by base64 of a gzipped XML document (what the forms viewer saves)
//! - a raw gzip stream of the XML
//! - plain XML
//!
//! The global page carries the form title and version; the first two `page`
//! elements are the front and back of the form.

use super::loader::{has_extension, DocumentLoader};
use super::xml::parse_document;
use crate::config::DocumentTypeMarker;
use crate::error::LoadError;
use crate::types::FormDocument;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const XFDL_MIME_PREFIX: &[u8] = b"application/vnd.xfdl";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub struct FormLoader {
    document_types: Vec<DocumentTypeMarker>,
}

impl FormLoader {
    pub fn new(document_types: Vec<DocumentTypeMarker>) -> Self {
        Self { document_types }
    }

    fn document_type_for(&self, title: &str) -> Option<&str> {
        self.document_types
            .iter()
            .find(|m| title.contains(&m.marker))
            .map(|m| m.document_type.as_str())
    }
}

impl DocumentLoader for FormLoader {
    type Output = FormDocument;

    fn decode_to_markup(&self, bytes: &[u8]) -> Result<String, LoadError> {
        if bytes.starts_with(XFDL_MIME_PREFIX) {
            let split = bytes
                .iter()
                .position(|b| *b == b'\n')
                .ok_or_else(|| LoadError::Decode("XFDL header without content".to_string()))?;
            let header = String::from_utf8_lossy(&bytes[..split]).to_ascii_lowercase();
            if !header.contains("base64") {
                return Err(LoadError::WrongFormat(format!(
                    "unsupported XFDL content encoding: {}",
                    header.trim()
                )));
            }

            let encoded: Vec<u8> = bytes[split + 1..]
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            let decoded = STANDARD
                .decode(&encoded)
                .map_err(|e| LoadError::Decode(format!("base64: {e}")))?;
            debug!(bytes = decoded.len(), "decoded base64 XFDL body");

            if header.contains("gzip") {
                gunzip(&decoded)
            } else {
                utf8(decoded)
            }
        } else if bytes.starts_with(&GZIP_MAGIC) {
            gunzip(bytes)
        } else {
            utf8(bytes.to_vec())
        }
    }

    fn parse_markup(&self, markup: &str) -> Result<FormDocument, LoadError> {
        let root = parse_document(markup)?;

        let globalpage = root
            .first_descendant("globalpage")
            .ok_or_else(|| LoadError::MissingPart("globalpage".to_string()))?;
        let title = globalpage
            .first_descendant("title")
            .ok_or_else(|| LoadError::MissingPart("form title".to_string()))?
            .text();
        let version = globalpage
            .first_descendant("custom:date")
            .ok_or_else(|| LoadError::MissingPart("form version (custom:date)".to_string()))?
            .text();

        let document_type = self
            .document_type_for(&title)
            .ok_or_else(|| LoadError::UnknownDocumentType(title.clone()))?
            .to_string();

        let mut pages = root.descendants("page").into_iter();
        let (page1, page2) = match (pages.next(), pages.next()) {
            (Some(p1), Some(p2)) => (p1.clone(), p2.clone()),
            _ => return Err(LoadError::MissingPart("second page".to_string())),
        };

        debug!(%document_type, %version, "loaded form");
        Ok(FormDocument {
            title,
            document_type,
            version,
            page1,
            page2,
        })
    }

    fn name(&self) -> &str {
        "XfdlFormLoader"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, "xfdl") || has_extension(path, "xml")
    }
}

fn gunzip(bytes: &[u8]) -> Result<String, LoadError> {
    let mut xml = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut xml)
        .map_err(|e| {
            LoadError::Decode(format!(
                "gzip: {e}. It may be an outdated form version"
            ))
        })?;
    Ok(xml)
}

fn utf8(bytes: Vec<u8>) -> Result<String, LoadError> {
    String::from_utf8(bytes).map_err(|e| LoadError::Decode(format!("not UTF-8 text: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckConfig;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const FORM_XML: &str = r#"<?xml version="1.0"?>
<XFDL xmlns:custom="http://www.PureEdge.com/XFDL/Custom">
  <globalpage sid="global">
    <global sid="global">
      <title>OFFICER PERFORMANCE REPORT (Officer)</title>
      <custom:date>2.79.9</custom:date>
    </global>
  </globalpage>
  <page sid="PAGE1"><field sid="NAME"><value>DOE JOHN</value></field></page>
  <page sid="PAGE2"><field sid="SR"><value>Excellent</value></field></page>
</XFDL>"#;

    fn loader() -> FormLoader {
        FormLoader::new(CheckConfig::default().document_types)
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_xml_form() {
        let form = loader().load(FORM_XML.as_bytes()).unwrap();
        assert_eq!(form.document_type, "OPR");
        assert_eq!(form.version, "2.79.9");
        assert_eq!(form.page1.attr("sid"), Some("PAGE1"));
        assert_eq!(form.page2.attr("sid"), Some("PAGE2"));
    }

    #[test]
    fn test_base64_gzip_form() {
        let mut encoded = STANDARD.encode(gzip(FORM_XML.as_bytes()));
        // The viewer wraps base64 at 76 columns
        encoded.insert(40, '\n');
        let file = format!(
            "application/vnd.xfdl; content-encoding=\"base64-gzip\"\n{encoded}\n"
        );
        let form = loader().load(file.as_bytes()).unwrap();
        assert_eq!(form.document_type, "OPR");
    }

    #[test]
    fn test_raw_gzip_form() {
        let form = loader().load(&gzip(FORM_XML.as_bytes())).unwrap();
        assert_eq!(form.version, "2.79.9");
    }

    #[test]
    fn test_corrupt_gzip_is_a_load_error() {
        let err = loader().load(&[0x1f, 0x8b, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }

    #[test]
    fn test_unknown_title_is_rejected() {
        let xml = FORM_XML.replace("OFFICER PERFORMANCE REPORT (Officer)", "Leave Form");
        let err = loader().load(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::UnknownDocumentType(_)));
    }

    #[test]
    fn test_single_page_form_is_rejected() {
        let xml = FORM_XML.replace(
            r#"<page sid="PAGE2"><field sid="SR"><value>Excellent</value></field></page>"#,
            "",
        );
        let err = loader().load(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingPart(_)));
    }
}
