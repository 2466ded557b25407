use thiserror::Error;

/// Fatal problems reading one of the two input documents.
///
/// Any of these aborts the run before rules are evaluated; the processor
/// turns it into a single-entry report.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a readable spreadsheet archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Malformed XML: {0}")]
    Xml(String),

    #[error("Cannot decode form content: {0}")]
    Decode(String),

    #[error("Document has no {0}")]
    MissingPart(String),

    #[error("Wrong document format: {0}")]
    WrongFormat(String),

    #[error("Unrecognized form type in title \"{0}\"")]
    UnknownDocumentType(String),
}

impl From<quick_xml::Error> for LoadError {
    fn from(e: quick_xml::Error) -> Self {
        LoadError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for LoadError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        LoadError::Xml(e.to_string())
    }
}

/// Failures of the pluggable spell-check capability.
#[derive(Error, Debug)]
pub enum SpellCheckError {
    #[error("Spell checker unavailable: {0}")]
    Unavailable(String),

    #[error("Spell checker I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spell checker did not answer within {0} ms")]
    Timeout(u64),

    #[error("Unexpected spell checker output: {0}")]
    Protocol(String),
}
