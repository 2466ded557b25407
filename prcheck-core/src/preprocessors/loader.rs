// Loader abstraction for the two input documents
//
// This module defines the boundary between container decoding (XFDL, ODS)
// and rule evaluation. Everything downstream of a loader works with the
// generic node tree and the typed outputs built from it, never with bytes.

use crate::error::LoadError;
use std::path::Path;

/// DocumentLoader trait - converts input files to typed documents
///
/// Loading happens in two clear steps:
/// 1. Container bytes -> markup (base64/gzip XFDL -> XML, ODS zip -> content.xml)
/// 2. Markup -> typed output (FormDocument, Workbook)
pub trait DocumentLoader {
    type Output;

    /// Step 1: unwrap the container format into XML text
    fn decode_to_markup(&self, bytes: &[u8]) -> Result<String, LoadError>;

    /// Step 2: build the typed output from XML text
    fn parse_markup(&self, markup: &str) -> Result<Self::Output, LoadError>;

    /// Full load from bytes (combines both steps)
    fn load(&self, bytes: &[u8]) -> Result<Self::Output, LoadError> {
        let markup = self.decode_to_markup(bytes)?;
        self.parse_markup(&markup)
    }

    /// Loader name for logging
    fn name(&self) -> &str;

    /// Check if the loader handles the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}

pub(crate) fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}
