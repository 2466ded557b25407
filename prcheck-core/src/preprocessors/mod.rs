//! Document Loaders
//!
//! This module provides the decoding layer that turns the two input files
//! into the generic node tree and the typed documents built from it.
//!
//! ## Architecture
//!
//! ```text
//! Form (.xfdl)                 Rules (.ods)
//!     ↓                            ↓
//! [FormLoader]               [WorkbookLoader]
//!  base64/gzip → XML          zip → content.xml
//!     ↓                            ↓
//! FormDocument                 Workbook
//!     ↓                            ↓
//!     └──────→ [CheckEngine] ←─────┘
//! ```

pub mod loader;
pub mod ods;
pub mod xfdl;
pub mod xml;

// Re-export main types
pub use loader::DocumentLoader;
pub use ods::WorkbookLoader;
pub use xfdl::FormLoader;
pub use xml::parse_document;
