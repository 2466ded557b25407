use crate::types::CheckGroup;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

// Default value functions for serde
fn default_document_types() -> Vec<DocumentTypeMarker> {
    vec![
        DocumentTypeMarker {
            marker: "Officer".to_string(),
            document_type: "OPR".to_string(),
        },
        DocumentTypeMarker {
            marker: "ENLISTED".to_string(),
            document_type: "EPR".to_string(),
        },
    ]
}

fn default_spell_command() -> Vec<String> {
    vec!["hunspell".to_string(), "-a".to_string()]
}

fn default_backend() -> SpellingBackend {
    SpellingBackend::Auto
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_max_suggestions() -> usize {
    5
}

/// Placeholder in rule sheet names replaced by the document type code
pub const TYPE_PLACEHOLDER: &str = "{TYPE}";

/// Default rules workbook, looked up next to the working directory
pub const DEFAULT_RULES_FILE: &str = "PR Structure.ods";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Emit OK events as well as failures and warnings
    #[serde(default)]
    pub verbose: bool,
    /// In verbose runs, also write the loaded rule tables into the report notes
    #[serde(default)]
    pub dump_rules: bool,
    /// Title markers that identify the form type, checked in order
    #[serde(default = "default_document_types")]
    pub document_types: Vec<DocumentTypeMarker>,
    /// Sheet names in the rules workbook
    #[serde(default)]
    pub sheets: SheetNames,
    #[serde(default)]
    pub spelling: SpellingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Substring of the form title → short type code ("Officer" → "OPR")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTypeMarker {
    pub marker: String,
    pub document_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    /// Per-type sheets; `{TYPE}` is replaced with the document type code
    pub fields: String,
    pub checks: String,
    pub popups: String,
    /// Shared sheets
    pub senior_raters: String,
    pub versions: String,
    pub overlook: String,
    pub catch: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            fields: "{TYPE} Fields".to_string(),
            checks: "{TYPE} Checks".to_string(),
            popups: "{TYPE} Popups".to_string(),
            senior_raters: "Senior Rater Info".to_string(),
            versions: "PR Version".to_string(),
            overlook: "Overlook".to_string(),
            catch: "Catch".to_string(),
        }
    }
}

impl SheetNames {
    /// Name of the rule sheet for one check group and document type
    pub fn rule_sheet(&self, group: CheckGroup, document_type: &str) -> String {
        let template = match group {
            CheckGroup::Fields => &self.fields,
            CheckGroup::Checks => &self.checks,
            CheckGroup::Popups => &self.popups,
        };
        template.replace(TYPE_PLACEHOLDER, document_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellingBackend {
    /// External engine if it starts, else the dictionary if configured, else off
    Auto,
    /// ispell-compatible process (hunspell -a, aspell -a)
    Command,
    /// Hunspell `.aff`/`.dic` dictionary checked in process
    Dictionary,
    Off,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellingConfig {
    #[serde(default = "default_backend")]
    pub backend: SpellingBackend,
    /// Program and arguments of the external engine
    #[serde(default = "default_spell_command")]
    pub command: Vec<String>,
    /// Hunspell dictionary: the `.dic` or `.aff` file, or their shared stem
    /// (`/usr/share/hunspell/en_US`)
    #[serde(default)]
    pub dictionary: Option<PathBuf>,
    /// Deadline for one answer from the external engine
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl Default for SpellingConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            command: default_spell_command(),
            dictionary: None,
            timeout_ms: default_timeout_ms(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// The plain `.out` layout
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: ReportFormat,
    /// Where report files go; defaults to the working directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Per-run options threaded into every check component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    pub verbose: bool,
}

impl CheckConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CheckConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                warn!(path = p, error = %e, "failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn options(&self) -> CheckOptions {
        CheckOptions {
            verbose: self.verbose,
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            dump_rules: false,
            document_types: default_document_types(),
            sheets: SheetNames::default(),
            spelling: SpellingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}
