//! Spell checker backends
//!
//! Every backend answers one word at a time through [`SpellChecker`]. The
//! processor picks one backend per run from [`SpellingConfig`] and hands it
//! to the check engine as a `Box<dyn SpellChecker>`.
//!
//! - [`CommandSpellChecker`]: an ispell-compatible process (`hunspell -a`)
//!   kept alive for the whole run
//! - [`DictionarySpellChecker`]: a hunspell `.aff`/`.dic` pair checked in
//!   process with `spellbook`
//! - [`DisabledSpellChecker`]: accepts every word

#[cfg(feature = "command-spelling")]
pub mod command;
pub mod dictionary;

#[cfg(feature = "command-spelling")]
pub use command::CommandSpellChecker;
pub use dictionary::DictionarySpellChecker;

use crate::config::{SpellingBackend, SpellingConfig};
use crate::error::SpellCheckError;
use tracing::{info, warn};

/// Verdict for one word
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spelling {
    pub correct: bool,
    pub suggestions: Vec<String>,
}

impl Spelling {
    pub fn correct() -> Self {
        Self {
            correct: true,
            suggestions: Vec::new(),
        }
    }

    pub fn misspelled(suggestions: Vec<String>) -> Self {
        Self {
            correct: false,
            suggestions,
        }
    }
}

pub trait SpellChecker {
    fn check(&mut self, word: &str) -> Result<Spelling, SpellCheckError>;

    /// Backend identifier for logs and report notes
    fn name(&self) -> &str;
}

#[derive(Debug, Default)]
pub struct DisabledSpellChecker;

impl SpellChecker for DisabledSpellChecker {
    fn check(&mut self, _word: &str) -> Result<Spelling, SpellCheckError> {
        Ok(Spelling::correct())
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Backend picked for a run, with the reason when it is not the one asked for
pub struct SpellCheckerSelection {
    pub checker: Box<dyn SpellChecker>,
    pub note: Option<String>,
}

impl SpellCheckerSelection {
    fn chosen(checker: Box<dyn SpellChecker>) -> Self {
        info!(backend = checker.name(), "spell checker ready");
        Self {
            checker,
            note: None,
        }
    }

    fn disabled(note: String) -> Self {
        warn!("{note}");
        Self {
            checker: Box::new(DisabledSpellChecker),
            note: Some(note),
        }
    }
}

/// Pick the backend once per run. Never fails: a backend that cannot start
/// falls back to the next one, and finally to the disabled checker.
pub fn spell_checker_from_config(config: &SpellingConfig) -> SpellCheckerSelection {
    match config.backend {
        SpellingBackend::Off => SpellCheckerSelection {
            checker: Box::new(DisabledSpellChecker),
            note: None,
        },
        SpellingBackend::Command => match start_command(config) {
            Ok(checker) => SpellCheckerSelection::chosen(checker),
            Err(e) => SpellCheckerSelection::disabled(format!(
                "Spelling not checked: spell-check engine unavailable ({e})"
            )),
        },
        SpellingBackend::Dictionary => match open_dictionary(config) {
            Ok(checker) => SpellCheckerSelection::chosen(checker),
            Err(e) => SpellCheckerSelection::disabled(format!(
                "Spelling not checked: dictionary unavailable ({e})"
            )),
        },
        SpellingBackend::Auto => {
            let command_error = match start_command(config) {
                Ok(checker) => return SpellCheckerSelection::chosen(checker),
                Err(e) => e,
            };
            if config.dictionary.is_some() {
                match open_dictionary(config) {
                    Ok(checker) => return SpellCheckerSelection::chosen(checker),
                    Err(e) => warn!(error = %e, "dictionary unavailable"),
                }
            }
            SpellCheckerSelection::disabled(format!(
                "Spelling not checked: no spell checker available ({command_error})"
            ))
        }
    }
}

#[cfg(feature = "command-spelling")]
fn start_command(config: &SpellingConfig) -> Result<Box<dyn SpellChecker>, SpellCheckError> {
    let timeout = std::time::Duration::from_millis(config.timeout_ms);
    let checker = CommandSpellChecker::spawn(&config.command, timeout)?;
    Ok(Box::new(checker))
}

#[cfg(not(feature = "command-spelling"))]
fn start_command(_config: &SpellingConfig) -> Result<Box<dyn SpellChecker>, SpellCheckError> {
    Err(SpellCheckError::Unavailable(
        "built without the command-spelling feature".to_string(),
    ))
}

fn open_dictionary(config: &SpellingConfig) -> Result<Box<dyn SpellChecker>, SpellCheckError> {
    let path = config
        .dictionary
        .as_deref()
        .ok_or_else(|| SpellCheckError::Unavailable("no dictionary configured".to_string()))?;
    let checker = DictionarySpellChecker::from_path(path, config.max_suggestions)?;
    Ok(Box::new(checker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_dictionary(dir: &std::path::Path) -> std::path::PathBuf {
        std::fs::write(dir.join("words.aff"), "SET UTF-8\nTRY esianrtolcdugmphbyfvkwz\n").unwrap();
        std::fs::write(dir.join("words.dic"), "2\nthe\nteam\n").unwrap();
        dir.join("words.dic")
    }

    #[test]
    fn test_off_backend_has_no_note() {
        let config = SpellingConfig {
            backend: SpellingBackend::Off,
            ..SpellingConfig::default()
        };
        let selection = spell_checker_from_config(&config);
        assert_eq!(selection.checker.name(), "disabled");
        assert!(selection.note.is_none());
    }

    #[test]
    fn test_unstartable_command_falls_back_with_note() {
        let config = SpellingConfig {
            backend: SpellingBackend::Command,
            command: vec!["prcheck-no-such-speller-binary".to_string()],
            ..SpellingConfig::default()
        };
        let selection = spell_checker_from_config(&config);
        assert_eq!(selection.checker.name(), "disabled");
        assert!(selection.note.unwrap().starts_with("Spelling not checked"));
    }

    #[test]
    fn test_auto_uses_dictionary_when_engine_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SpellingConfig {
            backend: SpellingBackend::Auto,
            command: vec!["prcheck-no-such-speller-binary".to_string()],
            dictionary: Some(write_dictionary(dir.path())),
            ..SpellingConfig::default()
        };
        let mut selection = spell_checker_from_config(&config);
        assert_eq!(selection.checker.name(), "dictionary");
        assert!(selection.note.is_none());
        assert!(!selection.checker.check("teh").unwrap().correct);
    }

    #[test]
    fn test_dictionary_without_affix_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("words.dic"), "1\nthe\n").unwrap();
        let config = SpellingConfig {
            backend: SpellingBackend::Dictionary,
            dictionary: Some(dir.path().join("words.dic")),
            ..SpellingConfig::default()
        };
        let selection = spell_checker_from_config(&config);
        assert_eq!(selection.checker.name(), "disabled");
        assert!(selection.note.unwrap().contains("words.aff"));
    }

    #[test]
    fn test_disabled_accepts_everything() {
        let mut checker = DisabledSpellChecker;
        assert_eq!(checker.check("qwxz").unwrap(), Spelling::correct());
    }
}
