use super::{SpellChecker, Spelling};
use crate::error::SpellCheckError;
use spellbook::Dictionary;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Minimal affix file for dictionaries built from a bare word list
const PLAIN_AFF: &str = "SET UTF-8\nTRY esianrtolcdugmphbyfvkwzESIANRTOLCDUGMPHBYFVKWZ'";

/// Hunspell-format dictionary (`.aff` + `.dic`), checked in process.
/// Punctuation around a token is trimmed first; tokens without letters pass.
pub struct DictionarySpellChecker {
    dictionary: Dictionary,
    max_suggestions: usize,
}

impl DictionarySpellChecker {
    pub fn new(aff: &str, dic: &str, max_suggestions: usize) -> Result<Self, SpellCheckError> {
        let dictionary = Dictionary::new(aff, dic)
            .map_err(|e| SpellCheckError::Unavailable(format!("invalid dictionary: {e}")))?;
        Ok(Self {
            dictionary,
            max_suggestions,
        })
    }

    /// Dictionary with no affix rules, one entry per word
    pub fn from_words<I, S>(words: I, max_suggestions: usize) -> Result<Self, SpellCheckError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        let dic = format!("{}\n{}", words.len(), words.join("\n"));
        Self::new(PLAIN_AFF, &dic, max_suggestions)
    }

    /// Load `<name>.aff` and `<name>.dic`. `path` may name either file or
    /// the shared stem.
    pub fn from_path(path: &Path, max_suggestions: usize) -> Result<Self, SpellCheckError> {
        let (aff_path, dic_path) = hunspell_pair(path);
        let aff = read_part(&aff_path)?;
        let dic = read_part(&dic_path)?;
        let checker = Self::new(&aff, &dic, max_suggestions)?;
        debug!(dic = %dic_path.display(), "loaded dictionary");
        Ok(checker)
    }
}

fn hunspell_pair(path: &Path) -> (PathBuf, PathBuf) {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("aff") | Some("dic") => (path.with_extension("aff"), path.with_extension("dic")),
        _ => {
            let stem = path.as_os_str().to_string_lossy();
            (PathBuf::from(format!("{stem}.aff")), PathBuf::from(format!("{stem}.dic")))
        }
    }
}

fn read_part(path: &Path) -> Result<String, SpellCheckError> {
    std::fs::read_to_string(path).map_err(|e| {
        SpellCheckError::Unavailable(format!("cannot read {}: {e}", path.display()))
    })
}

impl SpellChecker for DictionarySpellChecker {
    fn check(&mut self, word: &str) -> Result<Spelling, SpellCheckError> {
        let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
        if !trimmed.chars().any(char::is_alphabetic) || self.dictionary.check(trimmed) {
            return Ok(Spelling::correct());
        }
        let mut suggestions = Vec::new();
        self.dictionary.suggest(trimmed, &mut suggestions);
        suggestions.truncate(self.max_suggestions);
        Ok(Spelling::misspelled(suggestions))
    }

    fn name(&self) -> &str {
        "dictionary"
    }
}
