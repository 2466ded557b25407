//! Locations - find the config file and rules workbook for a run
//!
//! Explicit paths from the command line always win. Otherwise the working
//! directory is tried first, then the user's config directory
//! (`~/.config/prcheck` on Linux).

use anyhow::{anyhow, Result};
use prcheck_core::config::DEFAULT_RULES_FILE;
use std::path::{Path, PathBuf};

/// Config file name looked up when `--config` is not given
pub const CONFIG_FILE: &str = "prcheck.yaml";

/// Resolves input locations for the CLI
pub struct Locations {
    /// Per-user directory (e.g. ~/.config/prcheck); None when the platform has none
    config_dir: Option<PathBuf>,
}

impl Locations {
    /// Create Locations using the platform config directory
    pub fn new() -> Self {
        Self {
            config_dir: dirs::config_dir().map(|dir| dir.join("prcheck")),
        }
    }

    /// Create Locations rooted at a specific directory
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: Some(config_dir.into()),
        }
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    fn candidates(&self, file_name: &str) -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(file_name)];
        if let Some(dir) = &self.config_dir {
            candidates.push(dir.join(file_name));
        }
        candidates
    }

    /// Config file to load, if any. A missing explicit path is passed
    /// through so loading can report it.
    pub fn config_file(&self, explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        self.candidates(CONFIG_FILE)
            .into_iter()
            .find(|candidate| candidate.is_file())
    }

    /// Rules workbook to use; an error lists every place looked at
    pub fn rules_file(&self, explicit: Option<&str>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            let path = PathBuf::from(path);
            if path.is_file() {
                return Ok(path);
            }
            return Err(anyhow!("Rules workbook not found at: {}", path.display()));
        }

        let candidates = self.candidates(DEFAULT_RULES_FILE);
        if let Some(found) = candidates.iter().find(|candidate| candidate.is_file()) {
            return Ok(found.clone());
        }
        let searched: Vec<String> = candidates
            .iter()
            .map(|candidate| candidate.display().to_string())
            .collect();
        Err(anyhow!(
            "Rules workbook \"{}\" not found. Searched:\n  {}",
            DEFAULT_RULES_FILE,
            searched.join("\n  ")
        ))
    }
}

impl Default for Locations {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_explicit_config_is_passed_through() {
        let locations = Locations::with_config_dir("/nowhere");
        assert_eq!(
            locations.config_file(Some("custom.yaml")),
            Some(PathBuf::from("custom.yaml"))
        );
    }

    #[test]
    fn test_rules_found_in_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join(DEFAULT_RULES_FILE);
        fs::write(&rules, b"stub").unwrap();

        let locations = Locations::with_config_dir(dir.path());
        assert_eq!(locations.rules_file(None).unwrap(), rules);
    }

    #[test]
    fn test_missing_rules_lists_searched_paths() {
        let dir = tempfile::tempdir().unwrap();
        let locations = Locations::with_config_dir(dir.path().join("empty"));
        let err = locations.rules_file(Some("/no/such/rules.ods")).unwrap_err();
        assert!(err.to_string().contains("/no/such/rules.ods"));
    }

    #[test]
    fn test_config_dir_file_is_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "verbose: true\n").unwrap();
        let locations = Locations::with_config_dir(dir.path());
        assert_eq!(
            locations.config_file(None),
            Some(dir.path().join(CONFIG_FILE))
        );
    }
}
