//! ispell-compatible spell-check engine over a pipe
//!
//! Drives `hunspell -a` (or `aspell -a`, `ispell -a`) for the whole run.
//!
//! # Protocol
//! The engine prints a banner line starting with `@`. Each input line gets
//! one answer line per word followed by a blank line:
//! - `*`, `+ root`, `-`: correct
//! - `& word count offset: s1, s2`: misspelled with suggestions
//! - `? word count offset: s1, s2`: misspelled, guesses only
//! - `# word offset`: misspelled, no suggestions
//!
//! # Process lifecycle
//! A helper thread forwards stdout lines over a channel so every answer can
//! be awaited with a deadline. The child is killed when the checker drops,
//! which closes stdout and ends the helper thread.

use super::{SpellChecker, Spelling};
use crate::error::SpellCheckError;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::debug;

pub struct CommandSpellChecker {
    program: String,
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<std::io::Result<String>>,
    timeout: Duration,
}

impl CommandSpellChecker {
    /// Start the engine and wait for its banner
    pub fn spawn(command: &[String], timeout: Duration) -> Result<Self, SpellCheckError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| SpellCheckError::Unavailable("empty spell command".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpellCheckError::Unavailable(format!("{program}: {e}")))?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SpellCheckError::Unavailable(format!(
                    "{program}: pipes not available"
                )));
            }
        };

        let (sender, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                if sender.send(line).is_err() {
                    break;
                }
            }
        });

        let checker = Self {
            program: program.clone(),
            child,
            stdin,
            lines,
            timeout,
        };
        let banner = checker.next_line()?;
        if !banner.starts_with('@') {
            return Err(SpellCheckError::Protocol(format!(
                "unexpected banner: {banner}"
            )));
        }
        debug!(program = %checker.program, banner = %banner, "spell-check engine started");
        Ok(checker)
    }

    fn next_line(&self) -> Result<String, SpellCheckError> {
        match self.lines.recv_timeout(self.timeout) {
            Ok(line) => Ok(line?),
            Err(RecvTimeoutError::Timeout) => {
                Err(SpellCheckError::Timeout(self.timeout.as_millis() as u64))
            }
            Err(RecvTimeoutError::Disconnected) => Err(SpellCheckError::Unavailable(format!(
                "{} exited",
                self.program
            ))),
        }
    }
}

impl SpellChecker for CommandSpellChecker {
    fn check(&mut self, word: &str) -> Result<Spelling, SpellCheckError> {
        if word.trim().is_empty() {
            return Ok(Spelling::correct());
        }
        // `^` keeps a leading character from being read as an engine command
        writeln!(self.stdin, "^{word}")?;
        self.stdin.flush()?;

        let mut spelling = Spelling::correct();
        loop {
            let line = self.next_line()?;
            if line.is_empty() {
                break;
            }
            parse_answer(&line, &mut spelling)?;
        }
        Ok(spelling)
    }

    fn name(&self) -> &str {
        "command"
    }
}

impl Drop for CommandSpellChecker {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Fold one answer line into the verdict for the queried word
pub fn parse_answer(line: &str, spelling: &mut Spelling) -> Result<(), SpellCheckError> {
    match line.chars().next() {
        Some('*') | Some('+') | Some('-') => {}
        Some('#') => spelling.correct = false,
        Some('&') | Some('?') => {
            spelling.correct = false;
            if spelling.suggestions.is_empty() {
                if let Some((_, list)) = line.split_once(": ") {
                    spelling.suggestions = list
                        .split(", ")
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                }
            }
        }
        _ => {
            return Err(SpellCheckError::Protocol(format!(
                "unexpected answer: {line}"
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lines: &[&str]) -> Spelling {
        let mut spelling = Spelling::correct();
        for line in lines {
            parse_answer(line, &mut spelling).unwrap();
        }
        spelling
    }

    #[test]
    fn test_correct_answers() {
        assert_eq!(parse(&["*"]), Spelling::correct());
        assert_eq!(parse(&["+ lead"]), Spelling::correct());
        assert_eq!(parse(&["-"]), Spelling::correct());
    }

    #[test]
    fn test_misspelled_with_suggestions() {
        let spelling = parse(&["& teh 3 0: the, tech, ten"]);
        assert!(!spelling.correct);
        assert_eq!(spelling.suggestions, vec!["the", "tech", "ten"]);
    }

    #[test]
    fn test_misspelled_without_suggestions() {
        let spelling = parse(&["# qwxz 0"]);
        assert!(!spelling.correct);
        assert!(spelling.suggestions.is_empty());
    }

    #[test]
    fn test_unknown_answer_is_protocol_error() {
        let mut spelling = Spelling::correct();
        let err = parse_answer("Error: no dictionary", &mut spelling).unwrap_err();
        assert!(matches!(err, SpellCheckError::Protocol(_)));
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let command = vec!["prcheck-no-such-speller-binary".to_string()];
        let err = CommandSpellChecker::spawn(&command, Duration::from_millis(200))
            .err()
            .unwrap();
        assert!(matches!(err, SpellCheckError::Unavailable(_)));
    }
}
