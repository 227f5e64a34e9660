//! Numbered command history with plain-text persistence.
//!
//! The history file holds one command line per record in execution order.
//! It is read in full at startup and rewritten, never appended, when the
//! session ends.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Default number of records kept in the history file.
pub const HISTORY_MAX: usize = 4096;

/// Name of the history file inside the user's home directory.
pub const HISTORY_FILE: &str = ".shell_history";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    next_number: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_number: 1,
        }
    }

    /// Load the history file, numbering records in file order.
    ///
    /// A missing file yields an empty store. Records that are not valid
    /// UTF-8 are kept with the offending bytes replaced.
    pub fn load(path: &Path) -> io::Result<Self> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e),
        };

        let content = String::from_utf8_lossy(&raw);
        let mut store = Self::new();
        for line in content.lines().filter(|l| !l.is_empty()) {
            store.push(line);
        }
        tracing::debug!(target: "history", "loaded {} entries from {}", store.entries.len(), path.display());
        Ok(store)
    }

    /// Append a command line, returning the number it was given.
    pub fn push(&mut self, text: impl Into<String>) -> usize {
        let number = self.next_number;
        self.entries.push(HistoryEntry {
            number,
            text: text.into(),
        });
        self.next_number += 1;
        number
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Rewrite the history file with at most `max` of the most recent entries.
    pub fn save(&self, path: &Path, max: usize) -> io::Result<()> {
        let start = self.entries.len().saturating_sub(max);
        let mut out = io::BufWriter::new(fs::File::create(path)?);
        for entry in &self.entries[start..] {
            writeln!(out, "{}", entry.text)?;
        }
        out.flush()?;
        tracing::debug!(target: "history", "saved {} entries to {}", self.entries.len() - start, path.display());
        Ok(())
    }
}
