//! Seen-finding history
//!
//! The only state persisted between runs: a flat list of finding ids, used
//! to classify findings as new versus previously reported.

use revet_types::{Finding, HistoryError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Previously seen finding ids
#[derive(Debug)]
pub struct History {
    path: PathBuf,
    seen: BTreeSet<String>,
}

impl History {
    /// Load history from the given file; a missing file yields an empty set
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let seen = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(HistoryError::ReadFailed(format!("{}: {e}", path.display()))),
        };
        Ok(Self { path, seen })
    }

    /// Default history location under the user data directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("revet").join("seen-findings"))
            .unwrap_or_else(|| PathBuf::from(".revet-history"))
    }

    /// Whether an id has been reported by a previous run
    pub fn is_known(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Mark each finding as new or previously reported
    pub fn classify(&self, findings: &mut [Finding]) {
        for finding in findings {
            finding.new = !self.is_known(&finding.id);
        }
    }

    /// Record the findings of the current run
    pub fn record<'a>(&mut self, findings: impl IntoIterator<Item = &'a Finding>) {
        for finding in findings {
            self.seen.insert(finding.id.clone());
        }
    }

    /// Persist the id set, creating parent directories as needed
    pub async fn save(&self) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HistoryError::WriteFailed(e.to_string()))?;
        }
        let content: String = self.seen.iter().map(|id| format!("{id}\n")).collect();
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| HistoryError::WriteFailed(format!("{}: {e}", self.path.display())))
    }

    /// Ids recorded so far, in stable order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.seen.iter().map(String::as_str)
    }

    /// Number of recorded ids
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no ids have been recorded
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// The file this history reads from and writes to
    pub fn path(&self) -> &Path {
        &self.path
    }
}
