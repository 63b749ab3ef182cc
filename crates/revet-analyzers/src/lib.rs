//! Built-in analyzers for revet
//!
//! Each analyzer is an ordinary plugin behind `revet_core::Analyzer`; the
//! engine gives them no special treatment. They share a line-oriented raw
//! format (`line\tkind\tsnippet`) between `run` and `parse`, but that format
//! is private to each analyzer — the engine treats raw output as opaque.

pub mod conflict_markers;
pub mod debug_statements;
pub mod large_files;
pub mod secrets;

pub use conflict_markers::ConflictMarkerScan;
pub use debug_statements::DebugStatementScan;
pub use large_files::LargeFileCheck;
pub use secrets::SecretScan;

use revet_core::AnalyzerRegistry;

/// Registry pre-populated with every built-in analyzer
pub fn builtin_registry() -> AnalyzerRegistry {
    let mut registry = AnalyzerRegistry::new();
    registry.register(SecretScan::new());
    registry.register(ConflictMarkerScan);
    registry.register(DebugStatementScan::new());
    registry.register(LargeFileCheck::default());
    registry
}

/// Shared raw-record helpers for the line-oriented analyzers
pub(crate) mod record {
    use revet_types::{FindingDraft, Severity};

    /// Encode one match as a raw output line
    pub fn encode(line: u32, kind: &str, snippet: &str) -> String {
        // Char-wise so multi-byte content cannot split a boundary.
        let snippet: String = snippet.trim().chars().take(120).collect();
        format!("{line}\t{kind}\t{snippet}")
    }

    /// Decode a raw output line back into its parts
    pub fn decode(raw: &str) -> Option<(u32, &str, &str)> {
        let mut parts = raw.splitn(3, '\t');
        let line = parts.next()?.parse().ok()?;
        let kind = parts.next()?;
        let snippet = parts.next().unwrap_or("");
        Some((line, kind, snippet))
    }

    /// Draft with the common line/evidence fields filled in
    pub fn draft(severity: Severity, message: String, line: u32, snippet: &str) -> FindingDraft {
        let mut draft = FindingDraft::new(severity, message).at_line(line);
        if !snippet.is_empty() {
            draft = draft.with_evidence(snippet);
        }
        draft
    }
}
