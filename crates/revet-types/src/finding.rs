//! Findings: normalized, located issue reports with severity and confidence

use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity of a finding
///
/// Declared in ascending order so the derived `Ord` ranks `Critical` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Advisory, never gates a run by default
    Suggestion,
    /// Should be addressed, gates a run only above the configured ceiling
    Warning,
    /// Must be addressed, gates a run in blocking mode
    Critical,
}

impl Severity {
    /// Numeric rank, for display and sorting
    pub fn to_score(&self) -> u8 {
        match self {
            Severity::Critical => 3,
            Severity::Warning => 2,
            Severity::Suggestion => 1,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
        };
        write!(f, "{s}")
    }
}

/// Category of the check that produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Secrets, injection, unsafe patterns
    Security,
    /// Logic and consistency problems
    Correctness,
    /// Formatting, debug leftovers, conventions
    Style,
    /// Resource usage concerns
    Performance,
    /// Analyzer infrastructure failures (timeouts, crashes)
    Tooling,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Security => "security",
            Category::Correctness => "correctness",
            Category::Style => "style",
            Category::Performance => "performance",
            Category::Tooling => "tooling",
        };
        write!(f, "{s}")
    }
}

/// Validation status of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    /// Emitted by the collector, not yet validated
    Pending,
    /// Survived validation unchanged
    Validated,
    /// Rejected by the existence check or a catalog rule
    Rejected,
    /// Survived validation with a reduced confidence
    Downgraded,
}

/// A single normalized issue report
///
/// Created by the collector, mutated only by the validation pipeline
/// (confidence and status), then frozen once included in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Stable hash of `analyzer_id + file + line + message`
    pub id: String,
    /// Analyzer that emitted the finding
    pub analyzer_id: String,
    /// Category inherited from the analyzer
    pub category: Category,
    /// Severity as assigned at emission; validation never raises it
    pub severity: Severity,
    /// Estimated likelihood (0..=100) that this is a true positive
    pub confidence: u8,
    /// File the finding points at
    pub file: PathBuf,
    /// Line number, when the finding is line-scoped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Human-readable description of the issue
    #[serde(rename = "issue")]
    pub message: String,
    /// Snippet of the offending content, used by the existence re-check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Suggested remediation, when the analyzer provides one
    #[serde(rename = "fix", skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    /// Validation status
    pub status: FindingStatus,
    /// Whether the finding id was absent from the seen-id history
    pub new: bool,
}

/// A finding as emitted by an analyzer's parser, before the collector
/// stamps identity and provenance onto it
#[derive(Debug, Clone)]
pub struct FindingDraft {
    /// Severity assigned by the analyzer
    pub severity: Severity,
    /// Human-readable description of the issue
    pub message: String,
    /// Line number, when line-scoped
    pub line: Option<u32>,
    /// Snippet of the offending content
    pub evidence: Option<String>,
    /// Suggested remediation
    pub suggested_fix: Option<String>,
    /// Per-finding confidence override; falls back to the analyzer's base
    pub confidence: Option<u8>,
}

impl FindingDraft {
    /// Create a draft with the given severity and message
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            line: None,
            evidence: None,
            suggested_fix: None,
            confidence: None,
        }
    }

    /// Set the line number
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach the offending snippet
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// Attach a suggested fix
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    /// Override the analyzer's base confidence for this finding
    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence.min(100));
        self
    }
}

/// Raw, analyzer-specific output lines produced by `Analyzer::run`
///
/// Owned solely by the analyzer that produced it until parsed; the engine
/// treats the contents as opaque.
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    /// Unstructured output records, one per line
    pub lines: Vec<String>,
}

impl RawOutput {
    /// Output with the given lines
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Output with no records (a clean target)
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Everything an analyzer's parser extracted from one raw result
#[derive(Debug, Default)]
pub struct ParsedOutput {
    /// Issues found in the target
    pub findings: Vec<FindingDraft>,
    /// Explicitly observed good patterns, kept separate from issues
    pub positives: Vec<String>,
}

impl ParsedOutput {
    /// Output containing only findings
    pub fn from_findings(findings: Vec<FindingDraft>) -> Self {
        Self {
            findings,
            positives: Vec::new(),
        }
    }
}

/// Outcome of one `(analyzer, target)` invocation
#[derive(Debug, Clone)]
pub enum RawOutcome {
    /// The analyzer ran to completion
    Completed(RawOutput),
    /// The analyzer exceeded its time budget
    TimedOut {
        /// The per-analyzer budget that was exceeded, in milliseconds
        limit_ms: u64,
    },
    /// The analyzer returned an error
    Failed {
        /// Error description, surfaced in the tooling finding
        message: String,
    },
}

/// One unit of runner output: an analyzer applied to a target
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Analyzer that ran
    pub analyzer_id: String,
    /// The analyzer's category
    pub category: Category,
    /// The analyzer's base confidence for findings without an override
    pub base_confidence: u8,
    /// The target it ran against
    pub target: Target,
    /// What happened
    pub outcome: RawOutcome,
}
