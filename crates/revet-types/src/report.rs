//! The aggregated analysis report

use crate::finding::Finding;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-severity counts plus the pass/fail verdict
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Surviving critical findings
    pub critical: usize,
    /// Surviving warning findings
    pub warning: usize,
    /// Surviving suggestion findings
    pub suggestion: usize,
    /// Whether the run passed its gate
    pub passed: bool,
}

impl Summary {
    /// Total surviving findings
    pub fn total(&self) -> usize {
        self.critical + self.warning + self.suggestion
    }
}

/// Immutable result of one orchestration run
///
/// A single structure feeds the JSON, Markdown and terminal renderings so the
/// formats cannot drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique id for this run (excluded from determinism comparisons)
    pub run_id: String,
    /// When the report was generated (excluded from determinism comparisons)
    pub generated_at: DateTime<Utc>,
    /// Number of targets that were resolved for this run
    pub targets_count: usize,
    /// Per-severity counts and the verdict
    pub summary: Summary,
    /// Counts keyed by category name, in stable order
    pub category_counts: BTreeMap<String, usize>,
    /// Findings that survived validation, deduplicated and sorted
    pub findings: Vec<Finding>,
    /// Explicitly observed good patterns
    pub positive_findings: Vec<String>,
    /// Set when the run was cancelled or hit its run-level timeout
    pub incomplete: bool,
    /// Number of analyzer timeouts/crashes absorbed during the run
    pub tooling_errors: usize,
}

impl Report {
    /// Whether any analyzer infrastructure failure was absorbed into this run
    pub fn has_tooling_errors(&self) -> bool {
        self.tooling_errors > 0
    }
}
