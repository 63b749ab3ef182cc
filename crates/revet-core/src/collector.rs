//! Normalizes raw analyzer output into uniform findings
//!
//! Identity is fixed here: the finding id is a stable hash of
//! `analyzer_id + file + line + message`, so identical analyzer output
//! produces identical ids across runs.

use revet_types::{
    Category, Finding, FindingStatus, RawOutcome, RunRecord, Severity,
};
use std::path::Path;

use crate::registry::AnalyzerRegistry;
use crate::runner::RunBatch;

/// Collector output: normalized findings plus run-level bookkeeping
#[derive(Debug, Default)]
pub struct Collected {
    /// Normalized findings, in runner order
    pub findings: Vec<Finding>,
    /// Positive observations from all analyzers
    pub positives: Vec<String>,
    /// Number of timeout/crash markers converted into tooling findings
    pub tooling_errors: usize,
}

/// Converts each raw result into zero or more findings
pub struct FindingCollector;

impl FindingCollector {
    /// Compute the stable id for a finding
    pub fn finding_id(analyzer_id: &str, file: &Path, line: Option<u32>, message: &str) -> String {
        let line_part = line.map(|l| l.to_string()).unwrap_or_default();
        let digest = md5::compute(format!(
            "{analyzer_id}\x1f{}\x1f{line_part}\x1f{message}",
            file.display()
        ));
        format!("{digest:x}")
    }

    /// Normalize a full runner batch
    pub fn collect(&self, registry: &AnalyzerRegistry, batch: &RunBatch) -> Collected {
        let mut collected = Collected::default();

        for record in &batch.records {
            match &record.outcome {
                RawOutcome::Completed(raw) => {
                    self.collect_completed(registry, record, raw, &mut collected)
                }
                RawOutcome::TimedOut { limit_ms } => {
                    let message = format!(
                        "analyzer '{}' timed out after {limit_ms}ms",
                        record.analyzer_id
                    );
                    collected.findings.push(tooling_finding(record, message));
                    collected.tooling_errors += 1;
                }
                RawOutcome::Failed { message } => {
                    let message =
                        format!("analyzer '{}' failed: {message}", record.analyzer_id);
                    collected.findings.push(tooling_finding(record, message));
                    collected.tooling_errors += 1;
                }
            }
        }

        collected
    }

    fn collect_completed(
        &self,
        registry: &AnalyzerRegistry,
        record: &RunRecord,
        raw: &revet_types::RawOutput,
        collected: &mut Collected,
    ) {
        let Some(analyzer) = registry.get(&record.analyzer_id) else {
            // Registry is immutable during a run, so this means a runner bug.
            log::warn!("no analyzer registered for id '{}'", record.analyzer_id);
            return;
        };

        let parsed = analyzer.parse(raw, &record.target);
        collected.positives.extend(parsed.positives);

        for draft in parsed.findings {
            let confidence = draft.confidence.unwrap_or(record.base_confidence).min(100);
            let id = Self::finding_id(
                &record.analyzer_id,
                &record.target.path,
                draft.line,
                &draft.message,
            );
            collected.findings.push(Finding {
                id,
                analyzer_id: record.analyzer_id.clone(),
                category: record.category,
                severity: draft.severity,
                confidence,
                file: record.target.path.clone(),
                line: draft.line,
                message: draft.message,
                evidence: draft.evidence,
                suggested_fix: draft.suggested_fix,
                status: FindingStatus::Pending,
                new: false,
            });
        }
    }
}

/// One synthetic finding per absorbed analyzer failure
///
/// Tooling findings are pinned at confidence 100 and carry the `tooling`
/// category, which exempts them from the validation catalog: a broken
/// analyzer must always be visible.
fn tooling_finding(record: &RunRecord, message: String) -> Finding {
    let id = FindingCollector::finding_id(
        &record.analyzer_id,
        &record.target.path,
        None,
        &message,
    );
    Finding {
        id,
        analyzer_id: record.analyzer_id.clone(),
        category: Category::Tooling,
        severity: Severity::Warning,
        confidence: 100,
        file: record.target.path.clone(),
        line: None,
        message,
        evidence: None,
        suggested_fix: None,
        status: FindingStatus::Pending,
        new: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::FixedFinding;
    use revet_types::{ChangeKind, RawOutput, Target};
    use std::path::PathBuf;

    fn record(analyzer_id: &str, path: &str, outcome: RawOutcome) -> RunRecord {
        RunRecord {
            analyzer_id: analyzer_id.into(),
            category: Category::Security,
            base_confidence: 90,
            target: Target::new(path, ChangeKind::Modified),
            outcome,
        }
    }

    #[test]
    fn test_finding_id_is_stable_and_input_sensitive() {
        let file = PathBuf::from("src/lib.rs");
        let a = FindingCollector::finding_id("secrets", &file, Some(10), "hardcoded key");
        let b = FindingCollector::finding_id("secrets", &file, Some(10), "hardcoded key");
        let c = FindingCollector::finding_id("secrets", &file, Some(11), "hardcoded key");
        let d = FindingCollector::finding_id("other", &file, Some(10), "hardcoded key");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_completed_output_parsed_into_findings() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(FixedFinding {
            analyzer_id: "fixed".into(),
            severity: revet_types::Severity::Critical,
            confidence: 95,
            message: "x".into(),
            only_path_containing: None,
        });

        let batch = RunBatch {
            records: vec![record(
                "fixed",
                "a.rs",
                RawOutcome::Completed(RawOutput::from_lines(vec!["issue here".into()])),
            )],
            incomplete: false,
        };

        let collected = FindingCollector.collect(&registry, &batch);
        assert_eq!(collected.findings.len(), 1);
        let finding = &collected.findings[0];
        assert_eq!(finding.analyzer_id, "fixed");
        assert_eq!(finding.confidence, 90); // record's base, no override
        assert_eq!(finding.status, FindingStatus::Pending);
        assert!(!finding.id.is_empty());
        assert_eq!(collected.tooling_errors, 0);
    }

    #[test]
    fn test_timeout_becomes_exactly_one_tooling_finding() {
        let registry = AnalyzerRegistry::new();
        let batch = RunBatch {
            records: vec![record("slow", "a.rs", RawOutcome::TimedOut { limit_ms: 50 })],
            incomplete: false,
        };

        let collected = FindingCollector.collect(&registry, &batch);
        assert_eq!(collected.findings.len(), 1);
        assert_eq!(collected.tooling_errors, 1);
        let finding = &collected.findings[0];
        assert_eq!(finding.category, Category::Tooling);
        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(finding.confidence, 100);
        assert!(finding.message.contains("timed out after 50ms"));
    }

    #[test]
    fn test_error_becomes_exactly_one_tooling_finding() {
        let registry = AnalyzerRegistry::new();
        let batch = RunBatch {
            records: vec![record(
                "broken",
                "a.rs",
                RawOutcome::Failed {
                    message: "exit code 3".into(),
                },
            )],
            incomplete: false,
        };

        let collected = FindingCollector.collect(&registry, &batch);
        assert_eq!(collected.findings.len(), 1);
        assert_eq!(collected.findings[0].category, Category::Tooling);
        assert!(collected.findings[0].message.contains("exit code 3"));
    }
}
