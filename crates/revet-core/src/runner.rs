//! Concurrent execution of `(analyzer, target)` pairs
//!
//! Fault isolation is the primary design property here: a pair that times
//! out or errors yields a synthetic outcome and the batch keeps going. No
//! single analyzer failure may abort the run.

use futures_util::{stream, StreamExt};
use revet_types::{RawOutcome, RunRecord, Target};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::registry::{Analyzer, AnalyzerRegistry};

/// Output of one runner batch
#[derive(Debug)]
pub struct RunBatch {
    /// One record per executed `(analyzer, target)` pair, sorted by
    /// `(analyzer_id, target path)`
    pub records: Vec<RunRecord>,
    /// Set when cancellation stopped pairs from being scheduled
    pub incomplete: bool,
}

/// Executes applicable analyzers concurrently over the resolved targets
pub struct AnalyzerRunner {
    parallelism: usize,
    default_budget: Duration,
}

impl AnalyzerRunner {
    /// Runner with a bounded worker pool of the given size
    ///
    /// `default_budget` applies to every analyzer that does not declare its
    /// own timeout.
    pub fn new(parallelism: usize, default_budget: Duration) -> Self {
        Self {
            parallelism: parallelism.max(1),
            default_budget,
        }
    }

    /// Run every applicable `(analyzer, target)` pair and join the batch
    ///
    /// `cancel` flips to `true` when the caller wants the batch abandoned:
    /// no new pairs are scheduled, in-flight pairs finish within their own
    /// time budget, and the partial batch comes back flagged incomplete.
    pub async fn run(
        &self,
        registry: &AnalyzerRegistry,
        targets: &[Target],
        cancel: watch::Receiver<bool>,
    ) -> RunBatch {
        let pairs: Vec<(Arc<dyn Analyzer>, Target)> = targets
            .iter()
            .flat_map(|t| {
                registry
                    .applicable(t)
                    .into_iter()
                    .map(move |a| (a, t.clone()))
            })
            .collect();

        log::debug!(
            "running {} (analyzer, target) pair(s) with parallelism {}",
            pairs.len(),
            self.parallelism
        );

        let default_budget = self.default_budget;
        let results: Vec<Option<RunRecord>> = stream::iter(pairs)
            .map(|(analyzer, target)| {
                let cancel = cancel.clone();
                async move {
                    if *cancel.borrow() {
                        return None;
                    }
                    Some(execute_pair(analyzer, target, default_budget).await)
                }
            })
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        let mut incomplete = false;
        let mut records = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Some(record) => records.push(record),
                None => incomplete = true,
            }
        }

        // Deterministic hand-off: scheduling order is unspecified, output
        // order is not.
        records.sort_by(|a, b| {
            (a.analyzer_id.as_str(), a.target.path.as_path())
                .cmp(&(b.analyzer_id.as_str(), b.target.path.as_path()))
        });

        RunBatch {
            records,
            incomplete,
        }
    }
}

async fn execute_pair(
    analyzer: Arc<dyn Analyzer>,
    target: Target,
    default_budget: Duration,
) -> RunRecord {
    let budget = analyzer.timeout().unwrap_or(default_budget);
    let outcome = match tokio::time::timeout(budget, analyzer.run(&target)).await {
        Ok(Ok(raw)) => RawOutcome::Completed(raw),
        Ok(Err(e)) => {
            log::warn!(
                "analyzer '{}' failed on {}: {e}",
                analyzer.id(),
                target.path.display()
            );
            RawOutcome::Failed {
                message: e.to_string(),
            }
        }
        Err(_) => {
            log::warn!(
                "analyzer '{}' timed out on {} after {}ms",
                analyzer.id(),
                target.path.display(),
                budget.as_millis()
            );
            RawOutcome::TimedOut {
                limit_ms: budget.as_millis() as u64,
            }
        }
    };

    RunRecord {
        analyzer_id: analyzer.id().to_string(),
        category: analyzer.category(),
        base_confidence: analyzer.base_confidence(),
        target,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::{AlwaysFails, FixedFinding, Sleepy};
    use revet_types::{ChangeKind, Severity};
    use std::time::{Duration, Instant};

    fn targets(paths: &[&str]) -> Vec<Target> {
        paths
            .iter()
            .map(|p| Target::new(*p, ChangeKind::Modified))
            .collect()
    }

    fn no_cancel() -> watch::Receiver<bool> {
        // A dropped sender leaves the last value observable, which is all
        // the runner needs.
        let (_tx, rx) = watch::channel(false);
        rx
    }

    #[tokio::test]
    async fn test_failure_does_not_suppress_other_analyzers() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(AlwaysFails);
        registry.register(FixedFinding {
            analyzer_id: "ok".into(),
            severity: Severity::Warning,
            confidence: 90,
            message: "found".into(),
            only_path_containing: None,
        });

        let runner = AnalyzerRunner::new(4, Duration::from_secs(10));
        let batch = runner.run(&registry, &targets(&["a.rs"]), no_cancel()).await;

        assert_eq!(batch.records.len(), 2);
        assert!(!batch.incomplete);
        assert!(batch
            .records
            .iter()
            .any(|r| matches!(r.outcome, RawOutcome::Failed { .. })));
        assert!(batch
            .records
            .iter()
            .any(|r| matches!(r.outcome, RawOutcome::Completed(_))));
    }

    #[tokio::test]
    async fn test_timeout_yields_synthetic_outcome_quickly() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(Sleepy {
            sleep: Duration::from_millis(200),
            budget: Duration::from_millis(50),
        });

        let runner = AnalyzerRunner::new(2, Duration::from_secs(10));
        let start = Instant::now();
        let batch = runner.run(&registry, &targets(&["a.rs"]), no_cancel()).await;

        assert_eq!(batch.records.len(), 1);
        assert!(matches!(
            batch.records[0].outcome,
            RawOutcome::TimedOut { limit_ms: 50 }
        ));
        // The run must not wait out the full 200ms sleep.
        assert!(start.elapsed() < Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_output_order_is_deterministic() {
        let mut registry = AnalyzerRegistry::new();
        for id in ["zeta", "alpha", "mid"] {
            registry.register(FixedFinding {
                analyzer_id: id.into(),
                severity: Severity::Suggestion,
                confidence: 85,
                message: "m".into(),
                only_path_containing: None,
            });
        }

        let runner = AnalyzerRunner::new(8, Duration::from_secs(10));
        let batch = runner
            .run(&registry, &targets(&["b.rs", "a.rs"]), no_cancel())
            .await;

        let order: Vec<(String, String)> = batch
            .records
            .iter()
            .map(|r| {
                (
                    r.analyzer_id.clone(),
                    r.target.path.to_string_lossy().into_owned(),
                )
            })
            .collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert_eq!(batch.records.len(), 6);
    }

    #[tokio::test]
    async fn test_cancellation_marks_batch_incomplete() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(Sleepy {
            sleep: Duration::from_millis(30),
            budget: Duration::from_millis(500),
        });

        let (tx, rx) = watch::channel(false);
        let many: Vec<String> = (0..32).map(|i| format!("f{i}.rs")).collect();
        let target_list: Vec<Target> = many
            .iter()
            .map(|p| Target::new(p.as_str(), ChangeKind::Modified))
            .collect();

        // Cancel while the serial queue (parallelism 1) is still draining.
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            let _ = tx.send(true);
        });

        let runner = AnalyzerRunner::new(1, Duration::from_secs(10));
        let batch = runner.run(&registry, &target_list, rx).await;

        assert!(batch.incomplete);
        assert!(batch.records.len() < 32);
        assert!(!batch.records.is_empty());
    }
}
