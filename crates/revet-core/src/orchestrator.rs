//! End-to-end run orchestration
//!
//! Drives resolver → runner → collector → validation → aggregation, owns the
//! run-level timeout and cancellation, and maps the report to a process exit
//! code. There are no retries: analyzers are assumed cheap and idempotent,
//! a failed run is simply re-invoked by the caller.

use revet_types::{Report, Result};
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

use crate::collector::FindingCollector;
use crate::config::Config;
use crate::history::History;
use crate::registry::AnalyzerRegistry;
use crate::report::ReportAggregator;
use crate::resolver::{TargetResolver, TargetSelection};
use crate::runner::AnalyzerRunner;
use crate::validation::{RuleCatalog, ValidationPipeline};

/// Exit code for a passing run (or any warn-only run)
pub const EXIT_PASS: i32 = 0;
/// Exit code when non-blocking findings are present
pub const EXIT_FINDINGS: i32 = 1;
/// Exit code when the blocking gate is met
pub const EXIT_BLOCKED: i32 = 2;

/// How a failing report maps to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Pre-commit/CI gate: a failing report yields a non-zero exit code
    Blocking,
    /// Advisory run: the failure summary is printed but the exit code is 0
    WarnOnly,
}

/// Run lifecycle states, logged as the pipeline advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    ResolvingTargets,
    RunningAnalyzers,
    Collecting,
    Validating,
    Aggregating,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::ResolvingTargets => "resolving-targets",
            RunState::RunningAnalyzers => "running-analyzers",
            RunState::Collecting => "collecting",
            RunState::Validating => "validating",
            RunState::Aggregating => "aggregating",
            RunState::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Result of one orchestrated run
#[derive(Debug)]
pub struct RunOutcome {
    /// The aggregated report
    pub report: Report,
    /// Exit code under the requested mode
    pub exit_code: i32,
}

/// Wires the pipeline together and owns the run lifecycle
pub struct Orchestrator {
    config: Config,
    registry: AnalyzerRegistry,
    catalog: RuleCatalog,
    history: Option<History>,
}

impl Orchestrator {
    /// Orchestrator over the given registry and rule catalog
    pub fn new(config: Config, registry: AnalyzerRegistry, catalog: RuleCatalog) -> Self {
        Self {
            config,
            registry,
            catalog,
            history: None,
        }
    }

    /// Attach a seen-finding history for new-vs-known classification
    pub fn with_history(mut self, history: History) -> Self {
        self.history = Some(history);
        self
    }

    /// Execute one run
    ///
    /// `cancel` is the caller's cancellation signal (e.g. wired to SIGINT).
    /// Cancellation and the run-level timeout both stop new work from being
    /// scheduled and still produce a partial report flagged incomplete; only
    /// target resolution failures abort with an error.
    pub async fn run(
        &mut self,
        root: impl Into<std::path::PathBuf>,
        selection: &TargetSelection,
        mode: RunMode,
        cancel: watch::Receiver<bool>,
    ) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4().to_string();
        let mut state = RunState::Idle;
        log::info!("run {run_id} starting");

        state = self.advance(state, RunState::ResolvingTargets);
        let resolver = TargetResolver::new(root);
        let targets = resolver.resolve(selection).await?;

        // The run-level deadline shares the runner's cancellation channel:
        // when it fires, no new pairs are scheduled and in-flight analyzers
        // get their own per-analyzer budget as the grace period.
        let (deadline_tx, deadline_rx) = watch::channel(false);
        let run_timeout = Duration::from_secs(self.config.run.run_timeout_secs);
        let mut upstream = cancel.clone();
        let deadline = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(run_timeout) => {
                    log::warn!("run-level timeout of {}s reached", run_timeout.as_secs());
                }
                _ = upstream.wait_for(|cancelled| *cancelled) => {
                    log::warn!("cancellation requested, draining in-flight analyzers");
                }
            }
            let _ = deadline_tx.send(true);
        });

        state = self.advance(state, RunState::RunningAnalyzers);
        let runner = AnalyzerRunner::new(
            self.config.run.effective_parallelism(),
            Duration::from_millis(self.config.run.analyzer_timeout_ms),
        );
        let batch = runner.run(&self.registry, &targets, deadline_rx).await;

        // The batch has joined; the deadline watcher must not outlive the run.
        deadline.abort();
        let _ = deadline.await;

        state = self.advance(state, RunState::Collecting);
        let collected = FindingCollector.collect(&self.registry, &batch);

        state = self.advance(state, RunState::Validating);
        let mut pipeline =
            ValidationPipeline::new(&self.catalog, self.config.validation.min_confidence);
        let survivors = pipeline.validate(collected.findings);

        state = self.advance(state, RunState::Aggregating);
        let aggregator = ReportAggregator::new(&self.config.validation);
        let mut report = aggregator.aggregate(
            run_id,
            targets.len(),
            survivors,
            collected.positives,
            batch.incomplete,
            collected.tooling_errors,
        );

        if let Some(history) = &mut self.history {
            history.classify(&mut report.findings);
            history.record(report.findings.iter());
            if let Err(e) = history.save().await {
                // History is a convenience, never worth failing a run over.
                log::warn!("failed to persist finding history: {e}");
            }
        } else {
            for finding in &mut report.findings {
                finding.new = true;
            }
        }

        state = self.advance(state, RunState::Done);
        debug_assert_eq!(state, RunState::Done);

        let exit_code = exit_code(&report, mode);
        log::info!(
            "run {} finished: {} finding(s), passed={}, exit={exit_code}",
            report.run_id,
            report.findings.len(),
            report.summary.passed
        );
        Ok(RunOutcome { report, exit_code })
    }

    fn advance(&self, from: RunState, to: RunState) -> RunState {
        log::debug!("run state {from} -> {to}");
        to
    }
}

/// Map a report to the process exit code for the given mode
pub fn exit_code(report: &Report, mode: RunMode) -> i32 {
    match mode {
        RunMode::WarnOnly => EXIT_PASS,
        RunMode::Blocking => {
            if !report.summary.passed {
                EXIT_BLOCKED
            } else if !report.findings.is_empty() {
                EXIT_FINDINGS
            } else {
                EXIT_PASS
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::{AlwaysFails, FixedFinding, Sleepy};
    use revet_types::{Category, Severity};
    use std::fs;
    use std::time::{Duration, Instant};

    fn no_cancel() -> watch::Receiver<bool> {
        let (_tx, rx) = watch::channel(false);
        rx
    }

    fn secret_analyzer() -> FixedFinding {
        FixedFinding {
            analyzer_id: "hardcoded-secret".into(),
            severity: Severity::Critical,
            confidence: 95,
            message: "hardcoded secret detected".into(),
            only_path_containing: Some("fileA".into()),
        }
    }

    async fn run_with(
        registry: AnalyzerRegistry,
        config: Config,
        mode: RunMode,
        files: &[(&str, &str)],
    ) -> RunOutcome {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let mut orchestrator = Orchestrator::new(config, registry, RuleCatalog::empty());
        orchestrator
            .run(
                dir.path(),
                &TargetSelection::WorkingTree,
                mode,
                no_cancel(),
            )
            .await
            .unwrap()
    }

    // Scenario A: fileA triggers a critical secret finding, fileB is clean.
    #[tokio::test]
    async fn test_scenario_critical_secret_blocks() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(secret_analyzer());

        let outcome = run_with(
            registry,
            Config::default(),
            RunMode::Blocking,
            &[("fileA.rs", "let key = \"AKIA\";"), ("fileB.rs", "fn ok() {}")],
        )
        .await;

        assert_eq!(outcome.report.findings.len(), 1);
        assert_eq!(outcome.report.summary.critical, 1);
        assert!(!outcome.report.summary.passed);
        assert_eq!(outcome.exit_code, EXIT_BLOCKED);
    }

    // Scenario B: a 200ms analyzer under a 50ms budget surfaces as one
    // tooling warning and the run does not wait out the sleep.
    #[tokio::test]
    async fn test_scenario_timeout_is_absorbed() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(Sleepy {
            sleep: Duration::from_millis(200),
            budget: Duration::from_millis(50),
        });

        let start = Instant::now();
        let outcome = run_with(
            registry,
            Config::default(),
            RunMode::Blocking,
            &[("only.rs", "fn main() {}")],
        )
        .await;

        assert!(start.elapsed() < Duration::from_millis(180));
        assert_eq!(outcome.report.tooling_errors, 1);
        let tooling: Vec<_> = outcome
            .report
            .findings
            .iter()
            .filter(|f| f.category == Category::Tooling)
            .collect();
        assert_eq!(tooling.len(), 1);
        assert!(tooling[0].message.contains("timed out"));
        // A tooling warning alone does not meet the critical gate.
        assert!(outcome.report.summary.passed);
        assert_eq!(outcome.exit_code, EXIT_FINDINGS);
    }

    // Scenario C: warn-only mode exits 0 but the structured summary still
    // records the failure.
    #[tokio::test]
    async fn test_scenario_warn_only_exit_zero() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(secret_analyzer());

        let outcome = run_with(
            registry,
            Config::default(),
            RunMode::WarnOnly,
            &[("fileA.rs", "let key = \"AKIA\";")],
        )
        .await;

        assert_eq!(outcome.exit_code, EXIT_PASS);
        assert!(!outcome.report.summary.passed);
    }

    #[tokio::test]
    async fn test_isolation_failing_analyzer_does_not_block_others() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(AlwaysFails);
        registry.register(secret_analyzer());

        let outcome = run_with(
            registry,
            Config::default(),
            RunMode::Blocking,
            &[("fileA.rs", "x")],
        )
        .await;

        let tooling = outcome
            .report
            .findings
            .iter()
            .filter(|f| f.category == Category::Tooling)
            .count();
        assert_eq!(tooling, 1);
        assert_eq!(outcome.report.summary.critical, 1);
        assert!(outcome.report.has_tooling_errors());
    }

    #[tokio::test]
    async fn test_idempotent_reports_modulo_identity() {
        let mut registry_a = AnalyzerRegistry::new();
        registry_a.register(secret_analyzer());
        let mut registry_b = AnalyzerRegistry::new();
        registry_b.register(secret_analyzer());

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fileA.rs"), "let key = \"AKIA\";").unwrap();

        let mut first = Orchestrator::new(Config::default(), registry_a, RuleCatalog::empty());
        let mut second = Orchestrator::new(Config::default(), registry_b, RuleCatalog::empty());
        let mut outcome_a = first
            .run(dir.path(), &TargetSelection::WorkingTree, RunMode::Blocking, no_cancel())
            .await
            .unwrap();
        let mut outcome_b = second
            .run(dir.path(), &TargetSelection::WorkingTree, RunMode::Blocking, no_cancel())
            .await
            .unwrap();

        outcome_a.report.run_id.clear();
        outcome_b.report.run_id.clear();
        outcome_a.report.generated_at = outcome_b.report.generated_at;

        let a = serde_json::to_string(&outcome_a.report).unwrap();
        let b = serde_json::to_string(&outcome_b.report).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_resolution_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = AnalyzerRegistry::new();
        registry.register(secret_analyzer());
        let mut orchestrator =
            Orchestrator::new(Config::default(), registry, RuleCatalog::empty());
        let selection =
            TargetSelection::Paths(vec![std::path::PathBuf::from("does-not-exist.rs")]);
        let result = orchestrator
            .run(dir.path(), &selection, RunMode::Blocking, no_cancel())
            .await;
        assert!(result.is_err());
    }

    // The deadline watcher must terminate with the run instead of sleeping
    // out the full run-level timeout (300s by default).
    #[tokio::test]
    async fn test_deadline_task_does_not_outlive_run() {
        let handle = tokio::runtime::Handle::current();
        let before = handle.metrics().num_alive_tasks();

        let mut registry = AnalyzerRegistry::new();
        registry.register(secret_analyzer());
        let outcome = run_with(
            registry,
            Config::default(),
            RunMode::Blocking,
            &[("fileA.rs", "x")],
        )
        .await;

        assert!(!outcome.report.findings.is_empty());
        assert_eq!(handle.metrics().num_alive_tasks(), before);
    }

    #[tokio::test]
    async fn test_history_marks_repeat_findings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fileA.rs"), "x").unwrap();
        let history_path = dir.path().join("seen");

        for expect_new in [true, false] {
            let mut registry = AnalyzerRegistry::new();
            registry.register(secret_analyzer());
            let mut orchestrator =
                Orchestrator::new(Config::default(), registry, RuleCatalog::empty())
                    .with_history(History::load(&history_path).unwrap());
            let outcome = orchestrator
                .run(dir.path(), &TargetSelection::WorkingTree, RunMode::WarnOnly, no_cancel())
                .await
                .unwrap();
            assert_eq!(outcome.report.findings[0].new, expect_new);
        }
    }
}
