//! The analyzer plugin boundary and its registry
//!
//! The engine never inspects analyzer-internal logic; it calls
//! `applies_to`, `run` and `parse`, and applies timeouts around `run`.

use async_trait::async_trait;
use revet_types::{Category, ParsedOutput, RawOutput, Result, Target};
use std::sync::Arc;
use std::time::Duration;

/// A pluggable check that inspects a target and emits raw output
///
/// Implementations are registered at startup and immutable during a run.
/// `run` may spawn a process or stay in-process; either way its failure is
/// absorbed by the runner, never propagated.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Stable identifier, part of every finding id this analyzer produces
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Category stamped onto every finding this analyzer produces
    fn category(&self) -> Category;

    /// Base confidence for findings without a per-finding override
    fn base_confidence(&self) -> u8 {
        80
    }

    /// Per-invocation time budget; `None` uses the configured default
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Whether this analyzer wants to inspect the given target
    fn applies_to(&self, target: &Target) -> bool;

    /// Inspect the target and produce raw, unnormalized output
    async fn run(&self, target: &Target) -> Result<RawOutput>;

    /// Convert raw output into findings and positive observations
    fn parse(&self, raw: &RawOutput, target: &Target) -> ParsedOutput;
}

/// Holds the analyzers registered for this process
///
/// Registration order is preserved; result ordering is made deterministic by
/// the runner's post-join sort, not by the registry.
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an analyzer
    pub fn register<A: Analyzer + 'static>(&mut self, analyzer: A) {
        log::debug!("registered analyzer '{}'", analyzer.id());
        self.analyzers.push(Arc::new(analyzer));
    }

    /// Look up an analyzer by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.iter().find(|a| a.id() == id).cloned()
    }

    /// All registered analyzers
    pub fn all(&self) -> &[Arc<dyn Analyzer>] {
        &self.analyzers
    }

    /// Analyzers whose `applies_to` holds for the target
    pub fn applicable(&self, target: &Target) -> Vec<Arc<dyn Analyzer>> {
        self.analyzers
            .iter()
            .filter(|a| a.applies_to(target))
            .cloned()
            .collect()
    }

    /// Number of registered analyzers
    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Small analyzers used across the engine's unit tests

    use super::*;
    use revet_types::{FindingDraft, RevetError, Severity};

    /// Emits one fixed finding per target it applies to
    pub struct FixedFinding {
        pub analyzer_id: String,
        pub severity: Severity,
        pub confidence: u8,
        pub message: String,
        pub only_path_containing: Option<String>,
    }

    #[async_trait]
    impl Analyzer for FixedFinding {
        fn id(&self) -> &str {
            &self.analyzer_id
        }
        fn name(&self) -> &str {
            "fixed finding"
        }
        fn category(&self) -> Category {
            Category::Security
        }
        fn base_confidence(&self) -> u8 {
            self.confidence
        }
        fn applies_to(&self, target: &Target) -> bool {
            match &self.only_path_containing {
                Some(fragment) => target.path.to_string_lossy().contains(fragment.as_str()),
                None => true,
            }
        }
        async fn run(&self, _target: &Target) -> Result<RawOutput> {
            Ok(RawOutput::from_lines(vec![self.message.clone()]))
        }
        fn parse(&self, raw: &RawOutput, _target: &Target) -> ParsedOutput {
            ParsedOutput::from_findings(
                raw.lines
                    .iter()
                    .map(|m| FindingDraft::new(self.severity, m.clone()).at_line(1))
                    .collect(),
            )
        }
    }

    /// Always returns an error from `run`
    pub struct AlwaysFails;

    #[async_trait]
    impl Analyzer for AlwaysFails {
        fn id(&self) -> &str {
            "always-fails"
        }
        fn name(&self) -> &str {
            "always fails"
        }
        fn category(&self) -> Category {
            Category::Correctness
        }
        fn applies_to(&self, _target: &Target) -> bool {
            true
        }
        async fn run(&self, _target: &Target) -> Result<RawOutput> {
            Err(RevetError::Other("boom".into()))
        }
        fn parse(&self, _raw: &RawOutput, _target: &Target) -> ParsedOutput {
            ParsedOutput::default()
        }
    }

    /// Sleeps past its own declared timeout
    pub struct Sleepy {
        pub sleep: Duration,
        pub budget: Duration,
    }

    #[async_trait]
    impl Analyzer for Sleepy {
        fn id(&self) -> &str {
            "sleepy"
        }
        fn name(&self) -> &str {
            "sleepy"
        }
        fn category(&self) -> Category {
            Category::Performance
        }
        fn timeout(&self) -> Option<Duration> {
            Some(self.budget)
        }
        fn applies_to(&self, _target: &Target) -> bool {
            true
        }
        async fn run(&self, _target: &Target) -> Result<RawOutput> {
            tokio::time::sleep(self.sleep).await;
            Ok(RawOutput::empty())
        }
        fn parse(&self, _raw: &RawOutput, _target: &Target) -> ParsedOutput {
            ParsedOutput::default()
        }
    }
}
