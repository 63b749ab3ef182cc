//! revet analysis engine
//!
//! Pipeline: resolver → runner(registry) → collector → validation → report.
//! The orchestrator wires the stages together and owns the run lifecycle.

pub mod collector;
pub mod config;
pub mod history;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod validation;

pub use collector::{Collected, FindingCollector};
pub use config::Config;
pub use history::History;
pub use orchestrator::{Orchestrator, RunMode, RunOutcome};
pub use registry::{Analyzer, AnalyzerRegistry};
pub use report::ReportAggregator;
pub use resolver::{TargetResolver, TargetSelection};
pub use runner::{AnalyzerRunner, RunBatch};
pub use validation::{RuleCatalog, ValidationPipeline};
