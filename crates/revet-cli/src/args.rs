//! Command-line argument definitions

use clap::{Parser, ValueEnum};
use revet_core::RunMode as CoreRunMode;
use revet_types::Severity;
use std::path::PathBuf;

/// revet - parallel static analysis with confidence-scored findings
#[derive(Parser, Debug)]
#[command(name = "revet")]
#[command(about = "Parallel static analysis with confidence-scored finding validation")]
pub struct Args {
    /// Subcommand
    #[command(subcommand)]
    pub command: Command,

    /// Use an explicit configuration file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub enum Command {
    /// Run the analysis pipeline over the selected targets
    Analyze {
        /// Analyze these files or directories
        #[arg(long, num_args = 1.., value_name = "PATH")]
        paths: Vec<PathBuf>,
        /// Analyze the files staged in the git index
        #[arg(long, conflicts_with = "paths")]
        staged: bool,
        /// Worker pool size (default: available cores)
        #[arg(long)]
        parallel: Option<usize>,
        /// Minimum post-validation confidence for a finding to survive
        #[arg(long)]
        min_confidence: Option<u8>,
        /// Severity at or above which the run fails
        #[arg(long, value_enum)]
        fail_on: Option<FailOn>,
        /// Whether a failing report yields a non-zero exit code
        #[arg(long, value_enum, default_value = "blocking")]
        mode: Mode,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Use this validation rule catalog instead of the default
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Do not record finding ids in the seen-finding history
        #[arg(long)]
        no_history: bool,
    },
    /// List the registered analyzers
    Analyzers,
    /// Show previously seen finding ids
    History {
        /// Show at most this many ids
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

/// Exit-code behavior for a failing report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Non-zero exit code when the gate is met (pre-commit/CI)
    Blocking,
    /// Always exit 0; the failure summary is still printed
    WarnOnly,
}

impl From<Mode> for CoreRunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Blocking => CoreRunMode::Blocking,
            Mode::WarnOnly => CoreRunMode::WarnOnly,
        }
    }
}

/// Gate severity selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    /// Fail only on critical findings
    Critical,
    /// Fail on warnings and critical findings
    Warning,
    /// Fail on any finding
    Suggestion,
}

impl From<FailOn> for Severity {
    fn from(fail_on: FailOn) -> Self {
        match fail_on {
            FailOn::Critical => Severity::Critical,
            FailOn::Warning => Severity::Warning,
            FailOn::Suggestion => Severity::Suggestion,
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Colored terminal rendering
    Text,
    /// Structured JSON report
    Json,
    /// Markdown mirroring the JSON structure
    Markdown,
}
