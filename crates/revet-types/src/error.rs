//! Error types for revet
//!
//! Analyzer execution failures are deliberately absent here: a crashed or
//! timed-out analyzer is data (`RawOutcome`), absorbed into the finding
//! stream, never an error that aborts the run.

use thiserror::Error;

/// revet specific error types with detailed variants
#[derive(Debug, Error)]
pub enum RevetError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Target resolution errors (the only fatal pre-analysis errors)
    #[error("Target resolution error: {0}")]
    Target(#[from] TargetError),

    /// Validation rule catalog errors
    #[error("Rule catalog error: {0}")]
    Rule(#[from] RuleError),

    /// Report rendering errors
    #[error("Report rendering error: {0}")]
    Render(#[from] RenderError),

    /// Finding history errors
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

/// Configuration error details
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Target resolution error details
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Path not found: {0}")]
    PathNotFound(String),
    #[error("Git command failed: {0}")]
    GitCommandFailed(String),
    #[error("Directory traversal failed: {0}")]
    DirectoryTraversal(String),
    #[error("No targets to analyze")]
    Empty,
}

/// Rule catalog error details
///
/// A single malformed rule is skipped and logged, never fatal; these variants
/// cover the catalog file itself being unusable.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule catalog not found: {0}")]
    FileNotFound(String),
    #[error("Invalid rule catalog format: {0}")]
    InvalidFormat(String),
}

/// Report rendering error details
///
/// Fatal only for the requested output format; the structured report remains
/// available as a JSON fallback.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON serialization failed: {0}")]
    Json(String),
    #[error("Failed to write report to {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Finding history error details
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to read history: {0}")]
    ReadFailed(String),
    #[error("Failed to persist history: {0}")]
    WriteFailed(String),
}

/// Result type for revet operations
pub type Result<T> = std::result::Result<T, RevetError>;
