//! Subcommand handlers

pub mod analyze;
pub mod analyzers;
pub mod history;

/// Result type shared by all handlers; the value is the process exit code
pub type HandlerResult =
    std::result::Result<i32, Box<dyn std::error::Error + Send + Sync + 'static>>;
