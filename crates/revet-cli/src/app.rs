//! CLI application structure

use crate::args::{Args, Command};
use revet_core::Config;

type CliResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync + 'static>>;

/// revet CLI application entry point
pub struct CliApp {
    args: Args,
    config: Option<Config>,
}

impl CliApp {
    /// New application instance over parsed arguments
    pub fn new(args: Args) -> Self {
        Self { args, config: None }
    }

    /// Load configuration before dispatching
    pub fn initialize(&mut self) -> CliResult<()> {
        let loaded = match &self.args.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        };
        match loaded {
            Ok(config) => {
                self.config = Some(config);
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ failed to load configuration: {e}");
                eprintln!("💡 check ~/.config/revet/config.toml or pass --config");
                Err(format!("configuration load failed: {e}").into())
            }
        }
    }

    /// Dispatch the subcommand; returns the process exit code
    pub async fn run(&self) -> CliResult<i32> {
        let config = self
            .config
            .clone()
            .ok_or("configuration not initialized")?;
        match &self.args.command {
            Command::Analyze { .. } => {
                crate::handlers::analyze::handle_command(&config, &self.args.command).await
            }
            Command::Analyzers => crate::handlers::analyzers::handle_command(),
            Command::History { .. } => {
                crate::handlers::history::handle_command(&config, &self.args.command)
            }
        }
    }
}
