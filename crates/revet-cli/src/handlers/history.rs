//! `revet history` handler

use crate::args::Command;
use crate::handlers::HandlerResult;
use revet_core::{Config, History};

/// Print previously recorded finding ids
pub fn handle_command(config: &Config, command: &Command) -> HandlerResult {
    let Command::History { limit } = command else {
        return Err("invalid command for history handler".into());
    };

    let path = config
        .history
        .path
        .clone()
        .unwrap_or_else(History::default_path);
    let history = History::load(&path)?;

    if history.is_empty() {
        println!("no findings recorded yet ({})", path.display());
        return Ok(0);
    }

    println!(
        "{} finding id(s) recorded in {}",
        history.len(),
        path.display()
    );
    for id in history.ids().take(*limit) {
        println!("  {id}");
    }
    if history.len() > *limit {
        println!("  ... and {} more", history.len() - *limit);
    }

    Ok(0)
}
