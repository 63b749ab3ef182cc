//! `revet analyzers` handler

use crate::handlers::HandlerResult;
use colored::Colorize;

/// Print the builtin analyzer roster
pub fn handle_command() -> HandlerResult {
    let registry = revet_analyzers::builtin_registry();

    println!("{}", "Registered analyzers:".bold());
    for analyzer in registry.all() {
        println!(
            "  {:<22} {:<26} {:<12} base confidence {}",
            analyzer.id().cyan(),
            analyzer.name(),
            analyzer.category().to_string(),
            analyzer.base_confidence()
        );
    }
    println!("\n{} analyzers registered", registry.len());

    Ok(0)
}
