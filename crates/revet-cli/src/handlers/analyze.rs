//! `revet analyze` handler

use crate::args::{Command, Format};
use crate::handlers::HandlerResult;
use revet_core::{
    report, Config, History, Orchestrator, RuleCatalog, TargetSelection,
};
use revet_types::{RenderError, Report};
use tokio::sync::watch;

/// Run the analysis pipeline and render the report
pub async fn handle_command(config: &Config, command: &Command) -> HandlerResult {
    let Command::Analyze {
        paths,
        staged,
        parallel,
        min_confidence,
        fail_on,
        mode,
        format,
        output,
        rules,
        no_history,
    } = command
    else {
        return Err("invalid command for analyze handler".into());
    };

    // CLI flags override the configuration file.
    let mut config = config.clone();
    if let Some(parallel) = parallel {
        config.run.parallel = *parallel;
    }
    if let Some(min_confidence) = min_confidence {
        config.validation.min_confidence = (*min_confidence).min(100);
    }
    if let Some(fail_on) = fail_on {
        config.validation.fail_on = (*fail_on).into();
    }
    if let Some(rules) = rules {
        config.validation.rules_path = Some(rules.clone());
    }

    let selection = if *staged {
        TargetSelection::Staged
    } else if !paths.is_empty() {
        TargetSelection::Paths(paths.clone())
    } else {
        TargetSelection::WorkingTree
    };

    let catalog = load_catalog(&config)?;
    let registry = revet_analyzers::builtin_registry();

    let mut orchestrator = Orchestrator::new(config.clone(), registry, catalog);
    if config.history.enabled && !no_history {
        let path = config
            .history
            .path
            .clone()
            .unwrap_or_else(History::default_path);
        orchestrator = orchestrator.with_history(History::load(path)?);
    }

    // SIGINT flips the cancellation signal; the orchestrator drains
    // in-flight analyzers and still renders a partial report.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let root = std::env::current_dir()?;
    let outcome = orchestrator
        .run(root, &selection, (*mode).into(), cancel_rx)
        .await?;

    emit(&outcome.report, *format, output.as_deref()).await;

    if outcome.exit_code == revet_core::orchestrator::EXIT_BLOCKED {
        eprintln!(
            "❌ blocked by {} finding(s) at or above the {} gate",
            blocking_count(&outcome.report, config.validation.fail_on),
            config.validation.fail_on
        );
    } else if outcome.report.has_tooling_errors() {
        eprintln!("⚠ tooling errors occurred — results may be incomplete");
    }

    Ok(outcome.exit_code)
}

fn blocking_count(report_value: &Report, gate: revet_types::Severity) -> usize {
    report_value
        .findings
        .iter()
        .filter(|f| f.severity >= gate)
        .count()
}

/// Write the report in the requested format; a render or write failure
/// falls back to structured JSON on stdout so the report is never lost.
async fn emit(report_value: &Report, format: Format, output: Option<&std::path::Path>) {
    let rendered = match render(report_value, format) {
        Ok(rendered) => rendered,
        Err(e) => {
            log::error!("failed to render {format:?} output: {e}");
            fallback_json(report_value);
            return;
        }
    };
    match output {
        Some(path) => {
            if let Err(e) = write_report(path, rendered).await {
                log::error!("{e}");
                fallback_json(report_value);
            }
        }
        None => print!("{rendered}"),
    }
}

async fn write_report(path: &std::path::Path, rendered: String) -> Result<(), RenderError> {
    tokio::fs::write(path, rendered)
        .await
        .map_err(|e| RenderError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

fn fallback_json(report_value: &Report) {
    if let Ok(json) = report::render_json(report_value) {
        println!("{json}");
    }
}


fn render(
    report_value: &Report,
    format: Format,
) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync + 'static>> {
    match format {
        Format::Json => Ok(report::render_json(report_value)? + "\n"),
        Format::Markdown => Ok(report::render_markdown(report_value)),
        Format::Text => Ok(report::render_text(report_value)),
    }
}

fn load_catalog(
    config: &Config,
) -> std::result::Result<RuleCatalog, Box<dyn std::error::Error + Send + Sync + 'static>> {
    if let Some(path) = &config.validation.rules_path {
        return Ok(RuleCatalog::load_from(path)?);
    }
    if let Some(default) = Config::default_config_path()
        .and_then(|p| p.parent().map(|d| d.join("rules.toml")))
        .filter(|p| p.is_file())
    {
        return Ok(RuleCatalog::load_from(&default)?);
    }
    Ok(RuleCatalog::builtin())
}
