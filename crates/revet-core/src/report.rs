//! Aggregation of surviving findings into an immutable report
//!
//! Aggregation is a pure function over the collected finding list; nothing
//! here touches global state, and one `Report` value feeds every rendering.

use chrono::Utc;
use colored::Colorize;
use revet_types::{Finding, RenderError, Report, Severity, Summary};
use std::collections::BTreeMap;

use crate::config::ValidationConfig;

/// Groups, deduplicates and summarizes findings into a report
pub struct ReportAggregator<'a> {
    gate: &'a ValidationConfig,
}

impl<'a> ReportAggregator<'a> {
    /// Aggregator deciding pass/fail with the given gate configuration
    pub fn new(gate: &'a ValidationConfig) -> Self {
        Self { gate }
    }

    /// Build the final report
    pub fn aggregate(
        &self,
        run_id: String,
        targets_count: usize,
        findings: Vec<Finding>,
        mut positives: Vec<String>,
        incomplete: bool,
        tooling_errors: usize,
    ) -> Report {
        // Dedup by id, first occurrence wins.
        let mut seen = std::collections::HashSet::new();
        let mut findings: Vec<Finding> = findings
            .into_iter()
            .filter(|f| seen.insert(f.id.clone()))
            .collect();

        findings.sort_by(|a, b| {
            (a.file.as_path(), a.line, a.analyzer_id.as_str(), a.id.as_str())
                .cmp(&(b.file.as_path(), b.line, b.analyzer_id.as_str(), b.id.as_str()))
        });

        positives.sort();
        positives.dedup();

        let mut summary = Summary::default();
        let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
        for finding in &findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Suggestion => summary.suggestion += 1,
            }
            *category_counts
                .entry(finding.category.to_string())
                .or_insert(0) += 1;
        }
        summary.passed = self.passes(&findings, &summary);

        Report {
            run_id,
            generated_at: Utc::now(),
            targets_count,
            summary,
            category_counts,
            findings,
            positive_findings: positives,
            incomplete,
            tooling_errors,
        }
    }

    /// The gate: any finding at or above `fail_on` fails; else a warning
    /// count above the configured ceiling fails; else pass
    fn passes(&self, findings: &[Finding], summary: &Summary) -> bool {
        if findings.iter().any(|f| f.severity >= self.gate.fail_on) {
            return false;
        }
        if let Some(ceiling) = self.gate.max_warnings {
            if summary.warning > ceiling {
                return false;
            }
        }
        true
    }
}

/// Render the report as pretty JSON
pub fn render_json(report: &Report) -> Result<String, RenderError> {
    serde_json::to_string_pretty(report).map_err(|e| RenderError::Json(e.to_string()))
}

/// Render the report as Markdown, mirroring the JSON structure 1:1
pub fn render_markdown(report: &Report) -> String {
    let mut md = String::from("# Analysis Report\n\n");

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Run: {}\n", report.run_id));
    md.push_str(&format!("- Targets: {}\n", report.targets_count));
    md.push_str(&format!("- Critical: {}\n", report.summary.critical));
    md.push_str(&format!("- Warning: {}\n", report.summary.warning));
    md.push_str(&format!("- Suggestion: {}\n", report.summary.suggestion));
    md.push_str(&format!(
        "- Result: **{}**\n",
        if report.summary.passed { "passed" } else { "failed" }
    ));
    if report.incomplete {
        md.push_str("- ⚠ Run was cancelled before all analyzers finished\n");
    }
    if report.tooling_errors > 0 {
        md.push_str(&format!(
            "- ⚠ {} tooling error(s) occurred — results may be incomplete\n",
            report.tooling_errors
        ));
    }
    md.push('\n');

    if !report.findings.is_empty() {
        md.push_str("## Findings\n\n");
        for finding in &report.findings {
            let location = match finding.line {
                Some(line) => format!("{}:{line}", finding.file.display()),
                None => finding.file.display().to_string(),
            };
            md.push_str(&format!(
                "### [{}] {} — {}\n\n",
                finding.severity, finding.category, location
            ));
            md.push_str(&format!("{}\n\n", finding.message));
            md.push_str(&format!(
                "- Analyzer: `{}`\n- Confidence: {}\n- Status: {}\n",
                finding.analyzer_id,
                finding.confidence,
                if finding.new { "new" } else { "previously reported" }
            ));
            if let Some(evidence) = &finding.evidence {
                md.push_str(&format!("\n```\n{evidence}\n```\n"));
            }
            if let Some(fix) = &finding.suggested_fix {
                md.push_str(&format!("\nSuggested fix: {fix}\n"));
            }
            md.push('\n');
        }
    }

    if !report.positive_findings.is_empty() {
        md.push_str("## Positive observations\n\n");
        for positive in &report.positive_findings {
            md.push_str(&format!("- {positive}\n"));
        }
        md.push('\n');
    }

    md
}

/// Render the report for the terminal
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();

    let verdict = if report.summary.passed {
        "PASSED".green().bold().to_string()
    } else {
        "FAILED".red().bold().to_string()
    };
    out.push_str(&format!(
        "{verdict}  {} target(s), {} finding(s)\n",
        report.targets_count,
        report.summary.total()
    ));
    out.push_str(&format!(
        "  critical: {}  warning: {}  suggestion: {}\n",
        report.summary.critical.to_string().red(),
        report.summary.warning.to_string().yellow(),
        report.summary.suggestion.to_string().cyan(),
    ));

    if report.incomplete {
        out.push_str(&format!(
            "  {}\n",
            "run was cancelled before all analyzers finished".yellow()
        ));
    }
    if report.tooling_errors > 0 {
        out.push_str(&format!(
            "  {}\n",
            format!(
                "{} tooling error(s) occurred — results may be incomplete",
                report.tooling_errors
            )
            .yellow()
        ));
    }

    for finding in &report.findings {
        let severity = match finding.severity {
            Severity::Critical => "critical".red().bold().to_string(),
            Severity::Warning => "warning".yellow().to_string(),
            Severity::Suggestion => "suggestion".cyan().to_string(),
        };
        let location = match finding.line {
            Some(line) => format!("{}:{line}", finding.file.display()),
            None => finding.file.display().to_string(),
        };
        let marker = if finding.new { "" } else { " (previously reported)" };
        out.push_str(&format!(
            "\n  [{severity}] {location}{marker}\n    {} (analyzer: {}, confidence: {})\n",
            finding.message, finding.analyzer_id, finding.confidence
        ));
        if let Some(fix) = &finding.suggested_fix {
            out.push_str(&format!("    fix: {fix}\n"));
        }
    }

    if !report.positive_findings.is_empty() {
        out.push_str(&format!("\n  {}\n", "Positive observations:".green()));
        for positive in &report.positive_findings {
            out.push_str(&format!("    + {positive}\n"));
        }
    }

    out
}
