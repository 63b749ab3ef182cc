//! Unresolved merge-conflict marker detection

use async_trait::async_trait;
use revet_core::Analyzer;
use revet_types::{Category, ParsedOutput, RawOutput, Result, Severity, Target};

use crate::record;

/// Flags leftover `<<<<<<<` / `>>>>>>>` conflict markers
pub struct ConflictMarkerScan;

#[async_trait]
impl Analyzer for ConflictMarkerScan {
    fn id(&self) -> &str {
        "conflict-markers"
    }

    fn name(&self) -> &str {
        "merge conflict marker scan"
    }

    fn category(&self) -> Category {
        Category::Correctness
    }

    fn base_confidence(&self) -> u8 {
        98
    }

    fn applies_to(&self, target: &Target) -> bool {
        !target.is_deleted() && target.language.is_some()
    }

    async fn run(&self, target: &Target) -> Result<RawOutput> {
        let content = tokio::fs::read_to_string(&target.path).await?;
        let lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                line.starts_with("<<<<<<< ") || line.starts_with(">>>>>>> ")
            })
            .map(|(idx, line)| record::encode(idx as u32 + 1, "conflict-marker", line))
            .collect();
        Ok(RawOutput::from_lines(lines))
    }

    fn parse(&self, raw: &RawOutput, _target: &Target) -> ParsedOutput {
        ParsedOutput::from_findings(
            raw.lines
                .iter()
                .filter_map(|encoded| record::decode(encoded))
                .map(|(line, _, snippet)| {
                    record::draft(
                        Severity::Critical,
                        "unresolved merge conflict marker".into(),
                        line,
                        snippet,
                    )
                    .with_fix("resolve the conflict and remove the markers")
                })
                .collect(),
        )
    }
}
