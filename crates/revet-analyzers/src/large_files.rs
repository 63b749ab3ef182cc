//! Oversized source file check

use async_trait::async_trait;
use revet_core::Analyzer;
use revet_types::{Category, ParsedOutput, RawOutput, Result, Severity, Target};

/// Default size above which a source file draws a suggestion, in bytes
pub const DEFAULT_LIMIT_BYTES: u64 = 400_000;

/// Suggests splitting files that have grown past a size limit
pub struct LargeFileCheck {
    limit_bytes: u64,
}

impl LargeFileCheck {
    /// Check with an explicit size limit
    pub fn with_limit(limit_bytes: u64) -> Self {
        Self { limit_bytes }
    }
}

impl Default for LargeFileCheck {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT_BYTES)
    }
}

#[async_trait]
impl Analyzer for LargeFileCheck {
    fn id(&self) -> &str {
        "large-files"
    }

    fn name(&self) -> &str {
        "large file check"
    }

    fn category(&self) -> Category {
        Category::Performance
    }

    fn base_confidence(&self) -> u8 {
        90
    }

    fn applies_to(&self, target: &Target) -> bool {
        !target.is_deleted() && target.language.is_some()
    }

    async fn run(&self, target: &Target) -> Result<RawOutput> {
        let size = tokio::fs::metadata(&target.path).await?.len();
        if size > self.limit_bytes {
            Ok(RawOutput::from_lines(vec![format!(
                "{size}\t{}",
                self.limit_bytes
            )]))
        } else {
            Ok(RawOutput::empty())
        }
    }

    fn parse(&self, raw: &RawOutput, _target: &Target) -> ParsedOutput {
        let findings = raw
            .lines
            .iter()
            .filter_map(|line| {
                let (size, limit) = line.split_once('\t')?;
                Some(
                    revet_types::FindingDraft::new(
                        Severity::Suggestion,
                        format!("file is {size} bytes, above the {limit} byte limit"),
                    )
                    .with_fix("consider splitting the file into smaller modules"),
                )
            })
            .collect();
        ParsedOutput::from_findings(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revet_types::ChangeKind;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_over_limit_draws_suggestion() {
        let mut file = tempfile::Builder::new().suffix(".rs").tempfile().unwrap();
        write!(file, "{}", "x".repeat(64)).unwrap();
        let target = Target::new(file.path(), ChangeKind::Modified);

        let check = LargeFileCheck::with_limit(32);
        let raw = check.run(&target).await.unwrap();
        let output = check.parse(&raw, &target);
        assert_eq!(output.findings.len(), 1);
        assert_eq!(output.findings[0].severity, Severity::Suggestion);
        assert!(output.findings[0].message.contains("64 bytes"));
    }

    #[tokio::test]
    async fn test_file_under_limit_is_clean() {
        let mut file = tempfile::Builder::new().suffix(".rs").tempfile().unwrap();
        write!(file, "short").unwrap();
        let target = Target::new(file.path(), ChangeKind::Modified);

        let check = LargeFileCheck::default();
        let raw = check.run(&target).await.unwrap();
        assert!(check.parse(&raw, &target).findings.is_empty());
    }
}
