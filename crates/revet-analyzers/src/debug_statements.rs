//! Leftover debug statement detection

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use revet_core::Analyzer;
use revet_types::{Category, Language, ParsedOutput, RawOutput, Result, Severity, Target};

use crate::record;

lazy_static! {
    static ref RUST_DEBUG: Regex = Regex::new(r"\bdbg!\(|^\s*println!\(").unwrap();
    static ref JS_DEBUG: Regex = Regex::new(r"\bconsole\.(log|debug|trace)\(|^\s*debugger\b").unwrap();
    static ref PYTHON_DEBUG: Regex =
        Regex::new(r"\bpdb\.set_trace\(\)|\bbreakpoint\(\)").unwrap();
    static ref PHP_DEBUG: Regex = Regex::new(r"\b(var_dump|print_r|dd)\(").unwrap();
    static ref RUBY_DEBUG: Regex = Regex::new(r"\bbinding\.(pry|irb)\b").unwrap();
}

/// Flags debug statements left behind in committed code
pub struct DebugStatementScan;

impl DebugStatementScan {
    /// New debug statement scanner
    pub fn new() -> Self {
        Self
    }

    fn pattern_for(language: Language) -> Option<&'static Regex> {
        match language {
            Language::Rust => Some(&RUST_DEBUG),
            Language::JavaScript | Language::TypeScript => Some(&JS_DEBUG),
            Language::Python => Some(&PYTHON_DEBUG),
            Language::Php => Some(&PHP_DEBUG),
            Language::Ruby => Some(&RUBY_DEBUG),
            _ => None,
        }
    }
}

impl Default for DebugStatementScan {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for DebugStatementScan {
    fn id(&self) -> &str {
        "debug-statements"
    }

    fn name(&self) -> &str {
        "debug statement scan"
    }

    fn category(&self) -> Category {
        Category::Style
    }

    fn base_confidence(&self) -> u8 {
        85
    }

    fn applies_to(&self, target: &Target) -> bool {
        !target.is_deleted()
            && target.language.map_or(false, |l| Self::pattern_for(l).is_some())
    }

    async fn run(&self, target: &Target) -> Result<RawOutput> {
        let Some(pattern) = target.language.and_then(Self::pattern_for) else {
            return Ok(RawOutput::empty());
        };
        let content = tokio::fs::read_to_string(&target.path).await?;
        let lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| pattern.is_match(line))
            .map(|(idx, line)| record::encode(idx as u32 + 1, "debug-statement", line))
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
                        Severity::Warning,
                        "debug statement left in committed code".into(),
                        line,
                        snippet,
                    )
                    .with_fix("remove it or route it through the logging facade")
                })
                .collect(),
        )
    }
}
