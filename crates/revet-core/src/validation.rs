//! Confidence-scored finding validation
//!
//! Three stages per finding: existence re-check of the evidence snippet,
//! the false-positive catalog (declarative rules, declaration order),
//! confidence thresholding. A rule may reject a finding but can never raise
//! its severity; findings below the minimum confidence are dropped entirely,
//! not hidden.

use regex::Regex;
use revet_types::{Category, Finding, FindingStatus, RuleError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Declarative rule as written in the catalog TOML
///
/// All present matchers must hold for the rule to apply. `reject` wins over
/// `delta` when both are given.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    /// Stable rule identifier, for logging
    pub id: String,
    /// Optional prose describing the known-safe context
    #[serde(default)]
    pub description: Option<String>,
    /// Restrict the rule to one analyzer
    #[serde(default)]
    pub analyzer: Option<String>,
    /// Restrict the rule to one category
    #[serde(default)]
    pub category: Option<Category>,
    /// Regex matched against the finding's file path
    #[serde(default)]
    pub path_pattern: Option<String>,
    /// Regex matched against the finding's message
    #[serde(default)]
    pub message_pattern: Option<String>,
    /// Force-reject the finding
    #[serde(default)]
    pub reject: bool,
    /// Signed confidence delta applied when the rule matches
    #[serde(default)]
    pub delta: i32,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleEffect {
    Reject,
    Adjust(i32),
}

struct CompiledRule {
    id: String,
    analyzer: Option<String>,
    category: Option<Category>,
    path_re: Option<Regex>,
    message_re: Option<Regex>,
    effect: RuleEffect,
}

impl CompiledRule {
    fn matches(&self, finding: &Finding) -> bool {
        if let Some(analyzer) = &self.analyzer {
            if finding.analyzer_id != *analyzer {
                return false;
            }
        }
        if let Some(category) = self.category {
            if finding.category != category {
                return false;
            }
        }
        if let Some(re) = &self.path_re {
            if !re.is_match(&finding.file.to_string_lossy()) {
                return false;
            }
        }
        if let Some(re) = &self.message_re {
            if !re.is_match(&finding.message) {
                return false;
            }
        }
        true
    }
}

/// The false-positive catalog: an ordered, read-only rule set
///
/// Rules are held in a `Vec` and applied in declaration order, so rule
/// interaction is deterministic by construction.
pub struct RuleCatalog {
    rules: Vec<CompiledRule>,
}

impl RuleCatalog {
    /// Compile a list of rule specs, skipping malformed rules
    ///
    /// A rule with an invalid regex is logged and dropped; it never aborts
    /// the run.
    pub fn compile(specs: Vec<RuleSpec>) -> Self {
        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            match compile_rule(spec) {
                Ok(rule) => rules.push(rule),
                Err((id, reason)) => {
                    log::warn!("skipping malformed validation rule '{id}': {reason}");
                }
            }
        }
        Self { rules }
    }

    /// Load and compile a catalog from a TOML file
    pub fn load_from(path: &Path) -> Result<Self, RuleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| RuleError::FileNotFound(path.display().to_string()))?;
        let file: CatalogFile =
            toml::from_str(&content).map_err(|e| RuleError::InvalidFormat(e.to_string()))?;
        log::debug!(
            "loaded {} validation rule(s) from {}",
            file.rules.len(),
            path.display()
        );
        Ok(Self::compile(file.rules))
    }

    /// The built-in catalog shipped with revet
    pub fn builtin() -> Self {
        Self::compile(builtin_rules())
    }

    /// Empty catalog (no contextual suppression)
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Number of usable rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the catalog has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile_rule(spec: RuleSpec) -> Result<CompiledRule, (String, String)> {
    let path_re = match &spec.path_pattern {
        Some(p) => Some(Regex::new(p).map_err(|e| (spec.id.clone(), e.to_string()))?),
        None => None,
    };
    let message_re = match &spec.message_pattern {
        Some(p) => Some(Regex::new(p).map_err(|e| (spec.id.clone(), e.to_string()))?),
        None => None,
    };
    let effect = if spec.reject {
        RuleEffect::Reject
    } else {
        RuleEffect::Adjust(spec.delta)
    };
    Ok(CompiledRule {
        id: spec.id,
        analyzer: spec.analyzer,
        category: spec.category,
        path_re,
        message_re,
        effect,
    })
}

/// Rules shipped with revet, used when no catalog file is configured
///
/// These encode the common known-safe contexts; deltas are data, tunable by
/// replacing the catalog, never constants inside the engine.
fn builtin_rules() -> Vec<RuleSpec> {
    let rule = |id: &str, path: Option<&str>, message: Option<&str>, reject: bool, delta: i32| {
        RuleSpec {
            id: id.into(),
            description: None,
            analyzer: None,
            category: None,
            path_pattern: path.map(Into::into),
            message_pattern: message.map(Into::into),
            reject,
            delta,
        }
    };
    vec![
        rule(
            "test-file-context",
            Some(r"(^|/)tests?(/|$)|_test\.|\.spec\.|/fixtures?(/|$)"),
            None,
            false,
            -30,
        ),
        rule(
            "vendored-code",
            Some(r"(^|/)(vendor|third_party|generated)(/|$)"),
            None,
            false,
            -20,
        ),
        rule(
            "placeholder-secret",
            None,
            Some(r"(?i)(example|placeholder|dummy|changeme|your[-_]?key)"),
            true,
            0,
        ),
        rule(
            "documentation-snippet",
            Some(r"\.(md|markdown|rst|txt)$"),
            None,
            false,
            -25,
        ),
    ]
}

/// Applies existence checks, the rule catalog and confidence thresholding
pub struct ValidationPipeline<'a> {
    catalog: &'a RuleCatalog,
    min_confidence: u8,
    // Per-run cache of file contents for the existence check.
    file_cache: HashMap<PathBuf, Option<String>>,
}

impl<'a> ValidationPipeline<'a> {
    /// Pipeline with the given catalog and confidence floor
    pub fn new(catalog: &'a RuleCatalog, min_confidence: u8) -> Self {
        Self {
            catalog,
            min_confidence,
            file_cache: HashMap::new(),
        }
    }

    /// Validate a batch of findings, returning the survivors
    ///
    /// Deterministic: identical findings, rule set and file contents always
    /// produce an identical survivor list.
    pub fn validate(&mut self, findings: Vec<Finding>) -> Vec<Finding> {
        let mut survivors = Vec::with_capacity(findings.len());
        for finding in findings {
            if let Some(survivor) = self.validate_one(finding) {
                survivors.push(survivor);
            }
        }
        survivors
    }

    fn validate_one(&mut self, mut finding: Finding) -> Option<Finding> {
        // Tooling failures are exempt from suppression: a broken analyzer
        // must always be visible in the report.
        if finding.category == Category::Tooling {
            finding.status = FindingStatus::Validated;
            return Some(finding);
        }

        if !self.evidence_still_present(&finding) {
            log::debug!(
                "rejecting stale finding {} ({}:{})",
                finding.id,
                finding.file.display(),
                finding.line.unwrap_or(0)
            );
            finding.status = FindingStatus::Rejected;
            return None;
        }

        let base = finding.confidence as i32;
        let mut delta_sum = 0i32;
        for rule in &self.catalog.rules {
            if !rule.matches(&finding) {
                continue;
            }
            match rule.effect {
                RuleEffect::Reject => {
                    log::debug!("finding {} rejected by rule '{}'", finding.id, rule.id);
                    finding.status = FindingStatus::Rejected;
                    return None;
                }
                RuleEffect::Adjust(delta) => {
                    log::debug!(
                        "rule '{}' adjusts finding {} by {delta}",
                        rule.id,
                        finding.id
                    );
                    delta_sum += delta;
                }
            }
        }

        let final_confidence = (base + delta_sum).clamp(0, 100) as u8;
        if final_confidence < self.min_confidence {
            log::debug!(
                "dropping finding {} below confidence floor ({final_confidence} < {})",
                finding.id,
                self.min_confidence
            );
            return None;
        }

        finding.status = if final_confidence < finding.confidence {
            FindingStatus::Downgraded
        } else {
            FindingStatus::Validated
        };
        finding.confidence = final_confidence;
        Some(finding)
    }

    /// Re-verify the evidence snippet against the current file content
    ///
    /// Guards against stale findings referencing content already changed.
    /// Findings without evidence or a line number are taken at face value.
    fn evidence_still_present(&mut self, finding: &Finding) -> bool {
        let (Some(evidence), Some(line)) = (&finding.evidence, finding.line) else {
            return true;
        };

        let content = self
            .file_cache
            .entry(finding.file.clone())
            .or_insert_with(|| std::fs::read_to_string(&finding.file).ok());

        let Some(content) = content else {
            // File unreadable or deleted since the analyzer ran.
            return false;
        };

        content
            .lines()
            .nth(line.saturating_sub(1) as usize)
            .map(|l| l.contains(evidence.trim()))
            .unwrap_or(false)
    }
}
