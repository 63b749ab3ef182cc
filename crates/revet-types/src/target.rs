//! Targets under analysis and their classification

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a target changed relative to the review baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Newly added file
    Added,
    /// Existing file with modifications (also used for full-tree scans)
    Modified,
    /// File deleted in this change set
    Deleted,
}

/// Source language of a target, inferred from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Rust
    Rust,
    /// Python
    Python,
    /// JavaScript
    JavaScript,
    /// TypeScript
    TypeScript,
    /// Java
    Java,
    /// Go
    Go,
    /// C
    C,
    /// C++
    Cpp,
    /// PHP
    Php,
    /// Ruby
    Ruby,
    /// Shell scripts
    Shell,
    /// Markdown documents
    Markdown,
    /// TOML configuration
    Toml,
    /// YAML configuration
    Yaml,
    /// JSON documents
    Json,
}

impl Language {
    /// Infer the language from a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "rs" => Some(Language::Rust),
            "py" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            "java" => Some(Language::Java),
            "go" => Some(Language::Go),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
            "php" => Some(Language::Php),
            "rb" => Some(Language::Ruby),
            "sh" | "bash" | "zsh" => Some(Language::Shell),
            "md" | "markdown" => Some(Language::Markdown),
            "toml" => Some(Language::Toml),
            "yml" | "yaml" => Some(Language::Yaml),
            "json" => Some(Language::Json),
            _ => None,
        }
    }

    /// Infer the language from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// A single file under review within one orchestration run
///
/// Targets are ephemeral: created by the resolver at the start of a run and
/// discarded once the run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Path relative to the analysis root
    pub path: PathBuf,
    /// How the file changed relative to the review baseline
    pub change_kind: ChangeKind,
    /// Inferred language, when the extension is recognized
    pub language: Option<Language>,
}

impl Target {
    /// Create a target, inferring the language from the path
    pub fn new(path: impl Into<PathBuf>, change_kind: ChangeKind) -> Self {
        let path = path.into();
        let language = Language::from_path(&path);
        Self {
            path,
            change_kind,
            language,
        }
    }

    /// Whether the target still exists on disk (deleted targets do not)
    pub fn is_deleted(&self) -> bool {
        self.change_kind == ChangeKind::Deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("bin"), None);
    }

    #[test]
    fn test_target_infers_language() {
        let target = Target::new("src/main.rs", ChangeKind::Modified);
        assert_eq!(target.language, Some(Language::Rust));
        assert!(!target.is_deleted());
    }

    #[test]
    fn test_deleted_target() {
        let target = Target::new("gone.py", ChangeKind::Deleted);
        assert!(target.is_deleted());
    }
}
