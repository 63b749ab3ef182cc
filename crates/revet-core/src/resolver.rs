//! Target resolution: what set of files is under review
//!
//! Resolution failures are the only fatal, pre-analysis errors; everything
//! after this stage is absorbed into the finding stream.

use revet_types::{ChangeKind, Target, TargetError};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use walkdir::WalkDir;

/// Directory names never descended into during tree walks
const SKIPPED_DIRS: &[&str] = &["target", "node_modules", "vendor", "dist"];

/// How the caller selected the target set
#[derive(Debug, Clone)]
pub enum TargetSelection {
    /// Explicit files or directories
    Paths(Vec<PathBuf>),
    /// Files staged in the git index
    Staged,
    /// Every eligible file under the analysis root
    WorkingTree,
}

/// Resolves the target set for one run
#[derive(Debug, Clone)]
pub struct TargetResolver {
    root: PathBuf,
}

impl TargetResolver {
    /// Resolver rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the selection into a sorted target list
    pub async fn resolve(&self, selection: &TargetSelection) -> Result<Vec<Target>, TargetError> {
        let mut targets = match selection {
            TargetSelection::Paths(paths) => self.resolve_paths(paths)?,
            TargetSelection::Staged => self.resolve_staged().await?,
            TargetSelection::WorkingTree => self.walk_tree(&self.root)?,
        };

        // Stable output regardless of walk or git ordering.
        targets.sort_by(|a, b| a.path.cmp(&b.path));
        targets.dedup_by(|a, b| a.path == b.path);

        if targets.is_empty() {
            return Err(TargetError::Empty);
        }
        log::debug!("resolved {} target(s)", targets.len());
        Ok(targets)
    }

    fn resolve_paths(&self, paths: &[PathBuf]) -> Result<Vec<Target>, TargetError> {
        let mut targets = Vec::new();
        for path in paths {
            let full = if path.is_absolute() {
                path.clone()
            } else {
                self.root.join(path)
            };
            if full.is_file() {
                targets.push(Target::new(full, ChangeKind::Modified));
            } else if full.is_dir() {
                targets.extend(self.walk_tree(&full)?);
            } else {
                return Err(TargetError::PathNotFound(path.display().to_string()));
            }
        }
        Ok(targets)
    }

    async fn resolve_staged(&self) -> Result<Vec<Target>, TargetError> {
        let output = Command::new("git")
            .args(["diff", "--cached", "--name-status"])
            .current_dir(&self.root)
            .output()
            .await
            .map_err(|e| TargetError::GitCommandFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TargetError::GitCommandFailed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_name_status(&stdout, &self.root))
    }

    fn walk_tree(&self, dir: &Path) -> Result<Vec<Target>, TargetError> {
        let mut targets = Vec::new();
        for entry in WalkDir::new(dir).into_iter().filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            let hidden = name.starts_with('.') && name.len() > 1;
            !(e.file_type().is_dir() && (hidden || SKIPPED_DIRS.contains(&name.as_ref())))
        }) {
            let entry = entry.map_err(|e| TargetError::DirectoryTraversal(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            targets.push(Target::new(entry.path(), ChangeKind::Modified));
        }
        Ok(targets)
    }
}

/// Parse `git diff --name-status` output into targets
fn parse_name_status(output: &str, root: &Path) -> Vec<Target> {
    let mut targets = Vec::new();
    for line in output.lines() {
        let mut parts = line.split('\t');
        let status = match parts.next() {
            Some(s) if !s.is_empty() => s,
            _ => continue,
        };
        // Renames and copies report two paths; the new one is under review.
        let path = match status.chars().next() {
            Some('R') | Some('C') => parts.nth(1),
            _ => parts.next(),
        };
        let Some(path) = path else { continue };
        let kind = match status.chars().next() {
            Some('A') => ChangeKind::Added,
            Some('D') => ChangeKind::Deleted,
            _ => ChangeKind::Modified,
        };
        targets.push(Target::new(root.join(path), kind));
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_missing_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = TargetResolver::new(dir.path());
        let selection = TargetSelection::Paths(vec![PathBuf::from("no-such-file.rs")]);
        let err = resolver.resolve(&selection).await.unwrap_err();
        assert!(matches!(err, TargetError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn test_explicit_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.py"), "pass").unwrap();

        let resolver = TargetResolver::new(dir.path());
        let selection =
            TargetSelection::Paths(vec![PathBuf::from("a.rs"), PathBuf::from("sub")]);
        let targets = resolver.resolve(&selection).await.unwrap();
        assert_eq!(targets.len(), 2);
        // Sorted by path, so a.rs first.
        assert!(targets[0].path.ends_with("a.rs"));
    }

    #[tokio::test]
    async fn test_tree_walk_skips_excluded_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.rs"), "").unwrap();
        fs::create_dir(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/skip.rs"), "").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "").unwrap();

        let resolver = TargetResolver::new(dir.path());
        let targets = resolver.resolve(&TargetSelection::WorkingTree).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert!(targets[0].path.ends_with("keep.rs"));
    }

    #[tokio::test]
    async fn test_empty_selection_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = TargetResolver::new(dir.path());
        let err = resolver.resolve(&TargetSelection::WorkingTree).await.unwrap_err();
        assert!(matches!(err, TargetError::Empty));
    }

    #[test]
    fn test_parse_name_status() {
        let root = Path::new("/repo");
        let targets = parse_name_status("A\tnew.rs\nM\tsrc/lib.rs\nD\tgone.py\nR100\told.rs\trenamed.rs\n", root);
        assert_eq!(targets.len(), 4);
        assert_eq!(targets[0].change_kind, ChangeKind::Added);
        assert_eq!(targets[1].change_kind, ChangeKind::Modified);
        assert_eq!(targets[2].change_kind, ChangeKind::Deleted);
        assert!(targets[3].path.ends_with("renamed.rs"));
        assert_eq!(targets[3].change_kind, ChangeKind::Modified);
    }
}
