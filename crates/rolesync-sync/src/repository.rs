//! Source repository access
//!
//! The synchronizer only needs two things from version control: the list of
//! tracked files at a ref, and the content of one file at a ref.
//!
//! - [`GitRepository`] shells out to the `git` binary of a local clone
//! - [`InMemoryRepository`] keeps refs and files in memory for tests

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{Result, SyncError};

/// Read access to a repository at arbitrary refs
pub trait Repository {
    /// All tracked file paths at `git_ref`, empty when the ref does not exist
    fn list_files(&self, git_ref: &str) -> Result<Vec<String>>;

    /// Content of `path` at `git_ref`, `None` when either does not exist
    fn file_content(&self, path: &str, git_ref: &str) -> Result<Option<String>>;
}

/// Local git clone accessed through the `git` command line
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn git(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .output()
            .map_err(|e| SyncError::repository(format!("failed to run git: {}", e)))
    }

    /// Resolve a ref to a commit sha, `None` when it does not exist
    fn resolve(&self, git_ref: &str) -> Result<Option<String>> {
        if git_ref.is_empty() || git_ref.starts_with('-') {
            return Ok(None);
        }

        let spec = format!("{}^{{commit}}", git_ref);
        let output = self.git(&["rev-parse", "--verify", "--quiet", &spec])?;
        if !output.status.success() {
            return Ok(None);
        }

        let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(sha))
    }
}

impl Repository for GitRepository {
    fn list_files(&self, git_ref: &str) -> Result<Vec<String>> {
        let Some(sha) = self.resolve(git_ref)? else {
            tracing::debug!("git ref {} does not resolve in {}", git_ref, self.path.display());
            return Ok(Vec::new());
        };

        let output = self.git(&["ls-tree", "-r", "-z", "--name-only", &sha])?;
        if !output.status.success() {
            return Err(SyncError::repository(format!(
                "git ls-tree failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| SyncError::repository("git ls-tree returned non UTF-8 paths"))?;
        Ok(stdout
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect())
    }

    fn file_content(&self, path: &str, git_ref: &str) -> Result<Option<String>> {
        let Some(sha) = self.resolve(git_ref)? else {
            return Ok(None);
        };

        let object = format!("{}:{}", sha, path);
        let output = self.git(&["cat-file", "blob", &object])?;
        if !output.status.success() {
            return Ok(None);
        }

        String::from_utf8(output.stdout)
            .map(Some)
            .map_err(|_| SyncError::repository(format!("{} is not valid UTF-8", path)))
    }
}

/// Repository kept entirely in memory: ref -> path -> content
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    refs: HashMap<String, BTreeMap<String, String>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert_file`](Self::insert_file)
    pub fn with_file(mut self, git_ref: &str, path: &str, content: impl Into<String>) -> Self {
        self.insert_file(git_ref, path, content);
        self
    }

    /// Add or replace a file at a ref, creating the ref if needed
    pub fn insert_file(&mut self, git_ref: &str, path: &str, content: impl Into<String>) {
        self.refs
            .entry(git_ref.to_string())
            .or_default()
            .insert(path.to_string(), content.into());
    }

    /// Remove a file from a ref
    pub fn remove_file(&mut self, git_ref: &str, path: &str) -> Option<String> {
        self.refs.get_mut(git_ref).and_then(|files| files.remove(path))
    }
}

impl Repository for InMemoryRepository {
    fn list_files(&self, git_ref: &str) -> Result<Vec<String>> {
        Ok(self
            .refs
            .get(git_ref)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn file_content(&self, path: &str, git_ref: &str) -> Result<Option<String>> {
        Ok(self
            .refs
            .get(git_ref)
            .and_then(|files| files.get(path))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run_git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args([
                "-c",
                "user.name=rolesync",
                "-c",
                "user.email=rolesync@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn test_in_memory_repository() {
        let mut repo = InMemoryRepository::new()
            .with_file("HEAD", "kubernetes/b.yml", "b")
            .with_file("HEAD", "kubernetes/a.yml", "a");

        assert_eq!(
            repo.list_files("HEAD").unwrap(),
            vec!["kubernetes/a.yml", "kubernetes/b.yml"]
        );
        assert_eq!(
            repo.file_content("kubernetes/a.yml", "HEAD").unwrap(),
            Some("a".to_string())
        );
        assert!(repo.list_files("other").unwrap().is_empty());
        assert_eq!(repo.file_content("kubernetes/a.yml", "other").unwrap(), None);

        repo.remove_file("HEAD", "kubernetes/a.yml");
        assert_eq!(repo.list_files("HEAD").unwrap(), vec!["kubernetes/b.yml"]);
    }

    #[test]
    fn test_git_repository_lists_and_reads() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "--quiet"]);
        std::fs::create_dir_all(dir.path().join("kubernetes")).unwrap();
        std::fs::write(dir.path().join("kubernetes/a.yml"), "kind: Job\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        run_git(dir.path(), &["add", "."]);
        run_git(dir.path(), &["commit", "--quiet", "-m", "initial"]);

        let repo = GitRepository::new(dir.path());
        let mut files = repo.list_files("HEAD").unwrap();
        files.sort();
        assert_eq!(files, vec!["README.md", "kubernetes/a.yml"]);

        assert_eq!(
            repo.file_content("kubernetes/a.yml", "HEAD").unwrap().as_deref(),
            Some("kind: Job\n")
        );
        assert_eq!(repo.file_content("missing.yml", "HEAD").unwrap(), None);
    }

    #[test]
    fn test_git_repository_unknown_ref() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "--quiet"]);

        let repo = GitRepository::new(dir.path());
        assert!(repo.list_files("DFSDSFSDFD").unwrap().is_empty());
        assert!(repo.list_files("--output=/tmp/x").unwrap().is_empty());
        assert_eq!(repo.file_content("a.yml", "DFSDSFSDFD").unwrap(), None);
    }
}
