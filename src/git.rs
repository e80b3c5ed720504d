use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::PaperfetchError;

/// Git repository retrieval, implemented by shelling out to the system git.
pub trait GitClient: Send + Sync {
    fn clone_repo(&self, url: &str, destination: &Path) -> Result<(), PaperfetchError>;
    fn pull(&self, repo_dir: &Path) -> Result<(), PaperfetchError>;
    /// `None` when the git binary is not on PATH.
    fn version(&self) -> Option<String>;
}

#[derive(Clone)]
pub struct SystemGitClient {
    git: Option<PathBuf>,
}

impl SystemGitClient {
    pub fn new() -> Self {
        Self {
            git: find_in_path("git"),
        }
    }

    pub fn available(&self) -> bool {
        self.git.is_some()
    }

    fn require_git(&self) -> Result<&PathBuf, PaperfetchError> {
        self.git
            .as_ref()
            .ok_or_else(|| PaperfetchError::MissingTool("git".to_string()))
    }

    fn run(&self, args: &[&str]) -> Result<(), PaperfetchError> {
        let git = self.require_git()?;
        let output = Command::new(git)
            .args(args)
            .output()
            .map_err(|err| PaperfetchError::GitOperation(err.to_string()))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("git {} failed", args.join(" "))
        } else {
            stderr
        };
        Err(PaperfetchError::GitOperation(message))
    }
}

impl Default for SystemGitClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitClient for SystemGitClient {
    fn clone_repo(&self, url: &str, destination: &Path) -> Result<(), PaperfetchError> {
        let dest = destination.to_string_lossy();
        self.run(&["clone", url, dest.as_ref()])
    }

    fn pull(&self, repo_dir: &Path) -> Result<(), PaperfetchError> {
        let dir = repo_dir.to_string_lossy();
        self.run(&["-C", dir.as_ref(), "pull", "--ff-only"])
    }

    fn version(&self) -> Option<String> {
        let git = self.git.as_ref()?;
        let output = Command::new(git).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!stdout.is_empty()).then_some(stdout)
    }
}

/// Repository directory name: last URL segment with the `.git` suffix
/// stripped. Determines the deterministic clone path.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    segment.trim_end_matches(".git").to_string()
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}
