use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, GitStage, Result};
use crate::process::{CommandOutcome, Invocation, ProcessRunner};

pub const REMOTE: &str = "origin";

/// Validate a branch name to prevent argument injection.
/// Rejects names starting with `-` as defence in depth.
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.starts_with('-') {
        return Err(AppError::Git {
            stage: GitStage::CreateBranch,
            message: format!("Invalid branch name (starts with '-'): {name}"),
        });
    }
    Ok(())
}

/// Whether git's error output says there was nothing to commit.
///
/// Staging and an external commit can race, so this is treated as success.
pub fn is_nothing_to_commit(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("nothing to commit") || lower.contains("nothing added to commit")
}

/// Thin wrapper running `git` in a working copy through a [`ProcessRunner`].
#[derive(Clone)]
pub struct GitCli {
    runner: Arc<dyn ProcessRunner>,
    timeout: Option<Duration>,
    max_output_bytes: usize,
}

impl GitCli {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        timeout: Option<Duration>,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            runner,
            timeout,
            max_output_bytes,
        }
    }

    /// Run an arbitrary git command in `dir`.
    pub async fn run<I, S>(&self, dir: &Path, args: I) -> CommandOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = Invocation::new("git")
            .args(args)
            .cwd(dir)
            .timeout(self.timeout)
            .max_output_bytes(self.max_output_bytes);
        self.runner.run(invocation).await
    }

    /// Current branch name; empty on a detached HEAD or on failure.
    pub async fn current_branch(&self, dir: &Path) -> String {
        let out = self.run(dir, ["branch", "--show-current"]).await;
        if out.success() {
            out.stdout_trimmed().to_string()
        } else {
            tracing::debug!(error = %out.error_text(), "Could not read current branch");
            String::new()
        }
    }

    /// Porcelain status; `Ok(true)` when anything is staged, modified or untracked.
    pub async fn has_changes(&self, dir: &Path) -> Result<bool> {
        let out = self.run(dir, ["status", "--porcelain"]).await;
        if !out.success() {
            return Err(AppError::Git {
                stage: GitStage::CheckDirty,
                message: out.error_text(),
            });
        }
        Ok(!out.stdout_trimmed().is_empty())
    }

    /// Stage all changes.
    pub async fn add_all(&self, dir: &Path) -> Result<()> {
        let out = self.run(dir, ["add", "-A"]).await;
        if !out.success() {
            return Err(AppError::Git {
                stage: GitStage::Stage,
                message: out.error_text(),
            });
        }
        Ok(())
    }

    /// Commit staged changes. Returns `Ok(false)` when git had nothing to commit.
    pub async fn commit(&self, dir: &Path, message: &str) -> Result<bool> {
        let out = self.run(dir, ["commit", "-m", message]).await;
        if out.success() {
            return Ok(true);
        }
        if is_nothing_to_commit(&out.combined_output()) {
            tracing::info!("Nothing to commit");
            return Ok(false);
        }
        Err(AppError::Git {
            stage: GitStage::Commit,
            message: out.error_text(),
        })
    }

    /// Create and checkout a new branch.
    pub async fn create_branch(&self, dir: &Path, branch_name: &str) -> Result<()> {
        validate_branch_name(branch_name)?;
        let out = self.run(dir, ["checkout", "-b", branch_name]).await;
        if !out.success() {
            return Err(AppError::Git {
                stage: GitStage::CreateBranch,
                message: out.error_text(),
            });
        }
        Ok(())
    }

    /// Push the current branch to its configured upstream.
    pub async fn push(&self, dir: &Path) -> CommandOutcome {
        self.run(dir, ["push"]).await
    }

    /// Push and record `origin/<branch>` as the upstream.
    pub async fn push_set_upstream(&self, dir: &Path, branch_name: &str) -> CommandOutcome {
        self.run(dir, ["push", "--set-upstream", REMOTE, branch_name])
            .await
    }

    /// First line of `git status -sb`, e.g. `## feat...origin/feat [ahead 1]`.
    pub async fn status_line(&self, dir: &Path) -> Result<String> {
        let out = self.run(dir, ["status", "-sb"]).await;
        if !out.success() {
            return Err(AppError::Git {
                stage: GitStage::Status,
                message: out.error_text(),
            });
        }
        Ok(out.stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    /// URL of the `origin` remote.
    pub async fn remote_url(&self, dir: &Path) -> Option<String> {
        let out = self.run(dir, ["remote", "get-url", REMOTE]).await;
        let url = out.stdout_trimmed();
        (out.success() && !url.is_empty()).then(|| url.to_string())
    }

    /// Number of commits reachable from `head` but not from `base`.
    pub async fn count_commits(&self, dir: &Path, base: &str, head: &str) -> Option<i64> {
        let out = self
            .run(dir, ["rev-list", "--count", &format!("{base}..{head}")])
            .await;
        if !out.success() {
            tracing::debug!(base, head, error = %out.error_text(), "rev-list count failed");
            return None;
        }
        out.stdout_trimmed().parse().ok()
    }
}
