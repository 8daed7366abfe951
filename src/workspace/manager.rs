use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::GitConfig;
use crate::error::{AppError, Result};
use crate::workspace::branch::{BranchResolver, BranchStatus};
use crate::workspace::git::GitCli;

/// Options for [`WorkspaceManager::commit_and_push`].
#[derive(Debug, Clone, Default)]
pub struct CommitAndPush {
    pub message: Option<String>,
    /// Move work off the default branch onto `<prefix>/<timestamp>` before pushing.
    pub create_branch_if_on_default: bool,
    pub branch_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    pub branch: String,
    /// First line of `git status -sb` after the push.
    pub output: String,
}

/// Stages, commits and pushes the work in an agent's working copy.
pub struct WorkspaceManager {
    git: GitCli,
    branches: BranchResolver,
    default_commit_message: String,
    branch_prefix: String,
}

impl WorkspaceManager {
    pub fn new(git: GitCli, branches: BranchResolver, config: &GitConfig) -> Self {
        Self {
            git,
            branches,
            default_commit_message: config.default_commit_message.clone(),
            branch_prefix: config.branch_prefix.clone(),
        }
    }

    /// Verify a workspace path points at an existing directory.
    pub fn verify_workspace(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(AppError::Workspace("Workspace path is empty".to_string()));
        }
        if !path.is_dir() {
            return Err(AppError::Workspace(format!(
                "Workspace directory does not exist: {}",
                path.display()
            )));
        }
        Ok(())
    }

    pub fn git(&self) -> &GitCli {
        &self.git
    }

    pub fn branches(&self) -> &BranchResolver {
        &self.branches
    }

    pub async fn branch_status(&self, repo: &Path) -> BranchStatus {
        self.branches.status(repo).await
    }

    /// Stage and commit anything pending.
    ///
    /// Returns `Ok(false)` when the tree was clean or git found nothing to
    /// commit; a clean tree never runs `add` or `commit`.
    pub async fn commit_pending(&self, repo: &Path, message: Option<&str>) -> Result<bool> {
        if !self.git.has_changes(repo).await? {
            tracing::info!(workspace = %repo.display(), "No changes to commit");
            return Ok(false);
        }

        self.git.add_all(repo).await?;

        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.default_commit_message);
        let committed = self.git.commit(repo, message).await?;
        if committed {
            tracing::info!(workspace = %repo.display(), "Committed pending changes");
        }
        Ok(committed)
    }

    /// Push the current branch, creating the upstream on first push.
    /// Returns the pushed branch name.
    pub async fn push_current(&self, repo: &Path) -> Result<String> {
        let branch = self.git.current_branch(repo).await;
        if branch.is_empty() {
            return Err(AppError::DetachedHead { action: "pushing" });
        }

        let first = self.git.push(repo).await;
        if first.success() {
            tracing::info!(branch = %branch, "Pushed branch");
            return Ok(branch);
        }

        tracing::debug!(
            branch = %branch,
            error = %first.error_text(),
            "Plain push failed, retrying with --set-upstream"
        );

        let retry = self.git.push_set_upstream(repo, &branch).await;
        if !retry.success() {
            tracing::error!(branch = %branch, error = %retry.error_text(), "Push failed");
            return Err(AppError::Push {
                branch,
                message: retry.error_text(),
            });
        }

        tracing::info!(branch = %branch, "Pushed branch and set upstream");
        Ok(branch)
    }

    /// When on the default branch, switch to a fresh `<prefix>/<timestamp>` branch.
    async fn ensure_off_default_branch(&self, repo: &Path, prefix: &str) -> Result<()> {
        let current = self.git.current_branch(repo).await;
        if current.is_empty() {
            return Ok(());
        }
        let default_branch = self.branches.default_branch(repo).await;
        if current != default_branch {
            return Ok(());
        }

        let new_branch = timestamp_branch_name(prefix, Utc::now());
        tracing::info!(
            from = %current,
            to = %new_branch,
            "On default branch, creating a new branch"
        );
        self.git.create_branch(repo, &new_branch).await
    }

    /// Commit pending changes and push them.
    pub async fn commit_and_push(&self, repo: &Path, opts: &CommitAndPush) -> Result<PushSummary> {
        self.commit_pending(repo, opts.message.as_deref()).await?;

        if opts.create_branch_if_on_default {
            let prefix = opts
                .branch_prefix
                .as_deref()
                .map(|p| p.trim_matches('/'))
                .filter(|p| !p.is_empty())
                .unwrap_or(&self.branch_prefix);
            self.ensure_off_default_branch(repo, prefix).await?;
        }

        let branch = self.push_current(repo).await?;

        // The work is on the remote at this point; the summary line is cosmetic.
        let output = match self.git.status_line(repo).await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(
                    branch = %branch,
                    error = %e,
                    "Pushed, but could not read status summary"
                );
                String::new()
            }
        };

        Ok(PushSummary { branch, output })
    }
}

/// `<prefix>/<milliseconds since epoch in base 36>`.
pub fn timestamp_branch_name(prefix: &str, now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    format!("{prefix}/{}", to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
