use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::platform::github::mapper::parse_remote_url;
use crate::platform::types::{CreatePullRequest, CreatedPullRequest, PullRequestInfo};
use crate::platform::Platform;
use crate::workspace::git::REMOTE;
use crate::workspace::WorkspaceManager;

/// A request to open a pull request for a workspace's current branch.
///
/// Unset fields fall back to repository and branch defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrCreateRequest {
    pub workspace_path: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub web: bool,
    #[serde(default)]
    pub fill: bool,
}

pub struct PullRequestManager {
    workspace: Arc<WorkspaceManager>,
    platform: Arc<dyn Platform>,
}

impl PullRequestManager {
    pub fn new(workspace: Arc<WorkspaceManager>, platform: Arc<dyn Platform>) -> Self {
        Self {
            workspace,
            platform,
        }
    }

    /// Commit, push, and open a pull request for the current branch.
    pub async fn create_pull_request(
        &self,
        request: &PrCreateRequest,
    ) -> Result<CreatedPullRequest> {
        let repo = request.workspace_path.as_path();

        // Already-pushed commits can still make a PR, so this is not fatal.
        if let Err(e) = self
            .workspace
            .commit_pending(repo, request.title.as_deref())
            .await
        {
            tracing::warn!(
                workspace = %repo.display(),
                error = %e,
                "Could not commit pending changes, continuing with pushed commits"
            );
        }

        let current_branch = self.workspace.push_current(repo).await?;

        let repo_name = self.resolve_repo_name(repo).await;
        let default_branch = self.workspace.branches().default_branch(repo).await;
        let base = non_empty(request.base.as_deref())
            .map(str::to_string)
            .unwrap_or(default_branch);

        self.ensure_commits_ahead(repo, &current_branch, &base).await?;

        let owner = repo_name
            .as_deref()
            .and_then(|name| name.split('/').next());
        let head = resolve_head(request.head.as_deref(), owner, &current_branch);

        let pr = CreatePullRequest {
            repo: repo_name,
            title: non_empty(request.title.as_deref()).map(str::to_string),
            body: request.body.clone(),
            base,
            head,
            draft: request.draft,
            web: request.web,
            fill: request.fill,
        };

        tracing::info!(
            workspace = %repo.display(),
            repo = ?pr.repo,
            base = %pr.base,
            head = %pr.head,
            draft = pr.draft,
            "Creating pull request"
        );

        let created = self.platform.create_pull_request(repo, &pr).await?;
        tracing::info!(url = ?created.url, "Pull request created");
        Ok(created)
    }

    /// The pull request for the current branch; `Ok(None)` when there is none.
    pub async fn pull_request_status(&self, repo: &Path) -> Result<Option<PullRequestInfo>> {
        self.platform.pull_request_for_current_branch(repo).await
    }

    /// `owner/repo`, from the hosting CLI or else parsed from the `origin` URL.
    async fn resolve_repo_name(&self, repo: &Path) -> Option<String> {
        if let Some(name) = self.platform.repo_name_with_owner(repo).await {
            return Some(name);
        }

        let from_remote = self
            .workspace
            .git()
            .remote_url(repo)
            .await
            .and_then(|url| parse_remote_url(&url));
        if from_remote.is_none() {
            tracing::warn!(
                workspace = %repo.display(),
                "Could not resolve owner/repo, letting gh infer it"
            );
        }
        from_remote
    }

    /// Reject a pull request with no commits ahead of `origin/<base>`.
    async fn ensure_commits_ahead(&self, repo: &Path, head: &str, base: &str) -> Result<()> {
        let remote_base = format!("{REMOTE}/{base}");
        match self
            .workspace
            .git()
            .count_commits(repo, &remote_base, "HEAD")
            .await
        {
            Some(count) if count <= 0 => Err(AppError::NoCommitsAhead {
                head: head.to_string(),
                base: base.to_string(),
            }),
            Some(count) => {
                tracing::debug!(head, base, count, "Commits ahead of base");
                Ok(())
            }
            None => {
                tracing::warn!(
                    head,
                    base,
                    "Could not count commits ahead of base, skipping check"
                );
                Ok(())
            }
        }
    }
}

/// `--head` value: the caller's, else `owner:branch` when the owner is
/// known, else the bare branch name.
pub fn resolve_head(explicit: Option<&str>, owner: Option<&str>, branch: &str) -> String {
    if let Some(head) = non_empty(explicit) {
        return head.to_string();
    }
    match non_empty(owner) {
        Some(owner) => format!("{owner}:{branch}"),
        None => branch.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
