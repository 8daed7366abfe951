use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;
use crate::process::{CommandOutcome, Invocation, ProcessRunner};

use super::mapper;

/// [`Platform`] backed by the `gh` command-line tool.
pub struct GitHubCli {
    runner: Arc<dyn ProcessRunner>,
    timeout: Option<Duration>,
    max_output_bytes: usize,
}

impl GitHubCli {
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

    async fn gh<I, S>(&self, dir: &Path, args: I) -> CommandOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = Invocation::new("gh")
            .args(args)
            .cwd(dir)
            .timeout(self.timeout)
            .max_output_bytes(self.max_output_bytes);
        self.runner.run(invocation).await
    }

    /// Run a `gh ... --jq` query expected to print a single non-empty line.
    async fn query_line(&self, dir: &Path, args: &[&str]) -> Option<String> {
        let out = self.gh(dir, args.iter().copied()).await;
        if !out.success() {
            tracing::debug!(command = %out.command, error = %out.error_text(), "gh query failed");
            return None;
        }
        let value = out.stdout_trimmed();
        (!value.is_empty()).then(|| value.to_string())
    }
}

#[async_trait]
impl Platform for GitHubCli {
    async fn repo_name_with_owner(&self, dir: &Path) -> Option<String> {
        self.query_line(
            dir,
            &["repo", "view", "--json", "nameWithOwner", "--jq", ".nameWithOwner"],
        )
        .await
    }

    async fn default_branch(&self, dir: &Path) -> Option<String> {
        self.query_line(
            dir,
            &[
                "repo",
                "view",
                "--json",
                "defaultBranchRef",
                "--jq",
                ".defaultBranchRef.name",
            ],
        )
        .await
    }

    async fn create_pull_request(
        &self,
        dir: &Path,
        pr: &CreatePullRequest,
    ) -> Result<CreatedPullRequest> {
        let out = self.gh(dir, mapper::create_args(pr)).await;
        if !out.success() {
            return Err(AppError::PullRequestCreate(out.error_text()));
        }

        let output = out.combined_output();
        Ok(CreatedPullRequest {
            url: mapper::extract_first_url(&output),
            output,
        })
    }

    async fn pull_request_for_current_branch(&self, dir: &Path) -> Result<Option<PullRequestInfo>> {
        let out = self
            .gh(dir, ["pr", "view", "--json", mapper::PR_VIEW_FIELDS])
            .await;

        if !out.success() {
            let text = out.error_text();
            if out.spawn_error.is_none() && mapper::is_no_pull_request(&text) {
                tracing::debug!("No pull request for current branch");
                return Ok(None);
            }
            return Err(AppError::GitHubCli(text));
        }

        mapper::map_pull_request(&out.stdout).map(Some)
    }
}
