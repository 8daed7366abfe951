pub mod github;
pub mod types;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// The hosting platform a working copy's `origin` points at.
///
/// Lookups that have a fallback elsewhere return `Option` so callers can
/// move on to the next strategy.
#[async_trait]
pub trait Platform: Send + Sync {
    /// `owner/repo` of the repository checked out in `dir`.
    async fn repo_name_with_owner(&self, dir: &Path) -> Option<String>;

    /// The repository's configured default branch.
    async fn default_branch(&self, dir: &Path) -> Option<String>;

    /// Create a pull request.
    async fn create_pull_request(
        &self,
        dir: &Path,
        pr: &CreatePullRequest,
    ) -> Result<CreatedPullRequest>;

    /// The pull request for the current branch, or `None` if there is none.
    async fn pull_request_for_current_branch(&self, dir: &Path) -> Result<Option<PullRequestInfo>>;
}
