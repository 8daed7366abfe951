use std::fmt;

use thiserror::Error;

/// The step of a git sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitStage {
    CheckDirty,
    Stage,
    Commit,
    CreateBranch,
    Status,
}

impl fmt::Display for GitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GitStage::CheckDirty => "status check",
            GitStage::Stage => "staging",
            GitStage::Commit => "commit",
            GitStage::CreateBranch => "branch creation",
            GitStage::Status => "status summary",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Git {stage} failed: {message}")]
    Git { stage: GitStage, message: String },

    #[error(
        "Failed to push branch '{branch}': {message}. Check that the 'origin' remote exists \
         and that you are authenticated to push to it"
    )]
    Push { branch: String, message: String },

    #[error("HEAD is detached; check out a branch before {action}")]
    DetachedHead { action: &'static str },

    #[error(
        "No commits between '{base}' and '{head}': branch '{head}' has no commits ahead of \
         'origin/{base}'. Commit and push changes before creating a pull request"
    )]
    NoCommitsAhead { head: String, base: String },

    #[error("Failed to create pull request: {0}")]
    PullRequestCreate(String),

    #[error("GitHub CLI error: {0}")]
    GitHubCli(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
