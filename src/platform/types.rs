use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

/// `gh` reports `is_bot` in snake_case; it is re-emitted as `isBot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct PullRequestAuthor {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

/// The pull request attached to the current branch, as reported by `gh pr view`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestInfo {
    pub number: u64,
    pub url: String,
    pub state: PullRequestState,
    pub is_draft: bool,
    #[serde(default)]
    pub merge_state_status: String,
    pub head_ref_name: String,
    pub base_ref_name: String,
    pub title: String,
    pub author: PullRequestAuthor,
}

/// Fully resolved parameters for `gh pr create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePullRequest {
    /// `owner/repo`; `None` lets gh infer it from the working directory.
    pub repo: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub base: String,
    pub head: String,
    pub draft: bool,
    pub web: bool,
    pub fill: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPullRequest {
    /// First URL found in gh's output.
    pub url: Option<String>,
    pub output: String,
}
