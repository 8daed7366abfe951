//! Request and response shapes exposed to the UI layer.
//!
//! Every response carries `success` plus either its payload or an `error`
//! string, so callers never have to handle a raw failure.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agent::probe::CliProviderStatus;
use crate::error::Result;
use crate::platform::types::{CreatedPullRequest, PullRequestInfo};
use crate::workspace::branch::BranchStatus;
use crate::workspace::manager::{CommitAndPush, PushSummary};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRequest {
    pub workspace_path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitAndPushRequest {
    pub workspace_path: PathBuf,
    #[serde(default)]
    pub commit_message: Option<String>,
    #[serde(default)]
    pub create_branch_if_on_default: bool,
    #[serde(default)]
    pub branch_prefix: Option<String>,
}

impl CommitAndPushRequest {
    pub fn options(&self) -> CommitAndPush {
        CommitAndPush {
            message: self.commit_message.clone(),
            create_branch_if_on_default: self.create_branch_if_on_default,
            branch_prefix: self.branch_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ahead: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behind: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitAndPushResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePullRequestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `pr` is always present: `null` means the branch has no pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestStatusResponse {
    pub success: bool,
    pub pr: Option<PullRequestInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<CliProviderStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<BranchStatus>> for BranchStatusResponse {
    fn from(result: Result<BranchStatus>) -> Self {
        match result {
            Ok(status) => Self {
                success: true,
                branch: Some(status.current_branch),
                default_branch: Some(status.default_branch),
                ahead: Some(status.ahead),
                behind: Some(status.behind),
                error: None,
            },
            Err(e) => Self {
                error: Some(e.to_string()),
                ..Default::default()
            },
        }
    }
}

impl From<Result<PushSummary>> for CommitAndPushResponse {
    fn from(result: Result<PushSummary>) -> Self {
        match result {
            Ok(summary) => Self {
                success: true,
                branch: Some(summary.branch),
                output: Some(summary.output),
                error: None,
            },
            Err(e) => Self {
                error: Some(e.to_string()),
                ..Default::default()
            },
        }
    }
}

impl From<Result<CreatedPullRequest>> for CreatePullRequestResponse {
    fn from(result: Result<CreatedPullRequest>) -> Self {
        match result {
            Ok(created) => Self {
                success: true,
                url: created.url,
                output: Some(created.output),
                error: None,
            },
            Err(e) => Self {
                error: Some(e.to_string()),
                ..Default::default()
            },
        }
    }
}

impl From<Result<Option<PullRequestInfo>>> for PullRequestStatusResponse {
    fn from(result: Result<Option<PullRequestInfo>>) -> Self {
        match result {
            Ok(pr) => Self {
                success: true,
                pr,
                error: None,
            },
            Err(e) => Self {
                error: Some(e.to_string()),
                ..Default::default()
            },
        }
    }
}

impl From<Result<Vec<CliProviderStatus>>> for ProvidersResponse {
    fn from(result: Result<Vec<CliProviderStatus>>) -> Self {
        match result {
            Ok(providers) => Self {
                success: true,
                providers: Some(providers),
                error: None,
            },
            Err(e) => Self {
                error: Some(e.to_string()),
                ..Default::default()
            },
        }
    }
}
