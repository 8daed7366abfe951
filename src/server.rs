use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::{default_catalog, CliProber};
use crate::config::AppConfig;
use crate::error::Result;
use crate::platform::github::GitHubCli;
use crate::platform::Platform;
use crate::process::{ProcessRunner, TokioProcessRunner};
use crate::workflow::types::*;
use crate::workflow::{PrCreateRequest, PullRequestManager};
use crate::workspace::{BranchResolver, BranchStatus, GitCli, PushSummary, WorkspaceManager};

/// Everything the UI-facing operations need. Holds no per-request state.
pub struct AppState {
    pub config: AppConfig,
    pub workspace: Arc<WorkspaceManager>,
    pub pull_requests: PullRequestManager,
    pub prober: CliProber,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_runner(config, Arc::new(TokioProcessRunner::new()))
    }

    pub fn with_runner(config: AppConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let max_output = config.process.max_output_bytes;
        let timeout = config.git.command_timeout();

        let git = GitCli::new(runner.clone(), timeout, max_output);
        let platform: Arc<dyn Platform> =
            Arc::new(GitHubCli::new(runner.clone(), timeout, max_output));
        let branches = BranchResolver::new(
            git.clone(),
            platform.clone(),
            &config.git.fallback_default_branch,
        );
        let workspace = Arc::new(WorkspaceManager::new(git, branches, &config.git));
        let pull_requests = PullRequestManager::new(workspace.clone(), platform);
        let prober = CliProber::new(runner, default_catalog(), config.probe.timeout(), max_output);

        Self {
            config,
            workspace,
            pull_requests,
            prober,
        }
    }

    pub async fn branch_status(&self, path: &Path) -> BranchStatusResponse {
        self.try_branch_status(path).await.into()
    }

    async fn try_branch_status(&self, path: &Path) -> Result<BranchStatus> {
        WorkspaceManager::verify_workspace(path)?;
        Ok(self.workspace.branch_status(path).await)
    }

    pub async fn commit_and_push(&self, request: &CommitAndPushRequest) -> CommitAndPushResponse {
        let result = self.try_commit_and_push(request).await;
        if let Err(e) = &result {
            tracing::error!(
                workspace = %request.workspace_path.display(),
                error = %e,
                "Commit and push failed"
            );
        }
        result.into()
    }

    async fn try_commit_and_push(&self, request: &CommitAndPushRequest) -> Result<PushSummary> {
        WorkspaceManager::verify_workspace(&request.workspace_path)?;
        self.workspace
            .commit_and_push(&request.workspace_path, &request.options())
            .await
    }

    pub async fn create_pull_request(
        &self,
        request: &PrCreateRequest,
    ) -> CreatePullRequestResponse {
        let result = match WorkspaceManager::verify_workspace(&request.workspace_path) {
            Ok(()) => self.pull_requests.create_pull_request(request).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::error!(
                workspace = %request.workspace_path.display(),
                error = %e,
                "Pull request creation failed"
            );
        }
        result.into()
    }

    pub async fn pull_request_status(&self, path: &Path) -> PullRequestStatusResponse {
        let result = match WorkspaceManager::verify_workspace(path) {
            Ok(()) => self.pull_requests.pull_request_status(path).await,
            Err(e) => Err(e),
        };
        result.into()
    }

    pub async fn list_providers(&self) -> ProvidersResponse {
        let providers: Result<_> = Ok(self.prober.list_providers().await);
        providers.into()
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/git/branch-status", post(branch_status))
        .route("/git/commit-and-push", post(commit_and_push))
        .route("/github/pull-request", post(create_pull_request))
        .route("/github/pull-request/status", post(pull_request_status))
        .route("/providers", get(list_providers))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn branch_status(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WorkspaceRequest>,
) -> Json<BranchStatusResponse> {
    Json(state.branch_status(&request.workspace_path).await)
}

async fn commit_and_push(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommitAndPushRequest>,
) -> Json<CommitAndPushResponse> {
    Json(state.commit_and_push(&request).await)
}

async fn create_pull_request(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PrCreateRequest>,
) -> Json<CreatePullRequestResponse> {
    Json(state.create_pull_request(&request).await)
}

async fn pull_request_status(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WorkspaceRequest>,
) -> Json<PullRequestStatusResponse> {
    Json(state.pull_request_status(&request.workspace_path).await)
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    Json(state.list_providers().await)
}

async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::scripted::{fail, ok, ScriptedRunner};

    fn state(runner: ScriptedRunner) -> AppState {
        AppState::with_runner(AppConfig::default(), Arc::new(runner))
    }

    #[tokio::test]
    async fn test_branch_status_degrades_to_main() {
        let tmp = tempfile::tempdir().unwrap();
        let app = state(
            ScriptedRunner::new()
                .on("git", &["branch", "--show-current"], vec![ok("feature-x\n")])
                .on("gh", &[], vec![fail(1, "gh: not logged in")])
                .on("git", &[], vec![fail(128, "fatal: no remote")]),
        );

        let response = app.branch_status(tmp.path()).await;
        assert!(response.success);
        assert_eq!(response.branch.as_deref(), Some("feature-x"));
        assert_eq!(response.default_branch.as_deref(), Some("main"));
        assert_eq!((response.ahead, response.behind), (Some(0), Some(0)));
    }

    #[tokio::test]
    async fn test_missing_workspace_is_reported_not_thrown() {
        let app = state(ScriptedRunner::new());
        let response = app
            .commit_and_push(&CommitAndPushRequest {
                workspace_path: "/definitely/not/here".into(),
                ..Default::default()
            })
            .await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_pull_request_status_without_pr_is_success() {
        let tmp = tempfile::tempdir().unwrap();
        let app = state(ScriptedRunner::new().on(
            "gh",
            &["pr", "view"],
            vec![fail(1, "no pull requests found for branch \"feature-x\"")],
        ));

        let response = app.pull_request_status(tmp.path()).await;
        assert!(response.success);
        assert_eq!(response.pr, None);
        assert_eq!(response.error, None);
    }

    #[tokio::test]
    async fn test_router_serves_pull_request_status_envelope() {
        use axum::body::{to_bytes, Body};
        use axum::http::{header, Request, StatusCode};
        use tower::ServiceExt;

        let tmp = tempfile::tempdir().unwrap();
        let app = create_router(Arc::new(state(ScriptedRunner::new().on(
            "gh",
            &["pr", "view"],
            vec![fail(1, "no pull requests found for branch \"feature-x\"")],
        ))));

        let body = serde_json::json!({ "workspacePath": tmp.path() }).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/github/pull-request/status")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "pr": null }));
    }

    #[tokio::test]
    async fn test_list_providers_covers_catalog() {
        let app =
            state(ScriptedRunner::new().on("claude", &[], vec![ok("2.0.14 (Claude Code)\n")]));
        let response = app.list_providers().await;
        assert!(response.success);

        let providers = response.providers.unwrap();
        assert_eq!(providers.len(), default_catalog().len());
        let claude = providers.iter().find(|p| p.id == "claude").unwrap();
        assert_eq!(claude.version.as_deref(), Some("2.0.14"));
    }
}
