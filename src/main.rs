use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agent_gitops::config::AppConfig;
use agent_gitops::server::{create_router, AppState};
use agent_gitops::shutdown::wait_for_shutdown;
use agent_gitops::workflow::types::CommitAndPushRequest;
use agent_gitops::workflow::PrCreateRequest;

#[derive(Parser)]
#[command(
    name = "agent-gitops",
    about = "Git and GitHub workflow service for coding-agent workspaces"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Show current branch, default branch and ahead/behind counts
    BranchStatus { workspace: PathBuf },
    /// Commit pending changes and push the current branch
    CommitAndPush {
        workspace: PathBuf,
        #[arg(short, long)]
        message: Option<String>,
        /// Move to a fresh branch when currently on the default branch
        #[arg(long)]
        new_branch: bool,
        #[arg(long)]
        branch_prefix: Option<String>,
    },
    /// Commit, push and open a pull request
    CreatePr {
        workspace: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        base: Option<String>,
        #[arg(long)]
        head: Option<String>,
        #[arg(long)]
        draft: bool,
        #[arg(long)]
        web: bool,
        #[arg(long)]
        fill: bool,
    },
    /// Show the pull request for the current branch
    PrStatus { workspace: PathBuf },
    /// Detect installed agent CLIs
    Providers,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output, so logs go to stderr.
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn emit<T: Serialize>(response: &T, success: bool) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn serve(config: &AppConfig, state: AppState) -> anyhow::Result<ExitCode> {
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting agent-gitops server"
    );

    let app = create_router(Arc::new(state));
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = AppConfig::load(cli.config.as_deref())?;

    let state = AppState::new(config.clone());
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, state).await,
        Command::BranchStatus { workspace } => {
            let response = state.branch_status(&workspace).await;
            emit(&response, response.success)
        }
        Command::CommitAndPush {
            workspace,
            message,
            new_branch,
            branch_prefix,
        } => {
            let request = CommitAndPushRequest {
                workspace_path: workspace,
                commit_message: message,
                create_branch_if_on_default: new_branch,
                branch_prefix,
            };
            let response = state.commit_and_push(&request).await;
            emit(&response, response.success)
        }
        Command::CreatePr {
            workspace,
            title,
            body,
            base,
            head,
            draft,
            web,
            fill,
        } => {
            let request = PrCreateRequest {
                workspace_path: workspace,
                title,
                body,
                base,
                head,
                draft,
                web,
                fill,
            };
            let response = state.create_pull_request(&request).await;
            emit(&response, response.success)
        }
        Command::PrStatus { workspace } => {
            let response = state.pull_request_status(&workspace).await;
            emit(&response, response.success)
        }
        Command::Providers => {
            let response = state.list_providers().await;
            emit(&response, response.success)
        }
    }
}
