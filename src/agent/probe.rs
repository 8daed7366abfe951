use std::sync::{Arc, LazyLock};
use std::time::Duration;

use futures::future::join_all;
use regex::Regex;
use serde::Serialize;

use crate::agent::catalog::{CliDefinition, StatusCheck};
use crate::process::{CommandOutcome, Invocation, ProcessRunner};

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+(?:\.\d+)?").expect("valid version regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Connected,
    Missing,
    NeedsKey,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliProviderStatus {
    pub id: String,
    pub name: String,
    pub status: ProviderStatus,
    pub version: Option<String>,
    pub message: Option<String>,
    pub doc_url: Option<String>,
    pub command: Option<String>,
}

/// One candidate executable and what happened when it was run.
#[derive(Debug, Clone)]
struct ProbeAttempt {
    command: &'static str,
    outcome: CommandOutcome,
}

type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Detects which catalog CLIs are installed and usable.
pub struct CliProber {
    runner: Arc<dyn ProcessRunner>,
    catalog: Vec<CliDefinition>,
    timeout: Duration,
    max_output_bytes: usize,
    env: Arc<EnvLookup>,
}

impl CliProber {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        catalog: Vec<CliDefinition>,
        timeout: Duration,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            runner,
            catalog,
            timeout,
            max_output_bytes,
            env: Arc::new(|key: &str| std::env::var(key).ok()),
        }
    }

    /// Replace how environment variables are read.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    pub fn catalog(&self) -> &[CliDefinition] {
        &self.catalog
    }

    /// Probe every catalog entry. Entries are independent and run
    /// concurrently; results keep catalog order.
    pub async fn list_providers(&self) -> Vec<CliProviderStatus> {
        join_all(self.catalog.iter().map(|def| self.probe(def))).await
    }

    pub async fn probe(&self, def: &CliDefinition) -> CliProviderStatus {
        let attempt = self.probe_candidates(def).await;
        let status = self.resolve_status(def, attempt.as_ref()).await;
        tracing::debug!(
            provider = def.id,
            status = ?status.status,
            command = ?status.command,
            version = ?status.version,
            "Probed CLI"
        );
        status
    }

    async fn run(&self, program: &str, args: &[&str]) -> CommandOutcome {
        let invocation = Invocation::new(program)
            .args(args.iter().copied())
            .timeout(Some(self.timeout))
            .max_output_bytes(self.max_output_bytes);
        self.runner.run(invocation).await
    }

    /// Try each candidate until one succeeds.
    async fn probe_candidates(&self, def: &CliDefinition) -> Option<ProbeAttempt> {
        let mut attempts = Vec::with_capacity(def.commands.len());
        for &command in def.commands {
            let outcome = self.run(command, def.version_args).await;
            let succeeded = outcome.success();
            attempts.push(ProbeAttempt { command, outcome });
            if succeeded {
                break;
            }
        }
        select_attempt(attempts)
    }

    async fn resolve_status(
        &self,
        def: &CliDefinition,
        attempt: Option<&ProbeAttempt>,
    ) -> CliProviderStatus {
        match def.status_check {
            StatusCheck::Default => classify(def, attempt),
            StatusCheck::InstallCheck {
                program,
                args,
                marker,
                hint,
            } => {
                let check = self.run(program, args).await;
                if check.is_not_found() {
                    return missing(def);
                }
                if !check.combined_output().contains(marker) {
                    return CliProviderStatus {
                        message: Some(hint.to_string()),
                        ..missing(def)
                    };
                }
                classify(def, attempt)
            }
            StatusCheck::RequiresAnyEnv(vars) => {
                let status = classify(def, attempt);
                if status.status != ProviderStatus::Connected {
                    return status;
                }
                let has_key = vars
                    .iter()
                    .any(|var| (self.env)(*var).is_some_and(|v| !v.trim().is_empty()));
                if has_key {
                    return status;
                }
                CliProviderStatus {
                    status: ProviderStatus::NeedsKey,
                    message: Some(format!(
                        "{} is installed but needs an API key; set one of {}",
                        def.name,
                        vars.join(", ")
                    )),
                    ..status
                }
            }
        }
    }
}

/// Pick the attempt to report: a success, else the first candidate that
/// exists but failed, else the last (not found) candidate.
fn select_attempt(attempts: Vec<ProbeAttempt>) -> Option<ProbeAttempt> {
    if let Some(success) = attempts.iter().find(|a| a.outcome.success()) {
        return Some(success.clone());
    }
    if let Some(failed) = attempts.iter().find(|a| !a.outcome.is_not_found()) {
        return Some(failed.clone());
    }
    attempts.into_iter().last()
}

fn classify(def: &CliDefinition, attempt: Option<&ProbeAttempt>) -> CliProviderStatus {
    let Some(attempt) = attempt else {
        return missing(def);
    };
    let outcome = &attempt.outcome;

    if outcome.success() {
        return CliProviderStatus {
            status: ProviderStatus::Connected,
            version: extract_version(&outcome.combined_output()),
            command: Some(attempt.command.to_string()),
            ..base_status(def)
        };
    }

    if outcome.is_not_found() {
        return missing(def);
    }

    CliProviderStatus {
        status: ProviderStatus::Error,
        message: Some(outcome.error_text()),
        command: Some(attempt.command.to_string()),
        ..base_status(def)
    }
}

fn base_status(def: &CliDefinition) -> CliProviderStatus {
    CliProviderStatus {
        id: def.id.to_string(),
        name: def.name.to_string(),
        status: ProviderStatus::Missing,
        version: None,
        message: None,
        doc_url: def.doc_url.map(str::to_string),
        command: None,
    }
}

fn missing(def: &CliDefinition) -> CliProviderStatus {
    CliProviderStatus {
        message: Some(format!("{} not found in PATH", def.commands.join(", "))),
        ..base_status(def)
    }
}

/// First `major.minor[.patch]` in the text.
pub fn extract_version(text: &str) -> Option<String> {
    VERSION_RE.find(text).map(|m| m.as_str().to_string())
}
