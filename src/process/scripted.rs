//! A `ProcessRunner` that answers from a rule table and records every call.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CommandOutcome, Invocation, ProcessRunner};

struct Rule {
    program: String,
    args_prefix: Vec<String>,
    responses: VecDeque<CommandOutcome>,
}

#[derive(Default)]
pub(crate) struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer invocations of `program` whose args start with `args_prefix`.
    ///
    /// Responses are consumed in order; the last one repeats. Earlier rules
    /// take priority over later ones.
    pub(crate) fn on(
        self,
        program: &str,
        args_prefix: &[&str],
        responses: Vec<CommandOutcome>,
    ) -> Self {
        assert!(!responses.is_empty(), "a rule needs at least one response");
        self.rules.lock().unwrap().push(Rule {
            program: program.to_string(),
            args_prefix: args_prefix.iter().map(|a| a.to_string()).collect(),
            responses: responses.into(),
        });
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls rendered as command lines.
    pub(crate) fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }

    pub(crate) fn was_called(&self, program: &str, args_prefix: &[&str]) -> bool {
        self.calls()
            .iter()
            .any(|c| c.program == program && starts_with(&c.args, args_prefix))
    }
}

fn starts_with(args: &[String], prefix: &[impl AsRef<str>]) -> bool {
    args.len() >= prefix.len() && prefix.iter().zip(args).all(|(p, a)| p.as_ref() == a)
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, invocation: Invocation) -> CommandOutcome {
        self.calls.lock().unwrap().push(invocation.clone());

        let mut rules = self.rules.lock().unwrap();
        let rule = rules.iter_mut().find(|r| {
            r.program == invocation.program
                && starts_with(&invocation.args, r.args_prefix.as_slice())
        });

        let mut outcome = match rule {
            Some(rule) if rule.responses.len() > 1 => rule.responses.pop_front().unwrap(),
            Some(rule) => rule.responses[0].clone(),
            None => missing(),
        };
        outcome.command = invocation.to_string();
        outcome
    }
}

pub(crate) fn ok(stdout: &str) -> CommandOutcome {
    CommandOutcome {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        ..Default::default()
    }
}

pub(crate) fn fail(exit_code: i32, stderr: &str) -> CommandOutcome {
    CommandOutcome {
        exit_code: Some(exit_code),
        stderr: stderr.to_string(),
        ..Default::default()
    }
}

pub(crate) fn missing() -> CommandOutcome {
    CommandOutcome {
        spawn_error: Some("spawn ENOENT".to_string()),
        ..Default::default()
    }
}

impl CommandOutcome {
    pub(crate) fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub(crate) fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }
}
