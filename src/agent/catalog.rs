/// How a probed CLI's status is decided beyond "did `--version` succeed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCheck {
    /// `connected` if the version probe succeeded.
    Default,
    /// Run a more authoritative command first; the CLI only counts as
    /// installed if `marker` appears in its output.
    InstallCheck {
        program: &'static str,
        args: &'static [&'static str],
        marker: &'static str,
        hint: &'static str,
    },
    /// A working CLI with none of these variables set reports `needs_key`.
    RequiresAnyEnv(&'static [&'static str]),
}

/// A known coding-agent CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliDefinition {
    pub id: &'static str,
    pub name: &'static str,
    /// Candidate executables, tried in order.
    pub commands: &'static [&'static str],
    pub version_args: &'static [&'static str],
    pub doc_url: Option<&'static str>,
    pub status_check: StatusCheck,
}

impl CliDefinition {
    pub const fn new(
        id: &'static str,
        name: &'static str,
        commands: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            name,
            commands,
            version_args: &["--version"],
            doc_url: None,
            status_check: StatusCheck::Default,
        }
    }

    pub const fn version_args(mut self, args: &'static [&'static str]) -> Self {
        self.version_args = args;
        self
    }

    pub const fn doc_url(mut self, url: &'static str) -> Self {
        self.doc_url = Some(url);
        self
    }

    pub const fn status_check(mut self, check: StatusCheck) -> Self {
        self.status_check = check;
        self
    }
}

/// The agent CLIs the application knows how to launch.
pub fn default_catalog() -> Vec<CliDefinition> {
    vec![
        CliDefinition::new("claude", "Claude Code", &["claude"])
            .doc_url("https://docs.anthropic.com/en/docs/claude-code/overview"),
        CliDefinition::new("codex", "Codex CLI", &["codex"])
            .doc_url("https://github.com/openai/codex"),
        CliDefinition::new("gemini", "Gemini CLI", &["gemini"])
            .doc_url("https://github.com/google-gemini/gemini-cli"),
        CliDefinition::new("cursor", "Cursor Agent", &["cursor-agent", "cursor"])
            .doc_url("https://docs.cursor.com/en/cli/overview"),
        CliDefinition::new("copilot", "GitHub Copilot", &["gh"])
            .version_args(&["copilot", "--version"])
            .doc_url("https://docs.github.com/en/copilot/github-copilot-in-the-cli")
            .status_check(StatusCheck::InstallCheck {
                program: "gh",
                args: &["extension", "list"],
                marker: "gh-copilot",
                hint: "gh is installed but the Copilot extension is not; \
                       run `gh extension install github/gh-copilot`",
            }),
        CliDefinition::new("aider", "Aider", &["aider"])
            .doc_url("https://aider.chat/docs/install.html")
            .status_check(StatusCheck::RequiresAnyEnv(&[
                "ANTHROPIC_API_KEY",
                "OPENAI_API_KEY",
                "GEMINI_API_KEY",
                "OPENROUTER_API_KEY",
                "DEEPSEEK_API_KEY",
            ])),
        CliDefinition::new("opencode", "OpenCode", &["opencode"])
            .doc_url("https://opencode.ai/docs"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique_and_have_commands() {
        let catalog = default_catalog();
        let ids: HashSet<_> = catalog.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), catalog.len());
        assert!(catalog.iter().all(|d| !d.commands.is_empty()));
    }

    #[test]
    fn test_cursor_tries_agent_binary_first() {
        let cursor = default_catalog().into_iter().find(|d| d.id == "cursor").unwrap();
        assert_eq!(cursor.commands, ["cursor-agent", "cursor"]);
        assert_eq!(cursor.version_args, ["--version"]);
    }
}
