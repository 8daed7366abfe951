//! Best-effort branch metadata: current branch, default branch, ahead/behind.
//!
//! Every query walks an ordered list of strategies and stops at the first
//! that yields a value. Nothing here fails; exhausted chains fall back to a
//! fixed default.

use std::path::Path;
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::platform::Platform;
use crate::workspace::git::{GitCli, REMOTE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStatus {
    pub current_branch: String,
    pub default_branch: String,
    pub ahead: u32,
    pub behind: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefaultBranchSource {
    /// `gh repo view` on the hosting platform.
    HostingPlatform,
    /// The locally cached `refs/remotes/origin/HEAD`.
    RemoteHeadRef,
    /// `git remote show origin`, which asks the remote.
    RemoteShow,
}

const DEFAULT_BRANCH_CHAIN: [DefaultBranchSource; 3] = [
    DefaultBranchSource::HostingPlatform,
    DefaultBranchSource::RemoteHeadRef,
    DefaultBranchSource::RemoteShow,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AheadBehindSource {
    /// `git rev-list --left-right --count origin/<default>...HEAD`.
    RevList,
    /// `[ahead N, behind M]` markers from `git status -sb`.
    StatusLine,
}

const AHEAD_BEHIND_CHAIN: [AheadBehindSource; 2] =
    [AheadBehindSource::RevList, AheadBehindSource::StatusLine];

static REMOTE_SHOW_HEAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*HEAD branch:\s*(\S+)\s*$").expect("valid remote show regex")
});

static AHEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ahead (\d+)").expect("valid ahead regex"));

static BEHIND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"behind (\d+)").expect("valid behind regex"));

#[derive(Clone)]
pub struct BranchResolver {
    git: GitCli,
    platform: Arc<dyn Platform>,
    fallback_default_branch: String,
}

impl BranchResolver {
    pub fn new(git: GitCli, platform: Arc<dyn Platform>, fallback_default_branch: &str) -> Self {
        Self {
            git,
            platform,
            fallback_default_branch: fallback_default_branch.to_string(),
        }
    }

    /// Current branch; empty on a detached HEAD.
    pub async fn current_branch(&self, repo: &Path) -> String {
        self.git.current_branch(repo).await
    }

    /// The repository's default branch, never failing.
    pub async fn default_branch(&self, repo: &Path) -> String {
        for source in DEFAULT_BRANCH_CHAIN {
            if let Some(branch) = self.default_branch_from(source, repo).await {
                tracing::debug!(?source, branch = %branch, "Resolved default branch");
                return branch;
            }
            tracing::debug!(?source, "Default branch strategy yielded nothing");
        }

        tracing::warn!(
            workspace = %repo.display(),
            fallback = %self.fallback_default_branch,
            "Could not determine default branch, using fallback"
        );
        self.fallback_default_branch.clone()
    }

    async fn default_branch_from(
        &self,
        source: DefaultBranchSource,
        repo: &Path,
    ) -> Option<String> {
        match source {
            DefaultBranchSource::HostingPlatform => self.platform.default_branch(repo).await,
            DefaultBranchSource::RemoteHeadRef => {
                let head_ref = format!("refs/remotes/{REMOTE}/HEAD");
                let out = self
                    .git
                    .run(repo, ["symbolic-ref", "--short", head_ref.as_str()])
                    .await;
                if !out.success() {
                    return None;
                }
                parse_remote_head_ref(out.stdout_trimmed())
            }
            DefaultBranchSource::RemoteShow => {
                let out = self.git.run(repo, ["remote", "show", REMOTE]).await;
                if !out.success() {
                    return None;
                }
                parse_remote_show_head(&out.stdout)
            }
        }
    }

    /// `(ahead, behind)` of HEAD relative to `origin/<default_branch>`.
    /// Missing tracking information resolves to `(0, 0)`.
    pub async fn ahead_behind(&self, repo: &Path, default_branch: &str) -> (u32, u32) {
        for source in AHEAD_BEHIND_CHAIN {
            if let Some(counts) = self.ahead_behind_from(source, repo, default_branch).await {
                return counts;
            }
        }
        (0, 0)
    }

    async fn ahead_behind_from(
        &self,
        source: AheadBehindSource,
        repo: &Path,
        default_branch: &str,
    ) -> Option<(u32, u32)> {
        match source {
            AheadBehindSource::RevList => {
                let range = format!("{REMOTE}/{default_branch}...HEAD");
                let out = self
                    .git
                    .run(repo, ["rev-list", "--left-right", "--count", range.as_str()])
                    .await;
                if !out.success() {
                    return None;
                }
                parse_left_right_counts(out.stdout_trimmed())
            }
            AheadBehindSource::StatusLine => {
                let line = self.git.status_line(repo).await.ok()?;
                parse_status_counts(&line)
            }
        }
    }

    pub async fn status(&self, repo: &Path) -> BranchStatus {
        let current_branch = self.current_branch(repo).await;
        let default_branch = self.default_branch(repo).await;
        let (ahead, behind) = self.ahead_behind(repo, &default_branch).await;

        BranchStatus {
            current_branch,
            default_branch,
            ahead,
            behind,
        }
    }
}

/// `origin/main` -> `main`.
fn parse_remote_head_ref(short_ref: &str) -> Option<String> {
    let branch = short_ref.strip_prefix(&format!("{REMOTE}/"))?.trim();
    (!branch.is_empty()).then(|| branch.to_string())
}

/// The `HEAD branch:` line of `git remote show`. An unknown HEAD is reported
/// by git as `(unknown)`.
fn parse_remote_show_head(output: &str) -> Option<String> {
    let caps = REMOTE_SHOW_HEAD_RE.captures(output)?;
    let branch = &caps[1];
    (branch != "(unknown)").then(|| branch.to_string())
}

/// Parse `<behind>\t<ahead>` from `rev-list --left-right --count base...HEAD`.
fn parse_left_right_counts(output: &str) -> Option<(u32, u32)> {
    let mut columns = output.split_whitespace();
    let behind = columns.next()?.parse().ok()?;
    let ahead = columns.next()?.parse().ok()?;
    Some((ahead, behind))
}

/// Parse `[ahead N, behind M]` from the first line of `git status -sb`.
/// A line without a tracking branch yields `None`.
fn parse_status_counts(line: &str) -> Option<(u32, u32)> {
    if !line.contains("...") {
        return None;
    }
    let count = |re: &Regex| -> u32 {
        re.captures(line)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0)
    };
    Some((count(&*AHEAD_RE), count(&*BEHIND_RE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::github::GitHubCli;
    use crate::process::scripted::{fail, ok, ScriptedRunner};

    fn resolver(runner: ScriptedRunner) -> (Arc<ScriptedRunner>, BranchResolver) {
        let runner = Arc::new(runner);
        let git = GitCli::new(runner.clone(), None, 4096);
        let platform = Arc::new(GitHubCli::new(runner.clone(), None, 4096));
        (runner, BranchResolver::new(git, platform, "main"))
    }

    #[test]
    fn test_parse_remote_show_head() {
        let out = "* remote origin\n  Fetch URL: git@github.com:octo/repo.git\n  \
                   HEAD branch: trunk\n  Remote branches:\n";
        assert_eq!(parse_remote_show_head(out).as_deref(), Some("trunk"));
        assert_eq!(parse_remote_show_head("  HEAD branch: (unknown)\n"), None);
        assert_eq!(parse_remote_show_head("garbage"), None);
    }

    #[test]
    fn test_parse_remote_head_ref() {
        assert_eq!(parse_remote_head_ref("origin/develop").as_deref(), Some("develop"));
        assert_eq!(parse_remote_head_ref("upstream/main"), None);
    }

    #[test]
    fn test_parse_left_right_counts_is_behind_then_ahead() {
        assert_eq!(parse_left_right_counts("4\t2"), Some((2, 4)));
        assert_eq!(parse_left_right_counts("0 0"), Some((0, 0)));
        assert_eq!(parse_left_right_counts("oops"), None);
    }

    #[test]
    fn test_parse_status_counts() {
        assert_eq!(
            parse_status_counts("## feat...origin/feat [ahead 3, behind 1]"),
            Some((3, 1))
        );
        assert_eq!(parse_status_counts("## feat...origin/feat [behind 5]"), Some((0, 5)));
        assert_eq!(parse_status_counts("## feat...origin/feat"), Some((0, 0)));
        assert_eq!(parse_status_counts("## feat"), None);
    }

    #[tokio::test]
    async fn test_default_branch_prefers_hosting_platform() {
        let (runner, branches) =
            resolver(ScriptedRunner::new().on("gh", &["repo", "view"], vec![ok("develop\n")]));
        assert_eq!(branches.default_branch(Path::new("/repo")).await, "develop");
        assert!(!runner.was_called("git", &["remote", "show"]));
    }

    #[tokio::test]
    async fn test_default_branch_falls_back_to_remote_show() {
        let (_, branches) = resolver(
            ScriptedRunner::new()
                .on("gh", &[], vec![fail(1, "not a github repo")])
                .on("git", &["symbolic-ref"], vec![fail(128, "not a symbolic ref")])
                .on("git", &["remote", "show"], vec![ok("  HEAD branch: master\n")]),
        );
        assert_eq!(branches.default_branch(Path::new("/repo")).await, "master");
    }

    #[tokio::test]
    async fn test_default_branch_exhausted_chain_is_main() {
        let (_, branches) = resolver(
            ScriptedRunner::new()
                .on("gh", &[], vec![fail(1, "boom")])
                .on("git", &[], vec![fail(128, "fatal: not a git repository")]),
        );
        assert_eq!(branches.default_branch(Path::new("/repo")).await, "main");
    }

    #[tokio::test]
    async fn test_ahead_behind_falls_back_to_status_line() {
        let (_, branches) = resolver(
            ScriptedRunner::new()
                .on("git", &["rev-list"], vec![fail(128, "unknown revision origin/main")])
                .on("git", &["status", "-sb"], vec![ok("## feat...origin/feat [ahead 2]\n")]),
        );
        assert_eq!(branches.ahead_behind(Path::new("/repo"), "main").await, (2, 0));
    }

    #[tokio::test]
    async fn test_ahead_behind_without_tracking_is_zero() {
        let (_, branches) = resolver(
            ScriptedRunner::new()
                .on("git", &["rev-list"], vec![fail(128, "unknown revision")])
                .on("git", &["status", "-sb"], vec![ok("## feat\n")]),
        );
        assert_eq!(branches.ahead_behind(Path::new("/repo"), "main").await, (0, 0));
    }

    #[tokio::test]
    async fn test_status_combines_all_queries() {
        let (_, branches) = resolver(
            ScriptedRunner::new()
                .on("git", &["branch", "--show-current"], vec![ok("feature-x\n")])
                .on("gh", &["repo", "view"], vec![ok("main\n")])
                .on(
                    "git",
                    &["rev-list", "--left-right", "--count", "origin/main...HEAD"],
                    vec![ok("1\t3\n")],
                ),
        );
        assert_eq!(
            branches.status(Path::new("/repo")).await,
            BranchStatus {
                current_branch: "feature-x".to_string(),
                default_branch: "main".to_string(),
                ahead: 3,
                behind: 1,
            }
        );
    }
}
