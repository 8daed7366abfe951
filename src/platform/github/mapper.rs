use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::platform::types::{CreatePullRequest, PullRequestInfo};

/// Fields requested from `gh pr view --json`.
pub const PR_VIEW_FIELDS: &str =
    "number,url,state,isDraft,mergeStateStatus,headRefName,baseRefName,title,author";

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("valid URL regex"));

static SSH_REMOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ssh://)?[\w.-]+@[\w.-]+(?::\d+)?[:/]([\w.-]+)/([\w.-]+?)(?:\.git)?/?$")
        .expect("valid SSH remote regex")
});

static HTTPS_REMOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:[^@/]+@)?[\w.-]+(?::\d+)?/([\w.-]+)/([\w.-]+?)(?:\.git)?/?$")
        .expect("valid HTTPS remote regex")
});

pub fn map_pull_request(json: &str) -> Result<PullRequestInfo> {
    Ok(serde_json::from_str(json)?)
}

/// The first URL-shaped token in `text`.
pub fn extract_first_url(text: &str) -> Option<String> {
    URL_RE.find(text).map(|m| m.as_str().to_string())
}

/// Extract `owner/repo` from an SSH (`git@host:owner/repo.git`) or HTTPS
/// (`https://host/owner/repo`) remote URL.
pub fn parse_remote_url(url: &str) -> Option<String> {
    let url = url.trim();
    let caps = SSH_REMOTE_RE
        .captures(url)
        .or_else(|| HTTPS_REMOTE_RE.captures(url))?;
    Some(format!("{}/{}", &caps[1], &caps[2]))
}

/// Whether gh's error text means the branch simply has no pull request.
pub fn is_no_pull_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["no pull requests", "no open pull requests", "not found"]
        .iter()
        .any(|phrase| lower.contains(phrase))
}

/// Command-line arguments for `gh pr create`.
pub fn create_args(pr: &CreatePullRequest) -> Vec<String> {
    let mut args = vec!["pr".to_string(), "create".to_string()];

    if let Some(repo) = &pr.repo {
        args.extend(["--repo".to_string(), repo.clone()]);
    }

    let mut fill = pr.fill;
    match (&pr.title, &pr.body) {
        (Some(title), body) => {
            args.extend(["--title".to_string(), title.clone()]);
            args.extend(["--body".to_string(), body.clone().unwrap_or_default()]);
        }
        (None, Some(body)) => {
            args.extend(["--body".to_string(), body.clone()]);
            fill |= !pr.web;
        }
        (None, None) => fill |= !pr.web,
    }

    args.extend(["--base".to_string(), pr.base.clone()]);
    args.extend(["--head".to_string(), pr.head.clone()]);

    if pr.draft {
        args.push("--draft".to_string());
    }
    if pr.web {
        args.push("--web".to_string());
    }
    if fill {
        args.push("--fill".to_string());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::types::PullRequestState;

    #[test]
    fn test_map_pull_request_from_gh_json() {
        let json = r#"{
            "author": {"id": "MDQ6", "is_bot": true, "login": "octocat", "name": "Octocat"},
            "baseRefName": "main",
            "headRefName": "feature-x",
            "isDraft": true,
            "mergeStateStatus": "CLEAN",
            "number": 42,
            "state": "OPEN",
            "title": "Add feature x",
            "url": "https://github.com/octo/repo/pull/42"
        }"#;
        let pr = map_pull_request(json).unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.state, PullRequestState::Open);
        assert!(pr.is_draft);
        assert_eq!(pr.author.login, "octocat");
        assert_eq!(pr.head_ref_name, "feature-x");
        assert!(pr.author.is_bot);

        let out = serde_json::to_value(&pr).unwrap();
        assert_eq!(out["headRefName"], "feature-x");
        assert_eq!(out["author"]["isBot"], true);
        assert!(out["author"].get("is_bot").is_none());
    }

    #[test]
    fn test_extract_first_url() {
        let out = "Creating pull request for feature-x into main in octo/repo\n\n\
                   https://github.com/octo/repo/pull/7\n";
        assert_eq!(
            extract_first_url(out).as_deref(),
            Some("https://github.com/octo/repo/pull/7")
        );
        assert_eq!(extract_first_url("no links here"), None);
    }

    #[test]
    fn test_parse_remote_url_forms() {
        assert_eq!(
            parse_remote_url("git@github.com:octo/repo.git").as_deref(),
            Some("octo/repo")
        );
        assert_eq!(
            parse_remote_url("https://github.com/octo/repo").as_deref(),
            Some("octo/repo")
        );
        assert_eq!(
            parse_remote_url("https://github.com/octo/my.repo.git\n").as_deref(),
            Some("octo/my.repo")
        );
        assert_eq!(
            parse_remote_url("ssh://git@github.com/octo/repo.git").as_deref(),
            Some("octo/repo")
        );
        assert_eq!(parse_remote_url("/srv/git/repo.git"), None);
    }

    #[test]
    fn test_no_pull_request_detection() {
        assert!(is_no_pull_request(
            "no pull requests found for branch \"feature-x\""
        ));
        assert!(is_no_pull_request("GraphQL: Could not resolve: Not Found"));
        assert!(!is_no_pull_request("HTTP 401: Bad credentials"));
    }

    #[test]
    fn test_create_args_with_title_and_flags() {
        let args = create_args(&CreatePullRequest {
            repo: Some("octo/repo".to_string()),
            title: Some("Add x".to_string()),
            body: None,
            base: "main".to_string(),
            head: "octo:feature-x".to_string(),
            draft: true,
            web: false,
            fill: false,
        });
        assert_eq!(
            args,
            [
                "pr", "create", "--repo", "octo/repo", "--title", "Add x", "--body", "", "--base",
                "main", "--head", "octo:feature-x", "--draft",
            ]
        );
    }

    #[test]
    fn test_create_args_without_title_fills_unless_web() {
        let mut pr = CreatePullRequest {
            base: "main".to_string(),
            head: "feature-x".to_string(),
            ..Default::default()
        };
        assert!(create_args(&pr).contains(&"--fill".to_string()));

        pr.web = true;
        let args = create_args(&pr);
        assert!(args.contains(&"--web".to_string()));
        assert!(!args.contains(&"--fill".to_string()));
    }
}
