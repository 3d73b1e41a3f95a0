use std::fmt;

use axum::http::HeaderMap;
use serde_json::Value;

use crate::config::SourceSettings;
use crate::event::merge_fragments;

/// Transport header the source-control host labels its notifications with.
pub const GITHUB_EVENT_HEADER: &str = "X-Github-Event";

/// Every event kind the parser registry knows. Adding a kind means adding a
/// variant here plus an arm in `parsers::parse_event`; the compiler keeps the
/// two in sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    GithubGist,
    GithubPing,
    GithubComment,
    GithubCreate,
    GithubDelete,
    GithubDeploy,
    GithubFork,
    GithubWiki,
    GithubIssue,
    GithubMember,
    GithubPageBuild,
    GithubPullRequest,
    GithubPush,
    GithubRelease,
    GithubStatus,
    GithubTeam,
    GithubStar,
    ForumNewPost,
}

impl EventKind {
    /// Wire-format table: transport event name to canonical kind. Must match
    /// the sending host's strings exactly.
    pub fn from_transport(event: &str) -> Option<EventKind> {
        match event {
            "gist" => Some(EventKind::GithubGist),
            "ping" => Some(EventKind::GithubPing),
            "commit_comment" | "issue_comment" | "pull_request_review_comment" => {
                Some(EventKind::GithubComment)
            }
            "create" => Some(EventKind::GithubCreate),
            "delete" => Some(EventKind::GithubDelete),
            "deployment" => Some(EventKind::GithubDeploy),
            "fork" => Some(EventKind::GithubFork),
            "gollum" => Some(EventKind::GithubWiki),
            "issues" => Some(EventKind::GithubIssue),
            "member" | "membership" => Some(EventKind::GithubMember),
            "page_build" => Some(EventKind::GithubPageBuild),
            "pull_request" => Some(EventKind::GithubPullRequest),
            "push" => Some(EventKind::GithubPush),
            "release" => Some(EventKind::GithubRelease),
            "status" => Some(EventKind::GithubStatus),
            "team_add" => Some(EventKind::GithubTeam),
            "watch" => Some(EventKind::GithubStar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::GithubGist => "github-gist",
            EventKind::GithubPing => "github-ping",
            EventKind::GithubComment => "github-comment",
            EventKind::GithubCreate => "github-create",
            EventKind::GithubDelete => "github-delete",
            EventKind::GithubDeploy => "github-deploy",
            EventKind::GithubFork => "github-fork",
            EventKind::GithubWiki => "github-wiki",
            EventKind::GithubIssue => "github-issue",
            EventKind::GithubMember => "github-member",
            EventKind::GithubPageBuild => "github-page-build",
            EventKind::GithubPullRequest => "github-pullrequest",
            EventKind::GithubPush => "github-push",
            EventKind::GithubRelease => "github-release",
            EventKind::GithubStatus => "github-status",
            EventKind::GithubTeam => "github-team",
            EventKind::GithubStar => "github-star",
            EventKind::ForumNewPost => "forum-newpost",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a notification's transport metadata, or failing that its payload
/// content, to an event kind. `None` is a normal outcome for foreign or
/// malformed input, never an error.
pub fn classify(
    headers: &HeaderMap,
    payload: &Value,
    settings: &SourceSettings,
) -> Option<EventKind> {
    if let Some(event) = headers.get(GITHUB_EVENT_HEADER) {
        return EventKind::from_transport(event.to_str().ok()?);
    }

    // No transport marker: probe for a forum post, which arrives as a list
    // of fragments whose merged `referrer` points back at the forum.
    let merged = merge_fragments(payload)?;
    let referrer = merged.get("referrer")?.as_str()?;

    if referrer.contains(&settings.forum_host) {
        return Some(EventKind::ForumNewPost);
    }

    None
}
