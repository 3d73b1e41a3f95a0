use serde_json::Value;

use crate::api::NormalizeError;
use crate::classify::EventKind;
use crate::config::SourceSettings;
use crate::event::Parsed;
use crate::time::Clock;
use crate::topics::TopicResolver;

mod forum;
mod github;

/// The parser registry: one transform per event kind. The match is
/// exhaustive, so a kind without a parser does not compile.
pub async fn parse_event(
    kind: EventKind,
    payload: &Value,
    settings: &SourceSettings,
    resolver: &dyn TopicResolver,
    clock: &dyn Clock,
) -> Result<Parsed, NormalizeError> {
    match kind {
        EventKind::GithubWiki => github::wiki(payload, clock),
        EventKind::GithubIssue => github::issue(payload, clock),
        EventKind::GithubComment => github::comment(payload, clock),
        EventKind::GithubStar => github::star(payload, clock),
        EventKind::GithubPush => github::push(payload, clock),

        // Fires on every Pages deploy, pure noise for the feed.
        EventKind::GithubPageBuild => Ok(Parsed::Skip("page builds are not surfaced")),

        EventKind::GithubGist
        | EventKind::GithubPing
        | EventKind::GithubCreate
        | EventKind::GithubDelete
        | EventKind::GithubDeploy
        | EventKind::GithubFork
        | EventKind::GithubMember
        | EventKind::GithubPullRequest
        | EventKind::GithubRelease
        | EventKind::GithubStatus
        | EventKind::GithubTeam => github::basics(kind, payload, settings, clock),

        EventKind::ForumNewPost => forum::new_post(payload, settings, resolver, clock).await,
    }
}

/// Look up a required string by JSON pointer.
fn str_field<'a>(value: &'a Value, pointer: &str) -> Result<&'a str, NormalizeError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| NormalizeError::UnsupportedEvent(format!("missing field {pointer}")))
}

fn missing(field: &str) -> NormalizeError {
    NormalizeError::UnsupportedEvent(format!("missing field {field}"))
}
