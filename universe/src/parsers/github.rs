use std::collections::BTreeSet;

use serde_json::Value;

use super::{missing, str_field};
use crate::api::NormalizeError;
use crate::classify::EventKind;
use crate::config::SourceSettings;
use crate::event::{CanonicalEvent, Parsed};
use crate::time::Clock;

/// Wiki edit. Multi-page edits collapse to one event for the first page.
pub(super) fn wiki(payload: &Value, clock: &dyn Clock) -> Result<Parsed, NormalizeError> {
    let pages = payload
        .get("pages")
        .and_then(Value::as_array)
        .ok_or_else(|| missing("pages"))?;

    let page = pages.first().ok_or_else(|| {
        NormalizeError::MalformedPayload(String::from("wiki edit with an empty page list"))
    })?;

    // "created" or "edited", verbatim from the page entry
    let action = str_field(page, "/action")?;
    let title = str_field(page, "/title")?;
    let page_url = str_field(page, "/html_url")?;
    let repo = str_field(payload, "/repository/full_name")?;

    Ok(Parsed::Event(CanonicalEvent {
        event: EventKind::GithubWiki.to_string(),
        author: str_field(payload, "/sender/login")?.to_owned(),
        avatar: str_field(payload, "/sender/avatar_url")?.to_owned(),
        message: format!("{} {} on {}", title_case(action), title, repo),
        body: None,
        target: page_url.to_owned(),
        action_url: Some(page_url.to_owned()),
        time: clock.now_iso(),
        labels: None,
    }))
}

pub(super) fn issue(payload: &Value, clock: &dyn Clock) -> Result<Parsed, NormalizeError> {
    let action = str_field(payload, "/action")?;

    // "labeled" fires once per fresh issue on top of "opened"; noise.
    if action == "labeled" {
        return Ok(Parsed::Skip("labeling is implied by issue creation"));
    }

    let title = str_field(payload, "/issue/title")?;
    let number = payload
        .pointer("/issue/number")
        .and_then(Value::as_u64)
        .ok_or_else(|| missing("issue.number"))?;
    let issue_url = str_field(payload, "/issue/html_url")?;

    Ok(Parsed::Event(CanonicalEvent {
        event: EventKind::GithubIssue.to_string(),
        author: str_field(payload, "/sender/login")?.to_owned(),
        avatar: str_field(payload, "/sender/avatar_url")?.to_owned(),
        message: format!("{action} issue {title} (#{number})"),
        body: payload
            .pointer("/issue/body")
            .and_then(Value::as_str)
            .map(str::to_owned),
        target: issue_url.to_owned(),
        action_url: Some(issue_url.to_owned()),
        time: clock.now_iso(),
        labels: labels(payload.pointer("/issue/labels")),
    }))
}

/// Commit, issue and review comments all normalize the same way; only the
/// parent link differs. Commit comments have no parent issue, so the comment
/// itself becomes the target.
pub(super) fn comment(payload: &Value, clock: &dyn Clock) -> Result<Parsed, NormalizeError> {
    let comment_url = str_field(payload, "/comment/html_url")?;

    let issue = payload.get("issue").filter(|v| v.is_object());
    let target = match issue {
        Some(issue) => str_field(issue, "/html_url")?,
        None => comment_url,
    };

    Ok(Parsed::Event(CanonicalEvent {
        event: EventKind::GithubComment.to_string(),
        author: str_field(payload, "/sender/login")?.to_owned(),
        avatar: str_field(payload, "/sender/avatar_url")?.to_owned(),
        message: String::from("commented on"),
        body: payload
            .pointer("/comment/body")
            .and_then(Value::as_str)
            .map(str::to_owned),
        target: target.to_owned(),
        action_url: Some(comment_url.to_owned()),
        time: clock.now_iso(),
        labels: issue.and_then(|issue| labels(issue.get("labels"))),
    }))
}

pub(super) fn star(payload: &Value, clock: &dyn Clock) -> Result<Parsed, NormalizeError> {
    let repo_url = str_field(payload, "/repository/html_url")?;

    Ok(Parsed::Event(CanonicalEvent {
        event: EventKind::GithubStar.to_string(),
        author: str_field(payload, "/sender/login")?.to_owned(),
        avatar: str_field(payload, "/sender/avatar_url")?.to_owned(),
        message: String::from("starred"),
        body: None,
        target: repo_url.to_owned(),
        action_url: Some(repo_url.to_owned()),
        time: clock.now_iso(),
        labels: None,
    }))
}

pub(super) fn push(payload: &Value, clock: &dyn Clock) -> Result<Parsed, NormalizeError> {
    let commits = payload
        .get("commits")
        .and_then(Value::as_array)
        .ok_or_else(|| missing("commits"))?;

    let mut lines = Vec::with_capacity(commits.len());
    for commit in commits {
        let sha = commit
            .get("id")
            .or_else(|| commit.get("sha"))
            .and_then(Value::as_str)
            .ok_or_else(|| missing("commit id"))?;
        let url = str_field(commit, "/url")?;
        let message = commit
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim();

        let short = sha.get(..7).unwrap_or(sha);
        lines.push(format!("- [{short}]({url}) {message}"));
    }

    let count = commits.len();
    let noun = if count == 1 { "commit" } else { "commits" };

    Ok(Parsed::Event(CanonicalEvent {
        event: EventKind::GithubPush.to_string(),
        author: str_field(payload, "/sender/login")?.to_owned(),
        avatar: str_field(payload, "/sender/avatar_url")?.to_owned(),
        message: format!("pushed {count} {noun}"),
        body: (!lines.is_empty()).then(|| lines.join("\n")),
        target: str_field(payload, "/repository/html_url")?.to_owned(),
        action_url: None,
        time: clock.now_iso(),
        labels: None,
    }))
}

/// Fallback for recognized kinds without a dedicated transform: sender plus
/// a generic message is all the feed needs for them.
pub(super) fn basics(
    kind: EventKind,
    payload: &Value,
    settings: &SourceSettings,
    clock: &dyn Clock,
) -> Result<Parsed, NormalizeError> {
    let target = payload
        .pointer("/repository/html_url")
        .and_then(Value::as_str)
        .unwrap_or(&settings.default_target);

    Ok(Parsed::Event(CanonicalEvent {
        event: kind.to_string(),
        author: str_field(payload, "/sender/login")?.to_owned(),
        avatar: str_field(payload, "/sender/avatar_url")?.to_owned(),
        message: format!("triggered \"{kind}\""),
        body: None,
        target: target.to_owned(),
        action_url: None,
        time: clock.now_iso(),
        labels: None,
    }))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// GitHub sends labels as objects with a `name`; older payload dumps carry
/// bare strings. Absent or empty lists collapse to `None`.
fn labels(value: Option<&Value>) -> Option<BTreeSet<String>> {
    let entries = value?.as_array()?;

    let names: BTreeSet<String> = entries
        .iter()
        .filter_map(|label| {
            label
                .get("name")
                .and_then(Value::as_str)
                .or_else(|| label.as_str())
                .map(str::to_owned)
        })
        .collect();

    (!names.is_empty()).then_some(names)
}
