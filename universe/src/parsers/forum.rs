use serde_json::{Map, Value};

use super::missing;
use crate::api::NormalizeError;
use crate::classify::EventKind;
use crate::config::SourceSettings;
use crate::event::{merge_fragments, CanonicalEvent, Parsed};
use crate::time::Clock;
use crate::topics::TopicResolver;

/// New forum post. The fragments carry everything except the topic's display
/// title, which takes a blocking lookup against the forum itself.
pub(super) async fn new_post(
    payload: &Value,
    settings: &SourceSettings,
    resolver: &dyn TopicResolver,
    clock: &dyn Clock,
) -> Result<Parsed, NormalizeError> {
    let merged = merge_fragments(payload).ok_or_else(|| {
        NormalizeError::MalformedPayload(String::from("forum payload is not a fragment list"))
    })?;

    let username = merged_str(&merged, "username")?;
    let referrer = merged_str(&merged, "referrer")?;
    let topic_id = merged
        .get("topic_id")
        .and_then(Value::as_u64)
        .ok_or_else(|| missing("topic_id"))?;
    let avatar_id = merged
        .get("uploaded_avatar_id")
        .and_then(Value::as_u64)
        .ok_or_else(|| missing("uploaded_avatar_id"))?;

    // post_type 1 is a reply, anything else a new topic
    let action_label = match merged.get("post_type").and_then(Value::as_u64) {
        Some(1) => "replied to",
        _ => "created",
    };

    // The title must resolve (or fail) before the event exists.
    let title = resolver.resolve_title(topic_id).await?;

    let time = ["updated_at", "baked_at"]
        .iter()
        .find_map(|key| {
            merged
                .get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| clock.now_iso());

    Ok(Parsed::Event(CanonicalEvent {
        event: EventKind::ForumNewPost.to_string(),
        author: username.to_owned(),
        avatar: format!(
            "{}/user_avatar/{}/{}/45/{}_2.png",
            settings.forum_url, settings.forum_host, username, avatar_id
        ),
        message: format!("{action_label} {title}"),
        body: merged
            .get("raw")
            .and_then(Value::as_str)
            .map(str::to_owned),
        target: referrer.to_owned(),
        action_url: None,
        time,
        labels: None,
    }))
}

fn merged_str<'a>(merged: &'a Map<String, Value>, key: &str) -> Result<&'a str, NormalizeError> {
    merged
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(key))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::new_post;
    use crate::api::NormalizeError;
    use crate::config::SourceSettings;
    use crate::event::Parsed;
    use crate::time::Clock;
    use crate::topics::TopicResolver;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_iso(&self) -> String {
            String::from("2015-03-11T00:00:00Z")
        }
    }

    struct FixedResolver(&'static str);

    #[async_trait]
    impl TopicResolver for FixedResolver {
        async fn resolve_title(&self, _topic_id: u64) -> Result<String, NormalizeError> {
            Ok(self.0.to_owned())
        }
    }

    struct FailingResolver(fn() -> NormalizeError);

    #[async_trait]
    impl TopicResolver for FailingResolver {
        async fn resolve_title(&self, _topic_id: u64) -> Result<String, NormalizeError> {
            Err((self.0)())
        }
    }

    fn fragments() -> Value {
        json!([
            {"username": "marcus", "uploaded_avatar_id": 12},
            {"referrer": "https://forums.pyblish.com/t/5", "topic_id": 5},
            {"raw": "Hello forum", "post_type": 1, "updated_at": "2015-03-10T12:00:00Z"}
        ])
    }

    fn unwrap_event(parsed: Parsed) -> crate::event::CanonicalEvent {
        match parsed {
            Parsed::Event(event) => event,
            Parsed::Skip(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    #[tokio::test]
    async fn reply_resolves_title_and_synthesizes_avatar() {
        let settings = SourceSettings::default();
        let resolver = FixedResolver("Pyblish 1.1 released");

        let event = unwrap_event(
            new_post(&fragments(), &settings, &resolver, &FixedClock)
                .await
                .unwrap(),
        );

        assert_eq!(event.event, "forum-newpost");
        assert_eq!(event.author, "marcus");
        assert_eq!(event.message, "replied to Pyblish 1.1 released");
        assert_eq!(
            event.avatar,
            "https://forums.pyblish.com/user_avatar/forums.pyblish.com/marcus/45/12_2.png"
        );
        assert_eq!(event.target, "https://forums.pyblish.com/t/5");
        assert_eq!(event.body.as_deref(), Some("Hello forum"));
        assert_eq!(event.time, "2015-03-10T12:00:00Z");
        assert!(event.validate().is_ok());
    }

    #[tokio::test]
    async fn new_topic_is_created_not_replied() {
        let settings = SourceSettings::default();
        let resolver = FixedResolver("Pipeline tips");

        let payload = json!([
            {"username": "marcus", "uploaded_avatar_id": 12, "topic_id": 9},
            {"referrer": "https://forums.pyblish.com/t/9", "post_type": 4}
        ]);

        let event = unwrap_event(
            new_post(&payload, &settings, &resolver, &FixedClock)
                .await
                .unwrap(),
        );

        assert_eq!(event.message, "created Pipeline tips");
        // neither updated_at nor baked_at present, the clock steps in
        assert_eq!(event.time, "2015-03-11T00:00:00Z");
    }

    #[tokio::test]
    async fn private_topic_never_becomes_an_event() {
        let settings = SourceSettings::default();
        let resolver = FailingResolver(|| NormalizeError::PrivateSource);

        let err = new_post(&fragments(), &settings, &resolver, &FixedClock)
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizeError::PrivateSource));
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let settings = SourceSettings::default();
        let resolver =
            FailingResolver(|| NormalizeError::UpstreamFetchError(String::from("status 500")));

        let err = new_post(&fragments(), &settings, &resolver, &FixedClock)
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizeError::UpstreamFetchError(_)));
    }
}
