use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::NormalizeError;

/// The normalized activity record every source is translated into. Built
/// once by a kind parser, validated, then handed to the feed sink; never
/// mutated afterwards.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CanonicalEvent {
    pub event: String,
    pub author: String,
    pub avatar: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub target: String,
    #[serde(rename = "actionUrl", skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeSet<String>>,
}

impl CanonicalEvent {
    /// Required fields must be non-empty before the event may reach the feed.
    pub fn validate(&self) -> Result<(), NormalizeError> {
        let required = [
            ("event", &self.event),
            ("author", &self.author),
            ("avatar", &self.avatar),
            ("message", &self.message),
            ("target", &self.target),
            ("time", &self.time),
        ];

        for (field, value) in required {
            if value.is_empty() {
                return Err(NormalizeError::InvalidEvent(field));
            }
        }

        Ok(())
    }
}

/// The three-outcome contract of a kind parser: either a canonical event, or
/// a deliberate suppression. Real failures travel as `NormalizeError`.
#[derive(Debug)]
pub enum Parsed {
    Event(CanonicalEvent),
    Skip(&'static str),
}

/// Forum notifications arrive as a sequence of JSON fragments. Merge them
/// into one mapping; later fragments overwrite earlier keys. Any structural
/// surprise yields `None` rather than an error, since foreign payloads are a
/// normal input here.
pub fn merge_fragments(payload: &Value) -> Option<Map<String, Value>> {
    let fragments = payload.as_array()?;

    let mut merged = Map::new();
    for fragment in fragments {
        for (key, value) in fragment.as_object()? {
            merged.insert(key.clone(), value.clone());
        }
    }

    Some(merged)
}
