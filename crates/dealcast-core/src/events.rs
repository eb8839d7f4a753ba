use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::RejectionReason;

/// An inbound webhook body exactly as received.
pub type RawEvent = Map<String, Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    Legacy,
    MetaWrapped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Added,
    Updated,
    Deleted,
    Merged,
    Other(String),
}

impl EventAction {
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "add" | "added" | "create" | "created" => Self::Added,
            "change" | "changed" | "update" | "updated" => Self::Updated,
            "delete" | "deleted" => Self::Deleted,
            "merge" | "merged" => Self::Merged,
            _ => Self::Other(normalized),
        }
    }
}

/// The payload shapes accepted on the webhook endpoint.
///
/// Detected once per request. Every accessor matches on the variant
/// exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload<'a> {
    /// `{ meta: { action, object | entity }, data, previous? }`
    MetaWrapped {
        action: &'a str,
        object: &'a str,
        data: &'a Map<String, Value>,
        previous: Option<&'a Map<String, Value>>,
    },
    /// `{ event: "<action>.<object>", current, previous? }`
    Legacy {
        event: &'a str,
        current: &'a Map<String, Value>,
        previous: Option<&'a Map<String, Value>>,
    },
}

impl<'a> InboundPayload<'a> {
    pub fn detect(raw: &'a RawEvent) -> Result<Self, RejectionReason> {
        let previous = object(raw, "previous");

        if let Some(meta) = object(raw, "meta") {
            let action = string(meta, "action");
            let object_type = string(meta, "object").or_else(|| string(meta, "entity"));
            if let (Some(action), Some(object_type), Some(data)) =
                (action, object_type, object(raw, "data"))
            {
                return Ok(Self::MetaWrapped {
                    action,
                    object: object_type,
                    data,
                    previous,
                });
            }
        }

        if let (Some(event), Some(current)) = (string(raw, "event"), object(raw, "current")) {
            return Ok(Self::Legacy {
                event,
                current,
                previous,
            });
        }

        Err(RejectionReason::malformed(
            "expected either meta.action, meta.object and data, or event and current",
        ))
    }

    pub fn format(&self) -> PayloadFormat {
        match self {
            Self::MetaWrapped { .. } => PayloadFormat::MetaWrapped,
            Self::Legacy { .. } => PayloadFormat::Legacy,
        }
    }

    pub fn action(&self) -> EventAction {
        match self {
            Self::MetaWrapped { action, .. } => EventAction::parse(action),
            Self::Legacy { event, .. } => EventAction::parse(split_event(*event).0),
        }
    }

    pub fn object_type(&self) -> &'a str {
        match self {
            Self::MetaWrapped { object, .. } => (*object).trim(),
            Self::Legacy { event, .. } => split_event(*event).1,
        }
    }

    pub fn snapshot(&self) -> &'a Map<String, Value> {
        match self {
            Self::MetaWrapped { data, .. } => *data,
            Self::Legacy { current, .. } => *current,
        }
    }

    pub fn previous(&self) -> Option<&'a Map<String, Value>> {
        match self {
            Self::MetaWrapped { previous, .. } | Self::Legacy { previous, .. } => *previous,
        }
    }
}

/// Splits `"added.deal"` into `("added", "deal")`. Without a dot the whole
/// string is the action and the object type is empty.
fn split_event(event: &str) -> (&str, &str) {
    let event = event.trim();
    event.split_once('.').unwrap_or((event, ""))
}

fn object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

fn string<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}
