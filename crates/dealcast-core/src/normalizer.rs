use serde_json::Value;

use crate::errors::RejectionReason;
use crate::events::{EventAction, InboundPayload, RawEvent};
use crate::models::{ClassifiedEvent, DealSnapshot, Intent, text};
use crate::signature;

const DEAL_OBJECT: &str = "deal";
const STATUS_OPEN: &str = "open";
const STATUS_WON: &str = "won";

/// Classifies a parsed webhook body. Pure: the same body always yields the
/// same result.
pub fn normalize(raw: &RawEvent) -> Result<ClassifiedEvent, RejectionReason> {
    let payload = InboundPayload::detect(raw)?;

    let deal = DealSnapshot::from_json(payload.snapshot());
    let previous_status = payload
        .previous()
        .and_then(|previous| text(previous, "status"));
    let action = payload.action();
    let object_type = payload.object_type().to_ascii_lowercase();

    let intent = classify(
        &action,
        &object_type,
        deal.status.as_deref(),
        previous_status.as_deref(),
    );

    Ok(ClassifiedEvent {
        intent,
        deal_id: deal.id,
        deal,
        previous_status,
        format: payload.format(),
        action,
        object_type,
    })
}

/// Maps the discriminating fields of an event onto a notification intent.
///
/// Only deal events can notify. A new deal fires while it is still open; a
/// won notification fires only on the transition into `won`, so a repeated
/// update of an already won deal is ignored.
pub fn classify(
    action: &EventAction,
    object_type: &str,
    status: Option<&str>,
    previous_status: Option<&str>,
) -> Intent {
    if !object_type.trim().eq_ignore_ascii_case(DEAL_OBJECT) {
        return Intent::Ignored;
    }

    let is = |value: Option<&str>, expected: &str| {
        value.is_some_and(|value| value.trim().eq_ignore_ascii_case(expected))
    };

    match action {
        EventAction::Added if status.is_none() || is(status, STATUS_OPEN) => Intent::NewDeal,
        EventAction::Updated if is(status, STATUS_WON) && !is(previous_status, STATUS_WON) => {
            Intent::DealWon
        }
        EventAction::Added
        | EventAction::Updated
        | EventAction::Deleted
        | EventAction::Merged
        | EventAction::Other(_) => Intent::Ignored,
    }
}

/// Entry point for raw request bodies: optional signature check, JSON
/// parsing, then [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    secret: Option<String>,
    require_signature: bool,
}

impl Normalizer {
    pub fn new(secret: Option<String>, require_signature: bool) -> Self {
        Self {
            secret: secret.filter(|secret| !secret.is_empty()),
            require_signature,
        }
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Verifies `signature` against the exact body bytes when a secret is
    /// configured. An absent signature passes unless signatures are required.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), RejectionReason> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };

        match signature.map(str::trim).filter(|value| !value.is_empty()) {
            Some(provided) if signature::verify(secret, body, provided) => Ok(()),
            Some(_) => Err(RejectionReason::InvalidSignature),
            None if self.require_signature => Err(RejectionReason::MissingSignature),
            None => Ok(()),
        }
    }

    pub fn accept(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<ClassifiedEvent, RejectionReason> {
        self.verify(body, signature)?;

        let parsed: Value = serde_json::from_slice(body)
            .map_err(|err| RejectionReason::malformed(format!("invalid JSON: {err}")))?;
        let Value::Object(raw) = parsed else {
            return Err(RejectionReason::malformed("body must be a JSON object"));
        };

        normalize(&raw)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::events::PayloadFormat;

    fn classify_json(value: Value) -> Result<ClassifiedEvent, RejectionReason> {
        match value {
            Value::Object(raw) => normalize(&raw),
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn legacy_added_deal_is_new_deal() {
        let event = classify_json(json!({
            "event": "added.deal",
            "current": { "id": 42, "title": "Acme Deal", "value": 5000 }
        }))
        .unwrap();

        assert_eq!(event.intent, Intent::NewDeal);
        assert_eq!(event.deal_id, Some(42));
        assert_eq!(event.format, PayloadFormat::Legacy);
        assert_eq!(event.deal.title.as_deref(), Some("Acme Deal"));
        assert_eq!(event.previous_status, None);
    }

    #[test]
    fn meta_wrapped_change_to_won_is_deal_won() {
        let event = classify_json(json!({
            "meta": { "action": "change", "entity": "deal" },
            "data": { "id": 7, "status": "won" },
            "previous": { "status": "open" }
        }))
        .unwrap();

        assert_eq!(event.intent, Intent::DealWon);
        assert_eq!(event.deal_id, Some(7));
        assert_eq!(event.previous_status.as_deref(), Some("open"));
        assert_eq!(event.format, PayloadFormat::MetaWrapped);
    }

    #[test]
    fn won_without_previous_state_still_fires() {
        let event = classify_json(json!({
            "event": "updated.deal",
            "current": { "id": 9, "status": "won" }
        }))
        .unwrap();

        assert_eq!(event.intent, Intent::DealWon);
    }

    #[test]
    fn repeated_won_update_is_ignored() {
        let body = json!({
            "event": "updated.deal",
            "current": { "id": 9, "status": "won" },
            "previous": { "status": "won" }
        });

        assert_eq!(classify_json(body.clone()).unwrap().intent, Intent::Ignored);
        assert_eq!(classify_json(body).unwrap().intent, Intent::Ignored);
    }

    #[test]
    fn non_deal_objects_are_ignored_for_every_action() {
        for action in ["add", "change", "update", "delete", "merge", "won"] {
            let event = classify_json(json!({
                "meta": { "action": action, "entity": "person" },
                "data": { "id": 1, "status": "won" }
            }))
            .unwrap();
            assert_eq!(event.intent, Intent::Ignored, "action {action}");
        }

        let legacy = classify_json(json!({
            "event": "added.organization",
            "current": { "id": 1 }
        }))
        .unwrap();
        assert_eq!(legacy.intent, Intent::Ignored);
        assert_eq!(legacy.object_type, "organization");
    }

    #[test]
    fn classification_table() {
        let cases = [
            (EventAction::Added, None, None, Intent::NewDeal),
            (EventAction::Added, Some("open"), None, Intent::NewDeal),
            (EventAction::Added, Some("won"), None, Intent::Ignored),
            (EventAction::Updated, Some("won"), None, Intent::DealWon),
            (EventAction::Updated, Some("WON"), Some("open"), Intent::DealWon),
            (EventAction::Updated, Some("won"), Some("lost"), Intent::DealWon),
            (EventAction::Updated, Some("won"), Some("won"), Intent::Ignored),
            (EventAction::Updated, Some("lost"), Some("open"), Intent::Ignored),
            (EventAction::Updated, Some("open"), Some("open"), Intent::Ignored),
            (EventAction::Updated, None, None, Intent::Ignored),
            (EventAction::Deleted, Some("won"), None, Intent::Ignored),
        ];

        for (action, status, previous, expected) in cases {
            assert_eq!(
                classify(&action, "deal", status, previous),
                expected,
                "{action:?} {status:?} {previous:?}"
            );
        }
    }

    #[test]
    fn missing_display_fields_do_not_fail() {
        let event = classify_json(json!({
            "event": "added.deal",
            "current": {}
        }))
        .unwrap();

        assert_eq!(event.intent, Intent::NewDeal);
        assert_eq!(event.deal_id, None);
        assert_eq!(event.deal.title, None);
        assert_eq!(event.deal.value, None);
    }

    #[test]
    fn accept_rejects_non_object_and_invalid_json() {
        let normalizer = Normalizer::default();

        assert!(matches!(
            normalizer.accept(b"[1, 2]", None),
            Err(RejectionReason::MalformedPayload(_))
        ));
        assert!(matches!(
            normalizer.accept(b"{not json", None),
            Err(RejectionReason::MalformedPayload(_))
        ));
        assert!(matches!(
            normalizer.accept(br#"{"hello":"world"}"#, None),
            Err(RejectionReason::MalformedPayload(_))
        ));
    }

    #[test]
    fn accept_checks_signature_before_parsing() {
        let normalizer = Normalizer::new(Some("s3cret".to_string()), false);
        let body = br#"{"event":"added.deal","current":{"id":1}}"#;
        let digest = signature::sign("s3cret", body).unwrap();

        assert_eq!(
            normalizer.accept(b"{not json", Some("deadbeef")),
            Err(RejectionReason::InvalidSignature)
        );
        assert_eq!(
            normalizer.accept(body, Some(&digest)).unwrap().intent,
            Intent::NewDeal
        );
        assert_eq!(
            normalizer.accept(body, None).unwrap().intent,
            Intent::NewDeal
        );
    }

    #[test]
    fn required_signature_rejects_unsigned_bodies() {
        let normalizer = Normalizer::new(Some("s3cret".to_string()), true);
        let body = br#"{"event":"added.deal","current":{"id":1}}"#;

        assert_eq!(
            normalizer.accept(body, None),
            Err(RejectionReason::MissingSignature)
        );
        assert_eq!(
            normalizer.accept(body, Some("  ")),
            Err(RejectionReason::MissingSignature)
        );
    }

    #[test]
    fn empty_secret_disables_verification() {
        let normalizer = Normalizer::new(Some(String::new()), true);

        assert!(!normalizer.has_secret());
        assert!(normalizer.verify(b"{}", Some("bogus")).is_ok());
    }
}
