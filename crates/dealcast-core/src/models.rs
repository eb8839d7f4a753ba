use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::events::{EventAction, PayloadFormat};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    NewDeal,
    DealWon,
    Ignored,
}

impl Intent {
    pub fn is_notifiable(self) -> bool {
        !matches!(self, Intent::Ignored)
    }
}

/// Display and lookup fields of a deal as carried by a single webhook.
///
/// Every field is optional. Webhook feeds routinely omit display fields,
/// so absence is a normal state and never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DealSnapshot {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub person_name: Option<String>,
    pub org_name: Option<String>,
    pub owner_name: Option<String>,
    pub pipeline_name: Option<String>,
    pub stage_name: Option<String>,
    pub expected_close_date: Option<String>,
    pub status: Option<String>,
    pub person_id: Option<i64>,
    pub org_id: Option<i64>,
}

impl DealSnapshot {
    /// Reads the recognized fields out of a snapshot object, tolerating
    /// numeric strings and the `{value, name}` reference objects the
    /// legacy feed uses for linked records.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let (person_id, embedded_person) = reference(object.get("person_id"));
        let (org_id, embedded_org) = reference(object.get("org_id"));
        let (_, embedded_owner) = reference(object.get("user_id"));

        Self {
            id: object.get("id").and_then(integer),
            title: text(object, "title"),
            value: object.get("value").and_then(decimal),
            currency: text(object, "currency").map(|code| code.to_ascii_uppercase()),
            person_name: text(object, "person_name").or(embedded_person),
            org_name: text(object, "org_name").or(embedded_org),
            owner_name: text(object, "user_name")
                .or_else(|| text(object, "owner_name"))
                .or(embedded_owner),
            pipeline_name: text(object, "pipeline_name"),
            stage_name: text(object, "stage_name"),
            expected_close_date: text(object, "expected_close_date"),
            status: text(object, "status"),
            person_id,
            org_id,
        }
    }

    pub fn currency_code(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }
}

/// Outcome of classifying one inbound webhook.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassifiedEvent {
    pub intent: Intent,
    pub deal_id: Option<i64>,
    pub deal: DealSnapshot,
    pub previous_status: Option<String>,
    pub format: PayloadFormat,
    pub action: EventAction,
    pub object_type: String,
}

pub(crate) fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(value) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(raw) => raw.trim().parse().ok(),
        Value::Object(object) => object.get("value").and_then(integer),
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(number) => number.to_string(),
        Value::String(raw) => raw.trim().to_string(),
        _ => return None,
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

fn reference(value: Option<&Value>) -> (Option<i64>, Option<String>) {
    match value {
        Some(Value::Object(object)) => (
            object.get("value").and_then(integer),
            text(object, "name"),
        ),
        Some(other) => (integer(other), None),
        None => (None, None),
    }
}
