use chrono::{DateTime, Utc};
use dealcast_core::{Intent, RenderedMessage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRM_LOGO_URL: &str = "https://cdn.worldvectorlogo.com/logos/pipedrive.svg";

/// Body of a chat webhook call with one rich embed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<ChatEmbed>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<ChatField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<ChatFooter>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatFooter {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl ChatMessage {
    pub fn from_rendered(message: &RenderedMessage, timestamp: DateTime<Utc>) -> Self {
        let fields = message
            .fields()
            .iter()
            .map(|field| ChatField {
                name: format!("{} {}", field.icon, field.label),
                value: field.value.clone(),
                inline: field.inline,
            })
            .collect();

        Self {
            content: message.announcement().map(str::to_string),
            embeds: vec![ChatEmbed {
                title: message.title().to_string(),
                description: message.description().to_string(),
                color: message.color(),
                fields,
                footer: message.footer().map(|text| ChatFooter {
                    text: text.to_string(),
                    icon_url: Some(CRM_LOGO_URL.to_string()),
                }),
                timestamp,
                url: message.url().map(str::to_string),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub request_id: Uuid,
    pub intent: Intent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceIndex {
    pub message: String,
    pub endpoints: ServiceEndpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    pub webhook: String,
    pub health: String,
}

/// `GET /persons/{id}` and `GET /organizations/{id}` reply envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmRecordEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<CrmRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmRecord {
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use dealcast_core::{ClassifiedEvent, DealSnapshot, EventAction, PayloadFormat, Renderer};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    #[test]
    fn rendered_message_maps_onto_embed_schema() {
        let event = ClassifiedEvent {
            intent: Intent::NewDeal,
            deal_id: Some(42),
            deal: DealSnapshot {
                id: Some(42),
                title: Some("Acme Deal".to_string()),
                value: Some(Decimal::new(5000, 0)),
                ..DealSnapshot::default()
            },
            previous_status: None,
            format: PayloadFormat::Legacy,
            action: EventAction::Added,
            object_type: "deal".to_string(),
        };
        let rendered = Renderer::new(Some("acme".to_string()))
            .render(&event)
            .unwrap();
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let wire = serde_json::to_value(ChatMessage::from_rendered(&rendered, timestamp)).unwrap();

        assert_eq!(wire["content"], "@here New opportunity!");
        let embed = &wire["embeds"][0];
        assert_eq!(embed["color"], 0x00FF00);
        assert_eq!(embed["timestamp"], "2024-05-01T12:00:00Z");
        assert_eq!(embed["url"], "https://acme.pipedrive.com/deal/42");
        assert_eq!(embed["footer"]["text"], "Pipedrive New Deal");
        assert_eq!(
            embed["fields"][0],
            json!({ "name": "📝 Deal Name", "value": "Acme Deal", "inline": true })
        );
        assert_eq!(embed["fields"][1]["value"], "$5,000.00");
        assert_eq!(embed["fields"][2]["name"], "🔗 Quick Access");
        assert_eq!(embed["fields"][2]["inline"], false);
    }
}
