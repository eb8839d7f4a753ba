use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::models::{ClassifiedEvent, DealSnapshot, Intent};
use crate::money::format_currency;

pub const NEW_DEAL_COLOR: u32 = 0x00FF00;
pub const DEAL_WON_COLOR: u32 = 0xFFD700;
pub const UNNAMED_DEAL: &str = "Unnamed Deal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Celebration {
    pub icon: &'static str,
    pub headline: &'static str,
}

const fn celebration(icon: &'static str, headline: &'static str) -> Celebration {
    Celebration { icon, headline }
}

pub const NEW_DEAL_CELEBRATIONS: [Celebration; 5] = [
    celebration("🎉", "NEW DEAL ALERT!"),
    celebration("🚀", "DEAL LAUNCHED!"),
    celebration("✨", "FRESH OPPORTUNITY!"),
    celebration("🎊", "NEW DEAL INCOMING!"),
    celebration("💫", "OPPORTUNITY KNOCKING!"),
];

pub const DEAL_WON_CELEBRATIONS: [Celebration; 5] = [
    celebration("🏆", "DEAL WON!"),
    celebration("🎯", "BULLSEYE! DEAL CLOSED!"),
    celebration("🥳", "VICTORY!"),
    celebration("🔥", "ON FIRE! DEAL CLOSED!"),
    celebration("💰", "KA-CHING! DEAL WON!"),
];

pub const NEW_DEAL_PHRASES: [&str; 5] = [
    "Time to make magic happen! ✨",
    "Let's turn this opportunity into gold! 🏅",
    "Another chance to shine! 🌟",
    "The journey begins! 🚂",
    "Opportunity is knocking loud! 🚪",
];

pub const DEAL_WON_PHRASES: [&str; 5] = [
    "Pop the champagne! 🍾",
    "Victory dance time! 🕺",
    "We are CRUSHING it! 💪",
    "Another one for the win column! 📊",
    "Success tastes sweet! 🍰",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedField {
    pub icon: &'static str,
    pub label: &'static str,
    pub value: String,
    pub inline: bool,
}

/// A chat notification, independent of the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    intent: Intent,
    title: String,
    description: String,
    color: u32,
    fields: Vec<RenderedField>,
    footer: Option<String>,
    url: Option<String>,
    announcement: Option<String>,
}

impl RenderedMessage {
    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn fields(&self) -> &[RenderedField] {
        &self.fields
    }

    pub fn field(&self, label: &str) -> Option<&RenderedField> {
        self.fields.iter().find(|field| field.label == label)
    }

    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn announcement(&self) -> Option<&str> {
        self.announcement.as_deref()
    }
}

struct Style {
    celebrations: &'static [Celebration],
    phrases: &'static [&'static str],
    color: u32,
    footer: &'static str,
    announcement: &'static str,
}

fn style(intent: Intent) -> Option<Style> {
    match intent {
        Intent::NewDeal => Some(Style {
            celebrations: &NEW_DEAL_CELEBRATIONS,
            phrases: &NEW_DEAL_PHRASES,
            color: NEW_DEAL_COLOR,
            footer: "Pipedrive New Deal",
            announcement: "@here New opportunity!",
        }),
        Intent::DealWon => Some(Style {
            celebrations: &DEAL_WON_CELEBRATIONS,
            phrases: &DEAL_WON_PHRASES,
            color: DEAL_WON_COLOR,
            footer: "Pipedrive Deal Won",
            announcement: "@here Celebration time! 🎉",
        }),
        Intent::Ignored => None,
    }
}

pub fn deal_url(domain: &str, deal_id: i64) -> String {
    format!("https://{domain}.pipedrive.com/deal/{deal_id}")
}

/// Builds chat messages from classified events.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    crm_domain: Option<String>,
}

impl Renderer {
    pub fn new(crm_domain: Option<String>) -> Self {
        Self {
            crm_domain: crm_domain.filter(|domain| !domain.is_empty()),
        }
    }

    pub fn render(&self, event: &ClassifiedEvent) -> Option<RenderedMessage> {
        self.render_with(event, &mut rand::thread_rng())
    }

    /// Same as [`Renderer::render`] with a caller supplied source of
    /// randomness for the decorative headline and phrase.
    pub fn render_with<R: Rng + ?Sized>(
        &self,
        event: &ClassifiedEvent,
        rng: &mut R,
    ) -> Option<RenderedMessage> {
        let style = style(event.intent)?;
        let celebration = style.celebrations.choose(&mut *rng)?;
        let phrase = style.phrases.choose(&mut *rng)?;

        let deal = &event.deal;
        let url = match (self.crm_domain.as_deref(), event.deal_id.or(deal.id)) {
            (Some(domain), Some(deal_id)) => Some(deal_url(domain, deal_id)),
            _ => None,
        };

        Some(RenderedMessage {
            intent: event.intent,
            title: format!(
                "{icon} {headline} {icon}",
                icon = celebration.icon,
                headline = celebration.headline
            ),
            description: phrase.to_string(),
            color: style.color,
            fields: fields(deal, url.as_deref()),
            footer: Some(style.footer.to_string()),
            url,
            announcement: Some(style.announcement.to_string()),
        })
    }
}

fn fields(deal: &DealSnapshot, url: Option<&str>) -> Vec<RenderedField> {
    let field = |icon, label, value: String| RenderedField {
        icon,
        label,
        value,
        inline: true,
    };

    let mut fields = vec![
        field(
            "📝",
            "Deal Name",
            deal.title.clone().unwrap_or_else(|| UNNAMED_DEAL.to_string()),
        ),
        field(
            "💵",
            "Value",
            format_currency(deal.value, Some(deal.currency_code())),
        ),
    ];

    let optional = [
        ("👤", "Contact", deal.person_name.clone()),
        ("🏢", "Organization", deal.org_name.clone()),
        ("🎯", "Deal Owner", deal.owner_name.clone()),
        ("📊", "Pipeline", deal.pipeline_name.clone()),
        ("📍", "Stage", deal.stage_name.clone()),
        (
            "📅",
            "Expected Close",
            deal.expected_close_date.as_deref().map(format_close_date),
        ),
    ];
    fields.extend(
        optional
            .into_iter()
            .filter_map(|(icon, label, value)| value.map(|value| field(icon, label, value))),
    );

    if let Some(url) = url {
        fields.push(RenderedField {
            icon: "🔗",
            label: "Quick Access",
            value: format!("[View in Pipedrive]({url})"),
            inline: false,
        });
    }

    fields
}

/// `2024-06-30` (optionally followed by a time) becomes `6/30/2024`; other
/// text is shown as received.
fn format_close_date(raw: &str) -> String {
    raw.get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .map(|date| date.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}
