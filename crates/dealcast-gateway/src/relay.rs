use dealcast_core::{ClassifiedEvent, Intent, Normalizer, RejectionReason, Renderer};
use dealcast_platform::{Dispatcher, Enricher};
use tracing::info;

/// What happened to one accepted webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayOutcome {
    pub event: ClassifiedEvent,
    /// `None` when nothing was sent, otherwise whether the chat webhook
    /// accepted the notification.
    pub delivered: Option<bool>,
}

impl RelayOutcome {
    pub fn status_text(&self) -> &'static str {
        match (self.event.intent, self.delivered) {
            (Intent::NewDeal, Some(_)) => "New deal notification sent",
            (Intent::DealWon, Some(_)) => "Deal won notification sent",
            _ => "Event received but no notification needed",
        }
    }
}

/// Normalizer, enricher, renderer and dispatcher wired into one
/// request-scoped pipeline.
#[derive(Clone)]
pub struct Relay {
    normalizer: Normalizer,
    enricher: Enricher,
    renderer: Renderer,
    dispatcher: Dispatcher,
}

impl Relay {
    pub fn new(
        normalizer: Normalizer,
        enricher: Enricher,
        renderer: Renderer,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            normalizer,
            enricher,
            renderer,
            dispatcher,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Runs one webhook body through the pipeline. Log lines carry no
    /// request id of their own; callers wrap this in a request span.
    pub async fn handle(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<RelayOutcome, RejectionReason> {
        let event = self.normalizer.accept(body, signature)?;
        info!(
            "{:?} {:?}.{} deal={:?} classified as {:?}",
            event.format, event.action, event.object_type, event.deal_id, event.intent
        );

        if !event.intent.is_notifiable() {
            return Ok(RelayOutcome {
                event,
                delivered: None,
            });
        }

        let enrichment = self.enricher.enrich(event.deal.clone()).await;
        if !enrichment.diagnostics.is_empty() {
            info!(
                "enrichment incomplete: {} lookup(s) failed",
                enrichment.diagnostics.len()
            );
        }
        let event = ClassifiedEvent {
            deal: enrichment.deal,
            ..event
        };

        let Some(message) = self.renderer.render(&event) else {
            return Ok(RelayOutcome {
                event,
                delivered: None,
            });
        };
        let delivered = self.dispatcher.dispatch(&message).await;

        Ok(RelayOutcome {
            event,
            delivered: Some(delivered),
        })
    }
}
