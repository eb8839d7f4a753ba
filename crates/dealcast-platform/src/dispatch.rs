use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dealcast_core::RenderedMessage;
use tracing::{error, info};

use crate::chat::{ChatSink, DispatchError};
use crate::contracts::ChatMessage;

/// Delivers rendered messages with a single, bounded attempt.
#[derive(Clone)]
pub struct Dispatcher {
    sink: Option<Arc<dyn ChatSink>>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(sink: Option<Arc<dyn ChatSink>>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    pub fn is_configured(&self) -> bool {
        self.sink.is_some()
    }

    pub async fn try_dispatch(&self, message: &RenderedMessage) -> Result<(), DispatchError> {
        let sink = self.sink.as_deref().ok_or(DispatchError::NotConfigured)?;
        let payload = ChatMessage::from_rendered(message, Utc::now());

        match tokio::time::timeout(self.timeout, sink.deliver(&payload)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::TimedOut),
        }
    }

    /// Returns whether the chat webhook accepted the message. Failures are
    /// logged here and not retried.
    pub async fn dispatch(&self, message: &RenderedMessage) -> bool {
        match self.try_dispatch(message).await {
            Ok(()) => {
                info!("{:?} notification delivered: {}", message.intent(), message.title());
                true
            }
            Err(err) => {
                error!("failed to deliver {:?} notification: {err}", message.intent());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use dealcast_core::{
        ClassifiedEvent, DealSnapshot, EventAction, Intent, PayloadFormat, Renderer,
    };

    use super::*;
    use crate::memory::RecordingChatSink;

    fn won_message() -> RenderedMessage {
        let event = ClassifiedEvent {
            intent: Intent::DealWon,
            deal_id: Some(7),
            deal: DealSnapshot {
                id: Some(7),
                status: Some("won".to_string()),
                ..DealSnapshot::default()
            },
            previous_status: Some("open".to_string()),
            format: PayloadFormat::MetaWrapped,
            action: EventAction::Updated,
            object_type: "deal".to_string(),
        };
        Renderer::default().render(&event).unwrap()
    }

    #[tokio::test]
    async fn delivers_exactly_once() {
        let sink = Arc::new(RecordingChatSink::default());
        let dispatcher = Dispatcher::new(Some(sink.clone()), Duration::from_secs(1));

        assert!(dispatcher.dispatch(&won_message()).await);

        let delivered = sink.messages().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].embeds[0].color, 0xFFD700);
    }

    #[tokio::test]
    async fn rejected_delivery_is_not_retried() {
        let sink = Arc::new(RecordingChatSink::rejecting(400));
        let dispatcher = Dispatcher::new(Some(sink.clone()), Duration::from_secs(1));

        assert!(!dispatcher.dispatch(&won_message()).await);
        assert_eq!(sink.attempts().await, 1);
        assert!(matches!(
            dispatcher.try_dispatch(&won_message()).await,
            Err(DispatchError::UnexpectedStatus { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn missing_sink_is_a_failure() {
        let dispatcher = Dispatcher::new(None, Duration::from_secs(1));

        assert!(!dispatcher.is_configured());
        assert_eq!(
            dispatcher.try_dispatch(&won_message()).await,
            Err(DispatchError::NotConfigured)
        );
    }

    #[tokio::test]
    async fn slow_sink_times_out() {
        let sink = Arc::new(RecordingChatSink::default().with_delay(Duration::from_millis(500)));
        let dispatcher = Dispatcher::new(Some(sink), Duration::from_millis(20));

        assert_eq!(
            dispatcher.try_dispatch(&won_message()).await,
            Err(DispatchError::TimedOut)
        );
    }
}
