use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::chat::{ChatSink, DispatchError};
use crate::contracts::ChatMessage;
use crate::crm::{CrmDirectory, EnrichmentError, RecordKind};

/// Chat sink that keeps every accepted message in memory.
#[derive(Default)]
pub struct RecordingChatSink {
    messages: RwLock<Vec<ChatMessage>>,
    attempts: RwLock<usize>,
    reject_with: Option<u16>,
    delay: Option<Duration>,
}

impl RecordingChatSink {
    /// A sink whose every delivery is answered with `status`.
    pub fn rejecting(status: u16) -> Self {
        Self {
            reject_with: Some(status),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    pub async fn attempts(&self) -> usize {
        *self.attempts.read().await
    }
}

#[async_trait]
impl ChatSink for RecordingChatSink {
    async fn deliver(&self, message: &ChatMessage) -> Result<(), DispatchError> {
        *self.attempts.write().await += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = self.reject_with {
            return Err(DispatchError::UnexpectedStatus {
                status,
                body: "rejected".to_string(),
            });
        }

        self.messages.write().await.push(message.clone());
        Ok(())
    }
}

/// Fixed set of CRM records; unknown ids answer like a missing record.
#[derive(Default)]
pub struct StaticCrmDirectory {
    records: HashMap<(RecordKind, i64), String>,
    lookups: RwLock<Vec<(RecordKind, i64)>>,
    delay: Option<Duration>,
}

impl StaticCrmDirectory {
    pub fn with_person(mut self, id: i64, name: &str) -> Self {
        self.records.insert((RecordKind::Person, id), name.to_string());
        self
    }

    pub fn with_organization(mut self, id: i64, name: &str) -> Self {
        self.records
            .insert((RecordKind::Organization, id), name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn lookups(&self) -> Vec<(RecordKind, i64)> {
        self.lookups.read().await.clone()
    }
}

#[async_trait]
impl CrmDirectory for StaticCrmDirectory {
    async fn record_name(&self, kind: RecordKind, id: i64) -> Result<String, EnrichmentError> {
        self.lookups.write().await.push((kind, id));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.records
            .get(&(kind, id))
            .cloned()
            .ok_or(EnrichmentError::Status(404))
    }
}
