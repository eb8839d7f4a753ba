use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::contracts::CrmRecordEnvelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Person,
    Organization,
}

impl RecordKind {
    pub fn path(self) -> &'static str {
        match self {
            RecordKind::Person => "persons",
            RecordKind::Organization => "organizations",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichmentError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("lookup timed out")]
    TimedOut,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("unreadable response: {0}")]
    Malformed(String),
    #[error("record has no name")]
    MissingName,
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EnrichmentError::TimedOut
        } else {
            EnrichmentError::Transport(err.without_url().to_string())
        }
    }
}

/// Reads a record name out of a CRM reply. Any non-2xx status, an envelope
/// that does not parse or carries `success: false`, and a blank name are
/// all lookup failures.
pub fn read_record_name(status: StatusCode, body: &[u8]) -> Result<String, EnrichmentError> {
    if !status.is_success() {
        return Err(EnrichmentError::Status(status.as_u16()));
    }

    let envelope: CrmRecordEnvelope = serde_json::from_slice(body)
        .map_err(|err| EnrichmentError::Malformed(err.to_string()))?;
    if envelope.success == Some(false) {
        return Err(EnrichmentError::Malformed("success flag is false".to_string()));
    }

    envelope
        .data
        .and_then(|record| record.name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(EnrichmentError::MissingName)
}

/// Read access to display names of linked CRM records.
#[async_trait]
pub trait CrmDirectory: Send + Sync {
    async fn record_name(&self, kind: RecordKind, id: i64) -> Result<String, EnrichmentError>;
}

#[derive(Clone)]
pub struct PipedriveDirectory {
    http: Client,
    base_url: String,
    api_token: String,
}

impl PipedriveDirectory {
    pub fn new(http: Client, base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }

    fn record_url(&self, kind: RecordKind, id: i64) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            kind.path(),
            id
        )
    }
}

#[async_trait]
impl CrmDirectory for PipedriveDirectory {
    async fn record_name(&self, kind: RecordKind, id: i64) -> Result<String, EnrichmentError> {
        let response = self
            .http
            .get(self.record_url(kind, id))
            .query(&[("api_token", self.api_token.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        read_record_name(status, &body)
    }
}
