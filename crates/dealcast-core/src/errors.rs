use thiserror::Error;

/// Reasons an inbound webhook is refused before it reaches classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("signature does not match request body")]
    InvalidSignature,
    #[error("signature header is required")]
    MissingSignature,
}

impl RejectionReason {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedPayload(detail.into())
    }
}
