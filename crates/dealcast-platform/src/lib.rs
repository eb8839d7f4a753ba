pub mod chat;
pub mod config;
pub mod contracts;
pub mod crm;
pub mod dispatch;
pub mod enrich;
pub mod http;
pub mod memory;

pub use chat::{ChatSink, DiscordWebhook, DispatchError};
pub use config::RelayConfig;
pub use contracts::{
    ChatEmbed, ChatField, ChatFooter, ChatMessage, ErrorResponse, HealthResponse, ServiceEndpoints,
    ServiceIndex, WebhookResponse,
};
pub use crm::{CrmDirectory, EnrichmentError, PipedriveDirectory, RecordKind, read_record_name};
pub use dispatch::Dispatcher;
pub use enrich::{Enricher, Enrichment, LookupFailure};
pub use http::build_http_client;
pub use memory::{RecordingChatSink, StaticCrmDirectory};
