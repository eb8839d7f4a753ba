pub mod relay;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use chrono::Utc;
use dealcast_core::{Normalizer, RejectionReason, Renderer, SIGNATURE_HEADER};
use dealcast_platform::{
    ChatSink, DiscordWebhook, Dispatcher, Enricher, ErrorResponse, HealthResponse,
    PipedriveDirectory, RelayConfig, ServiceEndpoints, ServiceIndex, WebhookResponse,
    build_http_client,
};
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

pub use relay::{Relay, RelayOutcome};

pub const SERVICE_NAME: &str = "Pipedrive-Discord Integration";
pub const WEBHOOK_PATH: &str = "/webhook/pipedrive";
pub const HEALTH_PATH: &str = "/health";

#[derive(Clone)]
pub struct AppState {
    relay: Arc<Relay>,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

/// Wires the production adapters described by `config`.
pub fn build_state(config: &RelayConfig) -> Result<AppState> {
    let sink = match config.chat_webhook_url.as_deref() {
        Some(url) => {
            let http = build_http_client(config.dispatch_timeout)?;
            Some(Arc::new(DiscordWebhook::new(http, url)) as Arc<dyn ChatSink>)
        }
        None => None,
    };

    let enricher = match config.crm_api_token.as_deref() {
        Some(token) => {
            let http = build_http_client(config.crm_timeout)?;
            let directory = PipedriveDirectory::new(http, &config.crm_api_base_url, token);
            Enricher::new(Arc::new(directory), config.crm_timeout)
        }
        None => Enricher::disabled(),
    };

    let relay = Relay::new(
        Normalizer::new(config.webhook_secret.clone(), config.require_signature),
        enricher,
        Renderer::new(config.crm_domain.clone()),
        Dispatcher::new(sink, config.dispatch_timeout),
    );

    Ok(AppState::new(relay))
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(HEALTH_PATH, get(health))
        .route("/healthz", get(health))
        .route(WEBHOOK_PATH, post(receive_webhook))
        .route("/webhook", post(receive_webhook))
        .route("/webhooks/pipedrive", post(receive_webhook))
        .with_state(state)
}

async fn index() -> Json<ServiceIndex> {
    Json(ServiceIndex {
        message: format!("{SERVICE_NAME} is running!"),
        endpoints: ServiceEndpoints {
            webhook: WEBHOOK_PATH.to_string(),
            health: HEALTH_PATH.to_string(),
        },
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now(),
    })
}

async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = Uuid::new_v4();
    let span = info_span!("webhook", %request_id);

    async move {
        let relay = &state.relay;
        let signature = match headers.get(SIGNATURE_HEADER) {
            Some(value) => match value.to_str() {
                Ok(value) => Some(value),
                Err(_) if relay.normalizer().has_secret() => {
                    return Err(rejection(RejectionReason::InvalidSignature));
                }
                Err(_) => None,
            },
            None => None,
        };

        // Accepted for compatibility with senders that never sign.
        if signature.is_none() && relay.normalizer().has_secret() {
            warn!("webhook secret is configured but request carries no signature");
        }

        let outcome = relay.handle(&body, signature).await.map_err(rejection)?;

        Ok(Json(WebhookResponse {
            status: outcome.status_text().to_string(),
            request_id,
            intent: outcome.event.intent,
            delivered: outcome.delivered,
        }))
    }
    .instrument(span)
    .await
}

fn rejection(err: RejectionReason) -> (StatusCode, Json<ErrorResponse>) {
    warn!("webhook rejected: {err}");

    let (status, error, detail) = match err {
        RejectionReason::MalformedPayload(detail) => {
            (StatusCode::BAD_REQUEST, "Invalid webhook data", Some(detail))
        }
        RejectionReason::InvalidSignature => (StatusCode::UNAUTHORIZED, "Invalid signature", None),
        RejectionReason::MissingSignature => (StatusCode::UNAUTHORIZED, "Missing signature", None),
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            detail,
        }),
    )
}
