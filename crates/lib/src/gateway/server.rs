//! Gateway HTTP server: health, webhook handshake, and webhook deliveries on a single port.

use crate::channels::whatsapp::{
    verify_handshake, HandshakeError, VerifyQuery, WebhookEnvelope, WhatsAppSender,
};
use crate::channels::InboundEvent;
use crate::clients::{ClientError, ClientManager};
use crate::config::Config;
use crate::llm::OpenAiClient;
use crate::pipeline::{Acknowledgement, EventDispatchPipeline};
use crate::responder::CompletionResponder;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for request handlers. Cloned per request; everything inside is read-only.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// Secret expected in `hub.verify_token`. None rejects every handshake.
    pub verify_token: Option<String>,
    pub pipeline: Arc<EventDispatchPipeline>,
}

/// Graph API sender on the shared messaging client.
pub fn whatsapp_sender(config: &Config, clients: &ClientManager) -> Result<WhatsAppSender, ClientError> {
    Ok(WhatsAppSender::new(
        config.whatsapp.access_token.clone(),
        config.whatsapp.phone_number_id.clone(),
        clients.acquire_messaging()?,
    )
    .with_api(
        &config.whatsapp.graph_api_base,
        &config.whatsapp.graph_api_version,
    ))
}

/// Completion-backed responder on the shared completion client.
pub fn completion_responder(
    config: &Config,
    clients: &ClientManager,
) -> Result<CompletionResponder, ClientError> {
    let client = OpenAiClient::new(
        Some(config.completion.base_url.clone()),
        config.completion.api_key.clone(),
        clients.acquire_completion()?,
    );
    Ok(CompletionResponder::new(
        client,
        config.completion.model.clone(),
        config.completion.system_prompt.clone(),
    ))
}

/// Wire the pipeline to handles from `clients`. Fails only if `clients` was already released.
pub fn build_state(config: &Config, clients: &ClientManager) -> Result<GatewayState, ClientError> {
    let responder = completion_responder(config, clients)?;
    let sender = whatsapp_sender(config, clients)?;
    if config.whatsapp.access_token.is_none() || config.whatsapp.phone_number_id.is_none() {
        log::warn!("whatsapp access token or phone number id not set; replies will not be delivered");
    }
    if config.whatsapp.verify_token.is_none() {
        log::warn!("whatsapp verify token not set; webhook handshakes will be rejected");
    }
    Ok(GatewayState {
        config: Arc::new(config.clone()),
        verify_token: config.whatsapp.verify_token.clone(),
        pipeline: Arc::new(EventDispatchPipeline::new(
            Arc::new(responder),
            Arc::new(sender),
        )),
    })
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/webhook", get(verify_webhook).post(handle_webhook))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Outbound clients are created before the listener opens and released once after the server
/// has drained. Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let clients = ClientManager::start(&config.clients).context("creating outbound clients")?;
    let state = build_state(&config, &clients).context("wiring webhook pipeline")?;
    let app = router(state);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            clients.release();
            return Err(e).with_context(|| format!("binding to {}", bind_addr));
        }
    };
    log::info!("gateway listening on {}", bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    clients.release();
    served.context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining in-flight webhook requests");
}

/// GET / returns a simple liveness JSON.
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "WhatsApp webhook relay is alive",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.config.gateway.port,
    }))
}

/// GET /webhook — verification handshake; echoes hub.challenge on success.
async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    match verify_handshake(&query, state.verify_token.as_deref()) {
        Ok(challenge) => {
            log::info!("webhook verified");
            (StatusCode::OK, challenge).into_response()
        }
        Err(HandshakeError::Mismatch) => {
            log::warn!("webhook verification failed: token or mode mismatch");
            StatusCode::FORBIDDEN.into_response()
        }
        Err(HandshakeError::Incomplete) => {
            log::warn!("webhook verification failed: missing hub.mode or hub.verify_token");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

/// POST /webhook — one delivery; answered after the reply (if any) has been sent.
/// A body that is not JSON is malformed input like any other and is still acknowledged.
async fn handle_webhook(State(state): State<GatewayState>, body: Bytes) -> StatusCode {
    let ack = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(body) => {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "incoming webhook message:\n{}",
                    serde_json::to_string_pretty(&body).unwrap_or_default()
                );
            }
            let envelope = WebhookEnvelope::from_json(body);
            state.pipeline.handle(&envelope).await
        }
        Err(e) => {
            log::warn!("webhook body is not JSON: {}", e);
            let delivery_id = uuid::Uuid::new_v4().to_string();
            state
                .pipeline
                .dispatch(&delivery_id, InboundEvent::malformed("body is not JSON"))
                .await
        }
    };
    match ack {
        Acknowledgement::Accepted => StatusCode::OK,
        Acknowledgement::NotFound => StatusCode::NOT_FOUND,
    }
}
