//! HTTP Endpoints
//!
//! REST API for the honeypot.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Json, Path, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Extension, Router,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use honeypot_agent::{SessionSnapshot, TurnOutcome};
use honeypot_core::classification::MIN_CONFIDENCE;
use honeypot_core::{parse_history, EngagementMetrics, EvidenceRecord, FraudCategory, Turn};

use crate::auth::{auth_middleware, API_KEY_HEADER};
use crate::metrics::{metrics_handler, record_fail_open};
use crate::state::AppState;
use crate::ServerError;

const SERVICE_NAME: &str = "Honeypot API";

/// Reply used when the turn pipeline cannot produce one
pub const FAIL_OPEN_REPLY: &str =
    "Sorry, my phone is acting strange. Can you please send that again slowly?";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let request_timeout = Duration::from_secs(config.server.timeout_seconds);
    drop(config);

    Router::new()
        .route("/", get(root))
        // Turn endpoint
        .route("/honeypot", post(honeypot))
        // Read-only session inspection
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(get_session))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn(
            |req: axum::extract::Request, next: axum::middleware::Next| async move {
                auth_middleware(req, next).await
            },
        ))
        .layer(Extension(state.config.clone()))
        // Answers 408 without the fail-open body; enrichment.timeout_ms is
        // validated to stay below it
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - disabled: permissive (development only)
/// - no origins configured: localhost:3000
/// - otherwise the configured origins, with credentials
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        } else {
            tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        }
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    // Credentials cannot be combined with wildcard headers
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .allow_credentials(true)
}

/// Inbound message. A missing or `null` text is an empty message.
#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// `POST /honeypot` body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoneypotRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    message: Option<InboundMessage>,
    /// Entries are parsed leniently; malformed ones are skipped
    #[serde(default)]
    conversation_history: Option<Vec<Value>>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// A request ready for the pipeline
#[derive(Debug)]
struct TurnRequest {
    session_id: String,
    text: String,
    history: Vec<Turn>,
}

/// `POST /honeypot` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoneypotResponse {
    pub status: String,
    pub reply: String,
    pub session_id: String,
    pub scam_detected: bool,
    pub scam_type: FraudCategory,
    pub confidence: f64,
    pub total_messages_exchanged: u32,
    pub extracted_intelligence: EvidenceRecord,
    pub engagement_metrics: EngagementMetrics,
    pub agent_notes: String,
}

impl HoneypotResponse {
    fn from_outcome(session_id: String, outcome: TurnOutcome) -> Self {
        Self {
            status: "success".to_string(),
            reply: outcome.reply,
            session_id,
            scam_detected: outcome.scam_detected,
            scam_type: outcome.classification.category,
            confidence: outcome.classification.confidence,
            total_messages_exchanged: outcome.metrics.total_messages_exchanged,
            extracted_intelligence: outcome.evidence,
            engagement_metrics: outcome.metrics,
            agent_notes: outcome.agent_notes,
        }
    }

    /// Well-formed answer for requests the pipeline could not handle
    pub fn fail_open(session_id: String) -> Self {
        Self {
            status: "success".to_string(),
            reply: FAIL_OPEN_REPLY.to_string(),
            session_id,
            scam_detected: true,
            scam_type: FraudCategory::GenericScam,
            confidence: MIN_CONFIDENCE,
            total_messages_exchanged: 0,
            extracted_intelligence: EvidenceRecord::new(),
            engagement_metrics: EngagementMetrics::default(),
            agent_notes: format!(
                "Fraud category: {} (confidence: {}). Processing degraded, analysis unavailable for this turn",
                FraudCategory::GenericScam,
                MIN_CONFIDENCE
            ),
        }
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse the raw body; on failure return the best session id available
fn parse_turn_request(body: &[u8]) -> Result<TurnRequest, (String, String)> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| (new_session_id(), e.to_string()))?;

    let recovered_id = value
        .get("sessionId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from);

    let request = HoneypotRequest::deserialize(&value).map_err(|e| {
        (
            recovered_id.clone().unwrap_or_else(new_session_id),
            e.to_string(),
        )
    })?;

    let session_id = request
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(new_session_id);

    if let Some(metadata) = &request.metadata {
        tracing::debug!(
            session_id = %session_id,
            channel = ?metadata.get("channel"),
            language = ?metadata.get("language"),
            "Request metadata"
        );
    }

    let (text, sender) = match request.message {
        Some(message) => (message.text.unwrap_or_default(), message.sender),
        None => (String::new(), None),
    };
    if let Some(sender) = sender.filter(|s| !s.eq_ignore_ascii_case("scammer")) {
        tracing::debug!(session_id = %session_id, sender = %sender, "Message from unexpected sender");
    }

    Ok(TurnRequest {
        session_id,
        history: parse_history(&request.conversation_history.unwrap_or_default()),
        text,
    })
}

async fn run_turn(state: &AppState, request: TurnRequest) -> Result<HoneypotResponse, ServerError> {
    let session = state.sessions.get_or_create(&request.session_id);
    let outcome = state
        .agent
        .process_turn(&session.state, &request.text, &request.history)
        .await?;
    Ok(HoneypotResponse::from_outcome(request.session_id, outcome))
}

/// Process one inbound message
///
/// Always answers 200 with a well-formed body; pipeline faults and malformed
/// bodies produce the fail-open response.
async fn honeypot(State(state): State<AppState>, body: Bytes) -> Json<HoneypotResponse> {
    let request = match parse_turn_request(&body) {
        Ok(request) => request,
        Err((session_id, reason)) => {
            tracing::warn!(session_id = %session_id, error = %reason, "Malformed request body");
            record_fail_open("malformed_request");
            return Json(HoneypotResponse::fail_open(session_id));
        }
    };

    let session_id = request.session_id.clone();
    let span = tracing::info_span!("turn", session_id = %session_id);
    let result = AssertUnwindSafe(run_turn(&state, request).instrument(span))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(response)) => Json(response),
        Ok(Err(e)) => {
            tracing::error!(session_id = %session_id, error = %e, "Turn pipeline failed");
            record_fail_open("pipeline_error");
            Json(HoneypotResponse::fail_open(session_id))
        }
        Err(_) => {
            tracing::error!(session_id = %session_id, "Turn pipeline panicked");
            record_fail_open("panic");
            Json(HoneypotResponse::fail_open(session_id))
        }
    }
}

/// Service banner
async fn root() -> Json<Value> {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "honeypot": "POST /honeypot",
            "health": "GET /health",
            "ready": "GET /ready",
            "metrics": "GET /metrics",
        }
    }))
}

/// Get a read-only session snapshot
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::Session(format!("Session not found: {}", id)))?;

    let snapshot = session
        .state
        .lock()
        .snapshot(&session.id, &state.agent.config().engagement);
    Ok(Json(snapshot))
}

/// List session ids
async fn list_sessions(State(state): State<AppState>) -> Json<Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "count": sessions.len(),
        "sessions": sessions,
    }))
}

/// Liveness
async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness: the session store has room and enrichment is either attached
/// or deliberately off
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let config = state.get_config();
    let session_count = state.sessions.count();
    let enrichment_wanted = config.enrichment.is_active();
    let enrichment_attached = state.agent.has_oracle();

    let status = if enrichment_wanted && !enrichment_attached {
        "degraded"
    } else {
        "ready"
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": status,
            "checks": {
                "sessions": {
                    "status": "ok",
                    "count": session_count,
                    "max": config.session.max_sessions,
                },
                "enrichment": {
                    "status": if enrichment_attached { "ok" } else if enrichment_wanted { "unavailable" } else { "disabled" },
                    "model": enrichment_attached.then(|| config.enrichment.model.clone()),
                },
            }
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use honeypot_config::Settings;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(Settings::default());
        let _ = create_router(state);
    }

    #[test]
    fn test_cors_with_origins_builds() {
        let mut settings = Settings::default();
        settings.server.cors_origins = vec!["https://dashboard.example".to_string()];
        let _ = create_router(AppState::new(settings));
    }

    #[test]
    fn test_parse_turn_request() {
        let body = br#"{
            "sessionId": "abc",
            "message": {"sender": "scammer", "text": "hello", "timestamp": "2026-01-01T00:00:00Z"},
            "conversationHistory": [{"sender": "scammer", "text": "earlier"}, 42],
            "metadata": {"channel": "SMS"}
        }"#;
        let request = parse_turn_request(body).unwrap();
        assert_eq!(request.session_id, "abc");
        assert_eq!(request.text, "hello");
        assert_eq!(request.history.len(), 1);
    }

    #[test]
    fn test_parse_turn_request_recovers_session_id() {
        let (session_id, _) =
            parse_turn_request(br#"{"sessionId": "keep-me", "conversationHistory": "oops"}"#)
                .unwrap_err();
        assert_eq!(session_id, "keep-me");

        let (session_id, _) = parse_turn_request(b"{not json").unwrap_err();
        assert!(uuid::Uuid::parse_str(&session_id).is_ok());
    }

    #[test]
    fn test_null_text_and_history_are_empty_input() {
        let request = parse_turn_request(
            br#"{"sessionId": "n", "message": {"sender": "scammer", "text": null}, "conversationHistory": null}"#,
        )
        .unwrap();
        assert_eq!(request.session_id, "n");
        assert!(request.text.is_empty());
        assert!(request.history.is_empty());

        let request = parse_turn_request(br#"{"sessionId": "n", "message": null}"#).unwrap();
        assert!(request.text.is_empty());
    }

    #[test]
    fn test_missing_session_id_is_generated() {
        let request = parse_turn_request(br#"{"message": {"text": "hi"}}"#).unwrap();
        assert!(uuid::Uuid::parse_str(&request.session_id).is_ok());
    }

    #[test]
    fn test_fail_open_shape() {
        let json = serde_json::to_value(HoneypotResponse::fail_open("s1".to_string())).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["scamDetected"], true);
        assert_eq!(json["scamType"], "generic_scam");
        assert_eq!(json["confidence"], 0.6);
        assert_eq!(json["engagementMetrics"]["totalMessagesExchanged"], 0);
        assert_eq!(json["extractedIntelligence"].as_object().unwrap().len(), 8);
    }
}
