//! Router-level tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use tower::ServiceExt;

use honeypot_agent::{AgentConfig, HoneypotAgent};
use honeypot_config::Settings;
use honeypot_core::{ReplyContext, ReplyGenerator};
use honeypot_server::{create_router, AppState, SessionManager};

fn app(settings: Settings) -> (Router, AppState) {
    let state = AppState::new(settings);
    (create_router(state.clone()), state)
}

fn post_turn(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/honeypot")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn turn_body(session_id: &str, text: &str, history: Value) -> String {
    json!({
        "sessionId": session_id,
        "message": {"sender": "scammer", "text": text, "timestamp": "2026-01-21T10:15:30Z"},
        "conversationHistory": history,
        "metadata": {"channel": "SMS", "language": "English", "locale": "IN"}
    })
    .to_string()
}

#[tokio::test]
async fn test_bank_fraud_turn() {
    let (app, state) = app(Settings::default());
    let body = turn_body(
        "bank-1",
        "URGENT: your account will be blocked, share your account number 1234567890123456 now",
        json!([]),
    );

    let response = app.oneshot(post_turn(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["sessionId"], "bank-1");
    assert_eq!(json["scamDetected"], true);
    assert_eq!(json["scamType"], "bank_fraud");
    assert!(json["confidence"].as_f64().unwrap() >= 0.6);
    assert_eq!(json["totalMessagesExchanged"], 2);
    assert_eq!(
        json["extractedIntelligence"]["bankAccounts"],
        json!(["1234567890123456"])
    );
    assert_eq!(json["extractedIntelligence"].as_object().unwrap().len(), 8);
    assert!(!json["reply"].as_str().unwrap().is_empty());
    assert!(json["agentNotes"]
        .as_str()
        .unwrap()
        .starts_with("Fraud category: bank_fraud"));
    assert_eq!(state.sessions.count(), 1);
}

#[tokio::test]
async fn test_evidence_accumulates_across_requests() {
    let (app, _state) = app(Settings::default());

    let first = "send to scammer.fraud@fakebank or call +91-9876543210";
    app.clone()
        .oneshot(post_turn(turn_body("multi", first, json!([]))))
        .await
        .unwrap();

    let history = json!([
        {"sender": "scammer", "text": first, "timestamp": 1769000000000u64},
        {"sender": "user", "text": "Which bank is this?", "timestamp": 1769000005000u64}
    ]);
    let response = app
        .clone()
        .oneshot(post_turn(turn_body(
            "multi",
            "Open http://sbi-kyc-verify.com/update now",
            history,
        )))
        .await
        .unwrap();
    let json = json_body(response).await;

    let intel = &json["extractedIntelligence"];
    assert_eq!(intel["paymentHandles"], json!(["scammer.fraud@fakebank"]));
    assert_eq!(intel["phoneNumbers"], json!(["+91-9876543210"]));
    assert_eq!(intel["links"], json!(["http://sbi-kyc-verify.com/update"]));
    assert_eq!(json["engagementMetrics"]["totalMessagesExchanged"], 4);

    let snapshot = json_body(app.oneshot(get("/api/sessions/multi")).await.unwrap()).await;
    assert_eq!(snapshot["turnCount"], 2);
}

#[tokio::test]
async fn test_malformed_body_fails_open() {
    let (app, state) = app(Settings::default());

    let response = app.clone().oneshot(post_turn("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["scamType"], "generic_scam");
    assert_eq!(json["confidence"], 0.6);
    assert_eq!(json["totalMessagesExchanged"], 0);
    assert!(json["extractedIntelligence"]["emailAddresses"]
        .as_array()
        .unwrap()
        .is_empty());

    let response = app
        .oneshot(post_turn(r#"{"sessionId": "keep", "message": 7}"#))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["sessionId"], "keep");
    assert_eq!(json["reply"], honeypot_server::http::FAIL_OPEN_REPLY);
    assert_eq!(state.sessions.count(), 0);
}

#[tokio::test]
async fn test_null_text_or_history_keeps_session_evidence() {
    let (app, _state) = app(Settings::default());

    app.clone()
        .oneshot(post_turn(turn_body("nulls", "call 9876543210 now", json!([]))))
        .await
        .unwrap();

    let null_text = json!({
        "sessionId": "nulls",
        "message": {"sender": "scammer", "text": null, "timestamp": 1769000000000u64},
        "conversationHistory": []
    });
    let json = json_body(
        app.clone()
            .oneshot(post_turn(null_text.to_string()))
            .await
            .unwrap(),
    )
    .await;
    assert_ne!(json["reply"], honeypot_server::http::FAIL_OPEN_REPLY);
    assert_eq!(json["extractedIntelligence"]["phoneNumbers"], json!(["9876543210"]));
    assert_eq!(json["totalMessagesExchanged"], 4);

    let null_history = json!({
        "sessionId": "nulls",
        "message": {"sender": "scammer", "text": "are you there?"},
        "conversationHistory": null
    });
    let json = json_body(app.oneshot(post_turn(null_history.to_string())).await.unwrap()).await;
    assert_ne!(json["reply"], honeypot_server::http::FAIL_OPEN_REPLY);
    assert_eq!(json["extractedIntelligence"]["phoneNumbers"], json!(["9876543210"]));
    assert_eq!(json["totalMessagesExchanged"], 6);
}

struct PanickingReplies;

#[async_trait]
impl ReplyGenerator for PanickingReplies {
    async fn generate(&self, _context: ReplyContext<'_>) -> honeypot_core::Result<String> {
        panic!("template pool exhausted");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

struct FailingReplies;

#[async_trait]
impl ReplyGenerator for FailingReplies {
    async fn generate(&self, _context: ReplyContext<'_>) -> honeypot_core::Result<String> {
        Err(honeypot_core::Error::Reply("generator offline".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn state_with_replies(replies: Arc<dyn ReplyGenerator>) -> AppState {
    let settings = Settings::default();
    AppState {
        sessions: Arc::new(SessionManager::from_settings(&settings.session)),
        agent: Arc::new(HoneypotAgent::new(AgentConfig::from_settings(&settings), replies)),
        config: Arc::new(RwLock::new(settings)),
    }
}

#[tokio::test]
async fn test_pipeline_faults_fail_open() {
    for replies in [
        Arc::new(PanickingReplies) as Arc<dyn ReplyGenerator>,
        Arc::new(FailingReplies) as Arc<dyn ReplyGenerator>,
    ] {
        let app = create_router(state_with_replies(replies));
        let body = turn_body("faulty", "share your account number 1234567890123456", json!([]));

        let response = app.oneshot(post_turn(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["sessionId"], "faulty");
        assert_eq!(json["scamDetected"], true);
        assert_eq!(json["scamType"], "generic_scam");
        assert_eq!(json["engagementMetrics"]["engagementDurationSeconds"], 0.0);
    }
}

fn auth_settings() -> Settings {
    let mut settings = Settings::default();
    settings.server.auth.enabled = true;
    settings.server.auth.api_key = Some("s3cret".to_string());
    settings
}

#[tokio::test]
async fn test_auth_rejects_missing_or_wrong_key() {
    let (app, _) = app(auth_settings());
    let body = turn_body("auth", "hello", json!([]));

    let response = app.clone().oneshot(post_turn(body.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Authentication error: Missing API key");

    let mut request = post_turn(body);
    request
        .headers_mut()
        .insert("x-api-key", "wrong".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_accepts_header_or_bearer() {
    let (app, _) = app(auth_settings());

    let mut request = post_turn(turn_body("auth", "hello", json!([])));
    request
        .headers_mut()
        .insert("x-api-key", "s3cret".parse().unwrap());
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::OK);

    let mut request = post_turn(turn_body("auth", "hello again", json!([])));
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::OK);

    // Public paths need no key
    assert_eq!(app.oneshot(get("/health")).await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_banner() {
    let mut settings = Settings::default();
    settings.enrichment.enabled = false;
    let (app, _) = app(settings);

    let health = json_body(app.clone().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "Honeypot API");

    let banner = json_body(app.clone().oneshot(get("/")).await.unwrap()).await;
    assert_eq!(banner["endpoints"]["honeypot"], "POST /honeypot");

    let ready = json_body(app.oneshot(get("/ready")).await.unwrap()).await;
    assert_eq!(ready["status"], "ready");
    assert_eq!(ready["checks"]["sessions"]["count"], 0);
    assert_eq!(ready["checks"]["enrichment"]["status"], "disabled");
}

#[tokio::test]
async fn test_session_inspection() {
    let (app, _) = app(Settings::default());

    let response = app.clone().oneshot(get("/api/sessions/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.clone()
        .oneshot(post_turn(turn_body("seen", "pay the fine to refund@ybl", json!([]))))
        .await
        .unwrap();

    let list = json_body(app.clone().oneshot(get("/api/sessions")).await.unwrap()).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["sessions"], json!(["seen"]));

    let snapshot = json_body(app.oneshot(get("/api/sessions/seen")).await.unwrap()).await;
    assert_eq!(snapshot["sessionId"], "seen");
    assert_eq!(snapshot["extractedIntelligence"]["paymentHandles"], json!(["refund@ybl"]));
}
