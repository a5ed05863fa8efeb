//! Authentication Middleware
//!
//! Shared-secret API key check for the honeypot HTTP API. The key may be sent
//! as an `x-api-key` header or as `Authorization: Bearer <key>`.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use honeypot_config::Settings;

use crate::ServerError;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Warn about disabled auth once per process
static AUTH_DISABLED_WARNED: AtomicBool = AtomicBool::new(false);

/// What to do with a request after reading the auth config
enum AuthCheck {
    Disabled,
    PublicPath,
    ConfigError(&'static str),
    CheckKey(String),
}

/// Read everything needed from config without holding the guard past return
fn check_auth_config(config: &Arc<RwLock<Settings>>, path: &str) -> AuthCheck {
    let config_guard = config.read();
    let auth_config = &config_guard.server.auth;

    if !auth_config.enabled {
        if !AUTH_DISABLED_WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "API authentication is DISABLED. Set HONEYPOT__SERVER__AUTH__ENABLED=true for production."
            );
        }
        return AuthCheck::Disabled;
    }

    if is_public_path(&auth_config.public_paths, path) {
        return AuthCheck::PublicPath;
    }

    match &auth_config.api_key {
        Some(key) if !key.is_empty() => AuthCheck::CheckKey(key.clone()),
        _ => AuthCheck::ConfigError("Auth is enabled but no API key is configured"),
    }
}

/// `/health` matches `/health` and `/health/...`, never `/healthz`
fn is_public_path(public_paths: &[String], path: &str) -> bool {
    public_paths.iter().any(|p| {
        path == p
            || path
                .strip_prefix(p.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Key presented by the caller, `x-api-key` taking precedence
fn presented_key(headers: &HeaderMap) -> Result<Option<String>, &'static str> {
    if let Some(value) = headers.get(API_KEY_HEADER) {
        return value
            .to_str()
            .map(|v| Some(v.trim().to_string()))
            .map_err(|_| "Invalid x-api-key header");
    }

    match headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(token) => Ok(Some(token.trim().to_string())),
            None => Err("Invalid Authorization header format. Expected: Bearer <token>"),
        },
        None => Ok(None),
    }
}

/// Authentication middleware
///
/// Public paths (health, readiness, metrics by default) bypass the check.
/// Missing or wrong keys get 401 with a JSON error body.
///
/// Enable via `HONEYPOT__SERVER__AUTH__ENABLED=true` and set the key with
/// `HONEYPOT__SERVER__AUTH__API_KEY` or `HONEYPOT_API_KEY`.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let config = match request.extensions().get::<Arc<RwLock<Settings>>>() {
        Some(cfg) => cfg.clone(),
        None => {
            tracing::error!("Config extension not found in request");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error").into_response();
        }
    };

    let path = request.uri().path().to_string();
    match check_auth_config(&config, &path) {
        AuthCheck::Disabled | AuthCheck::PublicPath => next.run(request).await,
        AuthCheck::ConfigError(msg) => {
            tracing::error!("{}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server authentication not configured").into_response()
        }
        AuthCheck::CheckKey(expected_key) => match presented_key(request.headers()) {
            Ok(Some(provided)) => {
                if constant_time_compare(provided.as_bytes(), expected_key.as_bytes()) {
                    next.run(request).await
                } else {
                    tracing::warn!(
                        path = %path,
                        forwarded_for = ?request.headers().get("X-Forwarded-For"),
                        "Invalid API key"
                    );
                    ServerError::Auth("Invalid API key".to_string()).into_response()
                }
            }
            Ok(None) => ServerError::Auth("Missing API key".to_string()).into_response(),
            Err(msg) => ServerError::Auth(msg.to_string()).into_response(),
        },
    }
}

/// Constant-time comparison
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
