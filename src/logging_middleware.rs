// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode
//!
//! Passwords and tokens never reach the log: JSON fields that carry them are
//! replaced before printing, and non-JSON bodies are logged by size only.

use axum::body::to_bytes;
use axum::{body::Body, extract::Request, http::StatusCode, middleware::Next, response::Response};
use serde_json::Value;
use tracing::{debug, Level};

/// Largest body buffered for logging
const MAX_LOGGED_BODY: usize = 1024 * 1024;

const REDACTED_FIELDS: [&str; 5] = [
    "password",
    "token",
    "access_token",
    "refresh_token",
    "accessToken",
];

const REDACTED: &str = "[REDACTED]";

/// Replaces secret-bearing fields at any depth
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String(REDACTED.to_string());
                } else {
                    redact(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn describe_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut json) => {
            redact(&mut json);
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| REDACTED.to_string())
        }
        Err(_) => format!("<{} bytes, not JSON>", bytes.len()),
    }
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !tracing::enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, MAX_LOGGED_BODY)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

    if !bytes.is_empty() {
        debug!(
            method = %parts.method,
            uri = %parts.uri.path(),
            request_body = %describe_body(&bytes),
            "📥 Request"
        );
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        debug!(
            status = %parts.status,
            response_body = %describe_body(&bytes),
            "📤 Response"
        );
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redacts_nested_secrets() {
        let mut body = json!({
            "email": "user@example.com",
            "password": "hunter22",
            "nested": { "refresh_token": "r", "keep": 1 },
            "list": [{ "access_token": "a" }]
        });
        redact(&mut body);

        assert_eq!(body["email"], "user@example.com");
        assert_eq!(body["password"], REDACTED);
        assert_eq!(body["nested"]["refresh_token"], REDACTED);
        assert_eq!(body["nested"]["keep"], 1);
        assert_eq!(body["list"][0]["access_token"], REDACTED);
    }

    #[test]
    fn test_non_json_logged_by_size() {
        assert_eq!(describe_body(b"password=hunter22"), "<17 bytes, not JSON>");
    }
}
