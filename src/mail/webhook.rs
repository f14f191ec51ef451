//! HTTP surface for the mail provider: inbound-mail POST plus liveness.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::router::{DeliveryRouter, InboundEmail};
use crate::core::config;

/// Shared state for the mail webhook routes.
#[derive(Clone)]
pub struct WebState {
    pub router: Arc<DeliveryRouter>,
}

/// The form fields the provider posts. Everything defaults to empty;
/// providers are inconsistent about which recipient fields they fill in.
#[derive(Debug, Default, Deserialize)]
pub struct InboundForm {
    #[serde(default)]
    pub recipient: String,
    #[serde(default, rename = "To")]
    pub to_header: String,
    #[serde(default, rename = "to")]
    pub to_lower: String,
    #[serde(default)]
    pub envelope: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, rename = "stripped-text")]
    pub stripped_text: String,
    #[serde(default, rename = "body-plain")]
    pub body_plain: String,
}

impl InboundForm {
    pub fn into_event(self) -> InboundEmail {
        let body = if self.stripped_text.trim().is_empty() {
            self.body_plain
        } else {
            self.stripped_text
        };

        InboundEmail {
            recipient_fields: vec![self.recipient, self.to_header, self.to_lower, self.envelope],
            sender: self.sender.trim().to_string(),
            subject: self.subject.trim().to_string(),
            body: body.trim().to_string(),
        }
    }
}

/// Build the mail-side router: inbound POST on the configured path, plus
/// `/` and `/health` for the hosting platform's liveness probe.
pub fn mail_routes(state: WebState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .route(config::MAIL_WEBHOOK_PATH.as_str(), post(inbound_mail_handler))
        .with_state(state)
}

/// GET / and /health: static ok.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Exact-match shared-secret check. An empty expected secret disables
/// authentication (development setups).
pub fn secret_matches(expected: &str, headers: &HeaderMap) -> bool {
    if expected.is_empty() {
        return true;
    }
    headers
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok())
        .map(|provided| provided == expected)
        .unwrap_or(false)
}

/// POST on the inbound-mail path.
///
/// Authentication failures are rejected with 403 before any state is
/// touched. Everything past that point answers 200: whether zero or ten
/// owners got notified, the provider has done its job and must not retry.
async fn inbound_mail_handler(
    State(state): State<WebState>,
    headers: HeaderMap,
    Form(form): Form<InboundForm>,
) -> Response {
    if !secret_matches(config::MAIL_WEBHOOK_SECRET.as_str(), &headers) {
        log::warn!("Rejected inbound mail webhook: shared-secret mismatch");
        return (StatusCode::FORBIDDEN, Json(json!({"error": "bad webhook secret"}))).into_response();
    }

    let delivered = state.router.route(form.into_event()).await;
    Json(json!({"ok": true, "delivered": delivered})).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn empty_secret_disables_the_check() {
        assert!(secret_matches("", &HeaderMap::new()));
    }

    #[test]
    fn missing_header_fails_when_secret_is_set() {
        assert!(!secret_matches("s3cret", &HeaderMap::new()));
    }

    #[test]
    fn header_must_match_exactly() {
        let mut headers = HeaderMap::new();
        headers.insert("x-webhook-secret", HeaderValue::from_static("s3cret"));
        assert!(secret_matches("s3cret", &headers));
        assert!(!secret_matches("other", &headers));
    }

    #[test]
    fn body_prefers_stripped_text() {
        let form = InboundForm {
            stripped_text: "clean".to_string(),
            body_plain: "raw".to_string(),
            ..Default::default()
        };
        assert_eq!(form.into_event().body, "clean");
    }

    #[test]
    fn body_falls_back_to_body_plain() {
        let form = InboundForm {
            body_plain: "raw".to_string(),
            ..Default::default()
        };
        assert_eq!(form.into_event().body, "raw");
    }

    #[test]
    fn all_recipient_fields_are_carried() {
        let form = InboundForm {
            recipient: "a@x.co".to_string(),
            to_header: "B <b@x.co>".to_string(),
            to_lower: "c@x.co".to_string(),
            envelope: r#"{"to":["d@x.co"]}"#.to_string(),
            ..Default::default()
        };
        assert_eq!(form.into_event().recipient_fields.len(), 4);
    }
}
