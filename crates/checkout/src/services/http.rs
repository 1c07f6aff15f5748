//! HTTP client for a Stripe-compatible payment intents API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::payment::{IntentRequest, PaymentGateway, PaymentIntent};
use crate::error::GatewayError;

/// Payment gateway that calls `POST {base_url}/v1/payment_intents`.
///
/// Requests are form-encoded and authenticated with the secret key as a
/// bearer token. Automatic payment methods are always enabled.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    http: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpPaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPaymentGateway")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpPaymentGateway {
    /// Creates a gateway client. `timeout` bounds each whole request.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[tracing::instrument(skip(self, request), fields(amount = request.amount.cents()))]
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError> {
        let url = format!("{}/v1/payment_intents", self.base_url);
        let params = [
            ("amount", request.amount.cents().to_string()),
            ("currency", request.currency.clone()),
            ("description", request.description.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.timeout)
                } else {
                    GatewayError::Transport(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or(text);

            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntent = response.json().await?;
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::{
        Form, Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use common::Money;

    #[derive(Clone, Default)]
    struct Captured {
        form: Arc<Mutex<Option<HashMap<String, String>>>>,
        auth: Arc<Mutex<Option<String>>>,
        idempotency_key: Arc<Mutex<Option<String>>>,
    }

    async fn accept(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> impl IntoResponse {
        *captured.auth.lock().unwrap() = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *captured.idempotency_key.lock().unwrap() = headers
            .get("idempotency-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *captured.form.lock().unwrap() = Some(form);
        Json(serde_json::json!({
            "id": "pi_123",
            "object": "payment_intent",
            "client_secret": "pi_123_secret_abc",
        }))
    }

    async fn decline() -> impl IntoResponse {
        (
            StatusCode::PAYMENT_REQUIRED,
            Json(serde_json::json!({ "error": { "message": "Your card was declined." } })),
        )
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/")
    }

    fn request() -> IntentRequest {
        IntentRequest {
            amount: Money::from_cents(3000),
            currency: "usd".to_string(),
            description: "order from user 1".to_string(),
            idempotency_key: "checkout-1-abc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_intent_posts_form() {
        let captured = Captured::default();
        let base = serve(
            Router::new()
                .route("/v1/payment_intents", post(accept))
                .with_state(captured.clone()),
        )
        .await;
        let gateway = HttpPaymentGateway::new(base, "sk_test_key", Duration::from_secs(5)).unwrap();

        let intent = gateway.create_intent(request()).await.unwrap();

        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.client_secret, "pi_123_secret_abc");

        let form = captured.form.lock().unwrap().clone().unwrap();
        assert_eq!(form["amount"], "3000");
        assert_eq!(form["currency"], "usd");
        assert_eq!(form["description"], "order from user 1");
        assert_eq!(form["automatic_payment_methods[enabled]"], "true");
        assert_eq!(
            captured.auth.lock().unwrap().as_deref(),
            Some("Bearer sk_test_key")
        );
        assert_eq!(
            captured.idempotency_key.lock().unwrap().as_deref(),
            Some("checkout-1-abc")
        );
    }

    #[tokio::test]
    async fn test_error_body_becomes_rejected() {
        let base = serve(Router::new().route("/v1/payment_intents", post(decline))).await;
        let gateway = HttpPaymentGateway::new(base, "sk_test_key", Duration::from_secs(5)).unwrap();

        let err = gateway.create_intent(request()).await.unwrap_err();

        match err {
            GatewayError::Rejected { status, message } => {
                assert_eq!(status, 402);
                assert_eq!(message, "Your card was declined.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway =
            HttpPaymentGateway::new(format!("http://{addr}"), "k", Duration::from_secs(5)).unwrap();
        let err = gateway.create_intent(request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let gateway =
            HttpPaymentGateway::new("http://localhost", "sk_live_secret", Duration::from_secs(1))
                .unwrap();
        let debug = format!("{gateway:?}");
        assert!(!debug.contains("sk_live_secret"));
        assert!(debug.contains("<redacted>"));
    }
}
