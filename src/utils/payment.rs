//! Hosted checkout.
//!
//! [`PaymentGateway`] creates a checkout session for an order, reports
//! whether a session has been paid, and authenticates webhook deliveries.
//! [`StripeGateway`] talks to the Stripe REST API; [`StaticGateway`] is an
//! in-process stand-in for tests.

use std::future::Future;
use std::pin::Pin;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error};

use coursehub_config::PaymentConfig;
use coursehub_models::{OrderId, OrderItem};

/// Accepted clock skew between the signature timestamp and now, in seconds.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

pub type GatewayFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, PaymentError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment gateway is not configured")]
    NotConfigured,

    #[error("Payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected payment gateway response: {0}")]
    InvalidResponse(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(&'static str),

    #[error("Webhook timestamp outside the tolerance window")]
    SignatureExpired,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub name: String,
    pub unit_amount_cents: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    pub currency: String,
    pub lines: Vec<CheckoutLine>,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// One line per item, plus a service fee line when the fee is non-zero.
    pub fn for_order(order_id: OrderId, items: &[OrderItem], config: &PaymentConfig) -> Self {
        let mut lines: Vec<CheckoutLine> = items
            .iter()
            .map(|item| CheckoutLine {
                name: item.name.clone(),
                unit_amount_cents: item.unit_amount_cents(),
                quantity: item.quantity,
            })
            .collect();

        if config.service_fee_cents > 0 {
            lines.push(CheckoutLine {
                name: "Service fee".to_string(),
                unit_amount_cents: config.service_fee_cents,
                quantity: 1,
            });
        }

        let order = order_id.to_string();
        Self {
            order_id,
            currency: config.currency.clone(),
            lines,
            success_url: config.success_url(&order),
            cancel_url: config.cancel_url(&order),
        }
    }

    fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            ("client_reference_id".to_string(), self.order_id.to_string()),
            ("metadata[orderId]".to_string(), self.order_id.to_string()),
        ];

        for (i, line) in self.lines.iter().enumerate() {
            let prefix = format!("line_items[{}]", i);
            fields.push((format!("{prefix}[price_data][currency]"), self.currency.clone()));
            fields.push((format!("{prefix}[price_data][product_data][name]"), line.name.clone()));
            fields.push((
                format!("{prefix}[price_data][unit_amount]"),
                line.unit_amount_cents.to_string(),
            ));
            fields.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
        }

        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Completed {
        session_id: String,
        order_id: Option<OrderId>,
    },
    Expired {
        session_id: String,
        order_id: Option<OrderId>,
    },
    Ignored(String),
}

pub trait PaymentGateway: Send + Sync {
    fn create_checkout_session<'a>(
        &'a self,
        request: &'a CheckoutRequest,
    ) -> GatewayFuture<'a, CheckoutSession>;

    /// Whether the gateway reports the session as paid.
    fn session_paid<'a>(&'a self, session_id: &'a str) -> GatewayFuture<'a, bool>;

    /// Authenticates a webhook delivery and decodes its event.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<WebhookEvent, PaymentError>;
}

type HmacSha256 = Hmac<Sha256>;

/// Checks a `t=<unix>,v1=<hex>` signature header over `"{t}.{payload}"`.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    signature_header: &str,
    now: i64,
) -> Result<(), PaymentError> {
    if secret.is_empty() {
        return Err(PaymentError::NotConfigured);
    }

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(PaymentError::InvalidSignature("missing timestamp"))?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature("missing v1 signature"));
    }
    if (now - timestamp).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(PaymentError::SignatureExpired);
    }

    let matched = signatures.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    });

    if matched {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature("no matching signature"))
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: RawSession,
}

#[derive(Debug, Deserialize)]
struct RawSession {
    id: String,
    #[serde(default)]
    client_reference_id: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl RawSession {
    fn order_id(&self) -> Option<OrderId> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("orderId"))
            .and_then(|v| v.as_str())
            .or(self.client_reference_id.as_deref())
            .and_then(|s| s.parse().ok())
    }
}

pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
    let event: RawEvent = serde_json::from_slice(payload)?;
    let session = event.data.object;
    let order_id = session.order_id();

    Ok(match event.kind.as_str() {
        "checkout.session.completed" => WebhookEvent::Completed {
            session_id: session.id,
            order_id,
        },
        "checkout.session.expired" => WebhookEvent::Expired {
            session_id: session.id,
            order_id,
        },
        _ => WebhookEvent::Ignored(event.kind),
    })
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    async fn read_session(response: reqwest::Response) -> Result<SessionResponse, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(status = %status.as_u16(), message = %message, "Payment gateway rejected request");
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<SessionResponse>().await?)
    }
}

impl PaymentGateway for StripeGateway {
    fn create_checkout_session<'a>(
        &'a self,
        request: &'a CheckoutRequest,
    ) -> GatewayFuture<'a, CheckoutSession> {
        Box::pin(async move {
            if self.secret_key.is_empty() {
                return Err(PaymentError::NotConfigured);
            }

            let response = self
                .client
                .post(format!("{}/v1/checkout/sessions", self.api_base))
                .bearer_auth(&self.secret_key)
                .form(&request.form_fields())
                .send()
                .await?;

            let session = Self::read_session(response).await?;
            let url = session
                .url
                .ok_or_else(|| PaymentError::InvalidResponse("session has no url".to_string()))?;

            debug!(session.id = %session.id, order.id = %request.order_id, "Checkout session created");
            Ok(CheckoutSession {
                id: session.id,
                url,
            })
        })
    }

    fn session_paid<'a>(&'a self, session_id: &'a str) -> GatewayFuture<'a, bool> {
        Box::pin(async move {
            if self.secret_key.is_empty() {
                return Err(PaymentError::NotConfigured);
            }

            let response = self
                .client
                .get(format!("{}/v1/checkout/sessions/{}", self.api_base, session_id))
                .bearer_auth(&self.secret_key)
                .send()
                .await?;

            let session = Self::read_session(response).await?;
            Ok(session.payment_status.as_deref() == Some("paid"))
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<WebhookEvent, PaymentError> {
        verify_signature(&self.webhook_secret, payload, signature_header, now)?;
        parse_event(payload)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use static_gateway::{StaticGateway, sign_payload};

#[cfg(any(test, feature = "test-utils"))]
mod static_gateway {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// Builds a signature header accepted by [`verify_signature`].
    pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    /// Gateway double. Sessions are named `cs_test_{order id}`.
    pub struct StaticGateway {
        pub webhook_secret: String,
        paid: AtomicBool,
        fail_checkout: AtomicBool,
        requests: Mutex<Vec<CheckoutRequest>>,
    }

    impl StaticGateway {
        pub fn new(webhook_secret: impl Into<String>) -> Self {
            Self {
                webhook_secret: webhook_secret.into(),
                paid: AtomicBool::new(false),
                fail_checkout: AtomicBool::new(false),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn set_paid(&self, paid: bool) {
            self.paid.store(paid, Ordering::SeqCst);
        }

        pub fn set_fail_checkout(&self, fail: bool) {
            self.fail_checkout.store(fail, Ordering::SeqCst);
        }

        pub fn requests(&self) -> Vec<CheckoutRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }

        pub fn session_id_for(order_id: OrderId) -> String {
            format!("cs_test_{}", order_id.into_inner().simple())
        }
    }

    impl PaymentGateway for StaticGateway {
        fn create_checkout_session<'a>(
            &'a self,
            request: &'a CheckoutRequest,
        ) -> GatewayFuture<'a, CheckoutSession> {
            Box::pin(async move {
                if self.fail_checkout.load(Ordering::SeqCst) {
                    return Err(PaymentError::Rejected {
                        status: 402,
                        message: "checkout disabled".to_string(),
                    });
                }
                if let Ok(mut requests) = self.requests.lock() {
                    requests.push(request.clone());
                }
                let id = Self::session_id_for(request.order_id);
                Ok(CheckoutSession {
                    url: format!("https://checkout.test/pay/{}", id),
                    id,
                })
            })
        }

        fn session_paid<'a>(&'a self, _session_id: &'a str) -> GatewayFuture<'a, bool> {
            Box::pin(async move { Ok(self.paid.load(Ordering::SeqCst)) })
        }

        fn verify_webhook(
            &self,
            payload: &[u8],
            signature_header: &str,
            now: i64,
        ) -> Result<WebhookEvent, PaymentError> {
            verify_signature(&self.webhook_secret, payload, signature_header, now)?;
            parse_event(payload)
        }
    }
}
