use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::value_objects::order_snapshot::InvoiceLine;

/// Response codes the gateway uses for an accepted payment.
pub const ALIF_SUCCESS_CODES: [i64; 2] = [0, 200];

/// Header carrying the payment channel; the gateway routes on it in addition to the body field.
pub const ALIF_GATE_HEADER: &str = "gate";

/// Minimal Alif payment gateway client built on reqwest.
pub struct AlifClient {
    http: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlifPaymentRequest {
    /// Merchant id.
    pub key: String,
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub callback_url: String,
    pub return_url: String,
    pub email: String,
    pub phone: String,
    pub gate: String,
    pub token: String,
    pub info: String,
    pub invoices: AlifInvoices,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlifInvoices {
    pub invoices: Vec<InvoiceLine>,
    pub is_hold_required: bool,
    pub is_outbox_marked: bool,
}

impl AlifInvoices {
    pub fn new(invoices: Vec<InvoiceLine>) -> Self {
        Self {
            invoices,
            is_hold_required: false,
            is_outbox_marked: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlifPaymentCreated {
    pub payment_url: String,
    pub message: Option<String>,
}

/// The gateway has answered with `code` or `status`, and with `url`, `payment_url` or
/// `redirect_url`, sometimes several of them at once.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlifCreateResponse {
    code: Option<Value>,
    status: Option<Value>,
    message: Option<String>,
    url: Option<String>,
    payment_url: Option<String>,
    redirect_url: Option<String>,
}

impl AlifCreateResponse {
    /// `code` wins; `status` only counts when it is an integer (it may also be a word like "success").
    fn result_code(&self) -> Option<i64> {
        [&self.code, &self.status]
            .into_iter()
            .flatten()
            .find_map(integer_code)
    }

    fn into_payment_url(self) -> Option<String> {
        [self.url, self.payment_url, self.redirect_url]
            .into_iter()
            .flatten()
            .find(|url| !url.trim().is_empty())
    }
}

fn integer_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum AlifGatewayError {
    #[error("alif gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("alif gateway returned an unreadable response: {0}")]
    Protocol(String),
    #[error("alif gateway rejected the payment ({code}): {message}")]
    Rejected { code: i64, message: String },
}

impl AlifClient {
    pub fn new(api_url: String, timeout: Duration) -> Result<Self, AlifGatewayError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Registers a payment and returns the page the customer must be redirected to.
    pub async fn create_payment(
        &self,
        request: &AlifPaymentRequest,
    ) -> Result<AlifPaymentCreated, AlifGatewayError> {
        info!(
            order_id = %request.order_id,
            amount = %request.amount,
            gate = %request.gate,
            "alif_client: creating payment"
        );

        let resp = self
            .http
            .post(&self.api_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ALIF_GATE_HEADER, &request.gate)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        let created = Self::parse_create_response(&body).inspect_err(|err| {
            error!(
                order_id = %request.order_id,
                http_status = %status,
                response_body = %body,
                error = %err,
                "alif_client: payment creation failed"
            );
        })?;

        Ok(created)
    }

    fn parse_create_response(body: &str) -> Result<AlifPaymentCreated, AlifGatewayError> {
        let parsed: AlifCreateResponse = serde_json::from_str(body)
            .map_err(|err| AlifGatewayError::Protocol(format!("response is not JSON: {err}")))?;

        let code = parsed
            .result_code()
            .ok_or_else(|| AlifGatewayError::Protocol("response has no status code".to_string()))?;

        if !ALIF_SUCCESS_CODES.contains(&code) {
            return Err(AlifGatewayError::Rejected {
                code,
                message: parsed
                    .message
                    .unwrap_or_else(|| "payment rejected by gateway".to_string()),
            });
        }

        let message = parsed.message.clone();
        let payment_url = parsed.into_payment_url().ok_or_else(|| {
            AlifGatewayError::Protocol("accepted response has no payment url".to_string())
        })?;

        Ok(AlifPaymentCreated {
            payment_url,
            message,
        })
    }
}
