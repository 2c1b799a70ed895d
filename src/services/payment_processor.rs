use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::utils::{AppError, AppResult};

lazy_static! {
    /// Shared HTTP client for processor calls (connection reuse + timeouts)
    static ref HTTP_CLIENT: reqwest::Client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());
}

pub const INTENT_SUCCEEDED: &str = "succeeded";

/// Payment intent as returned by the processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Minor units (cents)
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn customer_email(&self) -> Option<&str> {
        self.metadata.get("customer_email").map(String::as_str)
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == INTENT_SUCCEEDED
    }
}

#[derive(Debug, Clone)]
pub struct CreateIntentRequest {
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub description: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_intent(&self, request: &CreateIntentRequest) -> AppResult<PaymentIntent>;

    async fn retrieve_intent(&self, intent_id: &str) -> AppResult<PaymentIntent>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Stripe PaymentIntents client (form-encoded requests, bearer auth).
pub struct StripeClient {
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(secret_key: &str, api_base: &str) -> Self {
        Self {
            secret_key: secret_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn intent_form(request: &CreateIntentRequest) -> Vec<(&'static str, String)> {
        vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.to_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("receipt_email", request.customer_email.clone()),
            ("description", request.description.clone()),
            ("metadata[customer_email]", request.customer_email.clone()),
        ]
    }

    async fn parse_response(response: reqwest::Response) -> AppResult<PaymentIntent> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Payment(format!("Failed to read processor response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::Payment(processor_error_message(status.as_u16(), &body)));
        }

        serde_json::from_str::<PaymentIntent>(&body)
            .map_err(|e| AppError::Payment(format!("Failed to parse payment intent: {}", e)))
    }
}

fn processor_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed.error.message.unwrap_or_else(|| "unknown error".to_string());
            match parsed.error.kind {
                Some(kind) => format!("{} ({})", message, kind),
                None => message,
            }
        }
        Err(_) => format!("Payment processor returned HTTP {}", status),
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_intent(&self, request: &CreateIntentRequest) -> AppResult<PaymentIntent> {
        log::info!(
            "💳 Creating payment intent: {} {} for {}",
            request.amount,
            request.currency,
            request.customer_email
        );

        let response = HTTP_CLIENT
            .post(format!("{}/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&Self::intent_form(request))
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("Failed to reach payment processor: {}", e)))?;

        Self::parse_response(response).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> AppResult<PaymentIntent> {
        if intent_id.is_empty() || !intent_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::BadRequest("Invalid payment intent id".to_string()));
        }

        log::info!("💳 Retrieving payment intent {}", intent_id);

        let response = HTTP_CLIENT
            .get(format!("{}/payment_intents/{}", self.api_base, intent_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("Failed to reach payment processor: {}", e)))?;

        Self::parse_response(response).await
    }
}

/// Converts a major-unit amount to processor minor units.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
