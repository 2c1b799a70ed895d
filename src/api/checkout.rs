use actix_web::{web, HttpResponse, ResponseError};

use crate::config::AppConfig;
use crate::database::MongoDB;
use crate::models::PaymentResponse;
use crate::services::{
    auth_service::Claims,
    checkout_service::{self, ConfirmCheckoutRequest, PaymentIntentResponse},
    PaymentProcessor,
};

#[utoipa::path(
    post,
    path = "/api/v1/checkout/payment-intent",
    tag = "Checkout",
    responses(
        (status = 200, description = "Payment intent created", body = PaymentIntentResponse),
        (status = 400, description = "Empty cart or unavailable items"),
        (status = 502, description = "Payment processor error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_payment_intent(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    processor: web::Data<dyn PaymentProcessor>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    log::info!("💳 POST /checkout/payment-intent - {}", claims.email);

    match checkout_service::create_payment_intent(&db, processor.get_ref(), &claims.email, &config.currency).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("❌ Payment intent failed for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/checkout/confirm",
    tag = "Checkout",
    request_body = ConfirmCheckoutRequest,
    responses(
        (status = 201, description = "Order recorded", body = PaymentResponse),
        (status = 200, description = "Order was already recorded for this intent", body = PaymentResponse),
        (status = 400, description = "Intent not paid, not owned or not matching the cart"),
        (status = 409, description = "Stock ran out while confirming")
    ),
    security(("bearer_auth" = []))
)]
pub async fn confirm(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    processor: web::Data<dyn PaymentProcessor>,
    claims: web::ReqData<Claims>,
    request: web::Json<ConfirmCheckoutRequest>,
) -> HttpResponse {
    let request = request.into_inner();
    log::info!("🧾 POST /checkout/confirm - {} ({})", claims.email, request.payment_intent_id);

    let result = checkout_service::confirm(
        db.get_ref(),
        processor.get_ref(),
        &claims.email,
        &claims.name,
        &config.currency,
        request,
    )
    .await;

    match result {
        Ok(outcome) => {
            let body = serde_json::json!({
                "success": true,
                "payment": PaymentResponse::from(outcome.payment)
            });
            if outcome.created {
                HttpResponse::Created().json(body)
            } else {
                HttpResponse::Ok().json(body)
            }
        }
        Err(e) => {
            log::warn!("❌ Checkout failed for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}
