use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::models::PaymentResponse;
use crate::services::{auth_service::Claims, checkout_service};

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Caller's orders, newest first")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_orders(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("📦 GET /orders - {}", claims.email);

    match checkout_service::list_orders(&db, &claims.email).await {
        Ok(orders) => {
            let orders: Vec<PaymentResponse> = orders.into_iter().map(PaymentResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "orders": orders
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to list orders for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "Orders",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = PaymentResponse),
        (status = 404, description = "Not one of the caller's orders")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_order(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let order_id = path.into_inner();
    log::info!("📦 GET /orders/{} - {}", order_id, claims.email);

    match checkout_service::get_order(&db, &claims.email, &order_id).await {
        Ok(order) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "order": PaymentResponse::from(order)
        })),
        Err(e) => {
            log::warn!("❌ Order {} unavailable: {}", order_id, e);
            e.error_response()
        }
    }
}
