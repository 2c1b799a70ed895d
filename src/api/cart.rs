use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::models::{AddCartItemRequest, CartResponse, UpdateCartItemRequest};
use crate::services::{auth_service::Claims, cart_service};

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    tag = "Cart",
    responses(
        (status = 200, description = "Current cart", body = CartResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_cart(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("🛒 GET /cart - {}", claims.email);

    match cart_service::get_cart(&db, &claims.email).await {
        Ok(cart) => HttpResponse::Ok().json(CartResponse::from(cart)),
        Err(e) => {
            log::error!("❌ Failed to load cart for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    tag = "Cart",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Item added", body = CartResponse),
        (status = 400, description = "Unavailable product, unknown unit or not enough stock"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_item(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<AddCartItemRequest>,
) -> HttpResponse {
    log::info!(
        "➕ POST /cart/items - {} x {} ({})",
        request.quantity,
        request.product_id,
        request.unit
    );

    match cart_service::add_item(&db, &claims.email, &request).await {
        Ok(cart) => HttpResponse::Ok().json(CartResponse::from(cart)),
        Err(e) => {
            log::warn!("❌ Add to cart failed for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/items",
    tag = "Cart",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity changed (0 removes the line)", body = CartResponse),
        (status = 404, description = "Line not in cart")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_item(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<UpdateCartItemRequest>,
) -> HttpResponse {
    log::info!(
        "✏️  PUT /cart/items - {} ({}) -> {}",
        request.product_id,
        request.unit,
        request.quantity
    );

    match cart_service::update_item(&db, &claims.email, &request).await {
        Ok(cart) => HttpResponse::Ok().json(CartResponse::from(cart)),
        Err(e) => {
            log::warn!("❌ Cart update failed for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{product_id}/{unit}",
    tag = "Cart",
    params(
        ("product_id" = String, Path, description = "Product id"),
        ("unit" = String, Path, description = "Unit name")
    ),
    responses(
        (status = 200, description = "Line removed", body = CartResponse),
        (status = 404, description = "Line not in cart")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_item(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (product_id, unit) = path.into_inner();
    log::info!("➖ DELETE /cart/items/{}/{}", product_id, unit);

    match cart_service::remove_item(&db, &claims.email, &product_id, &unit).await {
        Ok(cart) => HttpResponse::Ok().json(CartResponse::from(cart)),
        Err(e) => {
            log::warn!("❌ Cart removal failed for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    tag = "Cart",
    responses(
        (status = 200, description = "Cart cleared")
    ),
    security(("bearer_auth" = []))
)]
pub async fn clear_cart(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("🧹 DELETE /cart - {}", claims.email);

    match cart_service::clear_cart(&db, &claims.email).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Cart cleared"
        })),
        Err(e) => {
            log::error!("❌ Failed to clear cart for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}
