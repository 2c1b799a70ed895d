use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::models::{ContactMessageResponse, PaymentResponse, ProductResponse, ReplyRequest, UpdateProductStatusRequest};
use crate::services::{
    admin_service::{self, AdminStats, RoleQuery, UpdateUserStatusRequest},
    auth_service::Claims,
    contact_service::{self, MessagesQuery},
    product_service::{self, StatusQuery},
};

fn deleted(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": message
    }))
}

// ==================== PRODUCTS ====================

#[utoipa::path(
    get,
    path = "/api/v1/admin/products",
    tag = "Admin",
    params(StatusQuery),
    responses((status = 200, description = "All products")),
    security(("bearer_auth" = []))
)]
pub async fn list_products(db: web::Data<MongoDB>, query: web::Query<StatusQuery>) -> HttpResponse {
    log::info!("🛡️  GET /admin/products (status: {:?})", query.status);

    match product_service::list_all(&db, query.status.as_deref()).await {
        Ok(products) => {
            let products: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "products": products
            }))
        }
        Err(e) => {
            log::warn!("❌ Failed to list products: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/products/{id}/status",
    tag = "Admin",
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductStatusRequest,
    responses(
        (status = 200, description = "Product moderated", body = ProductResponse),
        (status = 400, description = "Status must be released or rejected"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_product_status(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateProductStatusRequest>,
) -> HttpResponse {
    let product_id = path.into_inner();
    log::info!("🛡️  PATCH /admin/products/{}/status -> {}", product_id, request.status);

    match product_service::set_status(&db, &product_id, &request).await {
        Ok(product) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "product": ProductResponse::from(product)
        })),
        Err(e) => {
            log::warn!("❌ Moderation failed for {}: {}", product_id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/products/{id}",
    tag = "Admin",
    params(("id" = String, Path, description = "Product id")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not found")),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let product_id = path.into_inner();
    log::info!("🗑️  DELETE /admin/products/{}", product_id);

    match product_service::delete_any(&db, &product_id).await {
        Ok(()) => deleted("Product deleted"),
        Err(e) => {
            log::warn!("❌ Product deletion failed: {} - {}", product_id, e);
            e.error_response()
        }
    }
}

// ==================== USERS ====================

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    params(RoleQuery),
    responses((status = 200, description = "Users without password hashes")),
    security(("bearer_auth" = []))
)]
pub async fn list_users(db: web::Data<MongoDB>, query: web::Query<RoleQuery>) -> HttpResponse {
    log::info!("🛡️  GET /admin/users (role: {:?})", query.role);

    match admin_service::list_users(&db, query.role.as_deref()).await {
        Ok(users) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "users": users
        })),
        Err(e) => {
            log::warn!("❌ Failed to list users: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/users/{id}/status",
    tag = "Admin",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserStatusRequest,
    responses(
        (status = 200, description = "User status changed"),
        (status = 400, description = "Cannot deactivate yourself"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_user_status(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateUserStatusRequest>,
) -> HttpResponse {
    let user_id = path.into_inner();
    log::info!("🛡️  PATCH /admin/users/{}/status -> {}", user_id, request.is_active);

    match admin_service::set_user_active(&db, &claims.sub, &user_id, request.is_active).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) => {
            log::warn!("❌ User status change failed for {}: {}", user_id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}",
    tag = "Admin",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User and owned data deleted"),
        (status = 400, description = "Cannot delete yourself"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    log::info!("🗑️  DELETE /admin/users/{}", user_id);

    match admin_service::delete_user(&db, &claims.sub, &user_id).await {
        Ok(()) => deleted("User deleted"),
        Err(e) => {
            log::warn!("❌ User deletion failed: {} - {}", user_id, e);
            e.error_response()
        }
    }
}

// ==================== PAYMENTS & STATS ====================

#[utoipa::path(
    get,
    path = "/api/v1/admin/payments",
    tag = "Admin",
    responses((status = 200, description = "All payments, newest first")),
    security(("bearer_auth" = []))
)]
pub async fn list_payments(db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("💰 GET /admin/payments");

    match admin_service::list_payments(&db).await {
        Ok(payments) => {
            let payments: Vec<PaymentResponse> = payments.into_iter().map(PaymentResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "payments": payments
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to list payments: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    tag = "Admin",
    responses((status = 200, description = "Marketplace totals", body = AdminStats)),
    security(("bearer_auth" = []))
)]
pub async fn stats(db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("📊 GET /admin/stats");

    match admin_service::stats(&db).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => {
            log::error!("❌ Failed to compute stats: {}", e);
            e.error_response()
        }
    }
}

// ==================== MESSAGES ====================

#[utoipa::path(
    get,
    path = "/api/v1/admin/messages",
    tag = "Admin",
    params(MessagesQuery),
    responses((status = 200, description = "Contact messages, newest first")),
    security(("bearer_auth" = []))
)]
pub async fn list_messages(db: web::Data<MongoDB>, query: web::Query<MessagesQuery>) -> HttpResponse {
    log::info!("📨 GET /admin/messages (unread: {:?})", query.unread);

    match contact_service::list_all(&db, query.unread.unwrap_or(false)).await {
        Ok(messages) => {
            let messages: Vec<ContactMessageResponse> =
                messages.into_iter().map(ContactMessageResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "messages": messages
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to list messages: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/messages/{id}/read",
    tag = "Admin",
    params(("id" = String, Path, description = "Message id")),
    responses((status = 200, description = "Marked read", body = ContactMessageResponse), (status = 404, description = "Not found")),
    security(("bearer_auth" = []))
)]
pub async fn mark_message_read(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let message_id = path.into_inner();

    match contact_service::mark_admin_read(&db, &message_id).await {
        Ok(message) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": ContactMessageResponse::from(message)
        })),
        Err(e) => {
            log::warn!("❌ Failed to mark message {} read: {}", message_id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/messages/{id}/reply",
    tag = "Admin",
    params(("id" = String, Path, description = "Message id")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply stored", body = ContactMessageResponse),
        (status = 400, description = "Empty reply"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reply_to_message(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<ReplyRequest>,
) -> HttpResponse {
    let message_id = path.into_inner();
    log::info!("💬 POST /admin/messages/{}/reply", message_id);

    match contact_service::reply(&db, &message_id, &request).await {
        Ok(message) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": ContactMessageResponse::from(message)
        })),
        Err(e) => {
            log::warn!("❌ Reply failed for {}: {}", message_id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/messages/{id}",
    tag = "Admin",
    params(("id" = String, Path, description = "Message id")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not found")),
    security(("bearer_auth" = []))
)]
pub async fn delete_message(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let message_id = path.into_inner();
    log::info!("🗑️  DELETE /admin/messages/{}", message_id);

    match contact_service::delete(&db, &message_id).await {
        Ok(()) => deleted("Message deleted"),
        Err(e) => {
            log::warn!("❌ Message deletion failed: {} - {}", message_id, e);
            e.error_response()
        }
    }
}
