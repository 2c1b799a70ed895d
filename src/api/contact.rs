use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::models::{ContactMessageResponse, ContactRequest};
use crate::services::{auth_service::Claims, contact_service};

#[utoipa::path(
    post,
    path = "/api/v1/contact",
    tag = "Contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message received", body = ContactMessageResponse),
        (status = 400, description = "Invalid message")
    )
)]
pub async fn submit(db: web::Data<MongoDB>, request: web::Json<ContactRequest>) -> HttpResponse {
    log::info!("📨 POST /contact - {}", request.email);

    match contact_service::submit(&db, request.into_inner()).await {
        Ok(message) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "message": ContactMessageResponse::from(message)
        })),
        Err(e) => {
            log::warn!("❌ Contact submission rejected: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/contact/mine",
    tag = "Contact",
    responses((status = 200, description = "Caller's own messages with replies")),
    security(("bearer_auth" = []))
)]
pub async fn my_messages(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("📨 GET /contact/mine - {}", claims.email);

    match contact_service::list_mine(&db, &claims.email).await {
        Ok(messages) => {
            let messages: Vec<ContactMessageResponse> =
                messages.into_iter().map(ContactMessageResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "messages": messages
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to list messages for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/contact/{id}/read",
    tag = "Contact",
    params(("id" = String, Path, description = "Message id")),
    responses(
        (status = 200, description = "Reply marked read", body = ContactMessageResponse),
        (status = 404, description = "Not one of the caller's messages")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let message_id = path.into_inner();

    match contact_service::mark_client_read(&db, &claims.email, &message_id).await {
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
