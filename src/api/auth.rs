use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::services::auth_service::{
    self, AuthResponse, Claims, LoginRequest, RefreshTokenRequest, RegisterRequest, UpdateProfileRequest,
};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated")
    )
)]
pub async fn login(db: web::Data<MongoDB>, request: web::Json<LoginRequest>) -> HttpResponse {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid request or user already exists")
    )
)]
pub async fn register(db: web::Data<MongoDB>, request: web::Json<RegisterRequest>) -> HttpResponse {
    log::info!("📝 POST /auth/register - email: {}, role: {}", request.email, request.role);

    match auth_service::register(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", request.email);
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", request.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh_token(db: web::Data<MongoDB>, request: web::Json<RefreshTokenRequest>) -> HttpResponse {
    log::info!("🔄 POST /auth/refresh");

    match auth_service::refresh_token(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Token refreshed for {}", response.user.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Token refresh failed: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("👤 GET /auth/me - {}", claims.email);

    match auth_service::get_current_user(&db, &claims.sub).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) => {
            log::warn!("❌ Failed to load user {}: {}", claims.sub, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/profile",
    tag = "Auth",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 400, description = "Invalid profile data")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    log::info!("✏️  PUT /auth/profile - {}", claims.email);

    match auth_service::update_profile(&db, &claims.sub, &request).await {
        Ok(user) => {
            log::info!("✅ Profile updated: {}", claims.email);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "user": user
            }))
        }
        Err(e) => {
            log::warn!("❌ Profile update failed: {} - {}", claims.email, e);
            e.error_response()
        }
    }
}
