use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::models::{CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::services::{
    auth_service::Claims,
    product_service::{self, StatusQuery},
    seller_service::{self, SellerDashboard},
};

#[utoipa::path(
    post,
    path = "/api/v1/seller/products",
    tag = "Seller",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created, pending review", body = ProductResponse),
        (status = 400, description = "Invalid product")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_product(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateProductRequest>,
) -> HttpResponse {
    log::info!("📝 POST /seller/products - {} by {}", request.name, claims.email);

    match product_service::create_product(&db, &claims.email, &claims.name, request.into_inner()).await {
        Ok(product) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "product": ProductResponse::from(product)
        })),
        Err(e) => {
            log::warn!("❌ Product creation failed for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/products",
    tag = "Seller",
    params(StatusQuery),
    responses(
        (status = 200, description = "Own products in any status")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_products(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    query: web::Query<StatusQuery>,
) -> HttpResponse {
    log::info!("📋 GET /seller/products - {} (status: {:?})", claims.email, query.status);

    match product_service::list_seller_products(&db, &claims.email, query.status.as_deref()).await {
        Ok(products) => {
            let products: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "products": products
            }))
        }
        Err(e) => {
            log::warn!("❌ Failed to list products for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/products/{id}",
    tag = "Seller",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Own product", body = ProductResponse),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_product(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let product_id = path.into_inner();

    match product_service::get_seller_product(&db, &claims.email, &product_id).await {
        Ok(product) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "product": ProductResponse::from(product)
        })),
        Err(e) => {
            log::warn!("❌ Product {} unavailable for {}: {}", product_id, claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/seller/products/{id}",
    tag = "Seller",
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated, back to pending review", body = ProductResponse),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_product(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateProductRequest>,
) -> HttpResponse {
    let product_id = path.into_inner();
    log::info!("✏️  PUT /seller/products/{} - {}", product_id, claims.email);

    match product_service::update_seller_product(&db, &claims.email, &product_id, request.into_inner()).await {
        Ok(product) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "product": ProductResponse::from(product)
        })),
        Err(e) => {
            log::warn!("❌ Product update failed: {} - {}", product_id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/seller/products/{id}",
    tag = "Seller",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let product_id = path.into_inner();
    log::info!("🗑️  DELETE /seller/products/{} - {}", product_id, claims.email);

    match product_service::delete_seller_product(&db, &claims.email, &product_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Product deleted"
        })),
        Err(e) => {
            log::warn!("❌ Product deletion failed: {} - {}", product_id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/orders",
    tag = "Seller",
    responses(
        (status = 200, description = "Orders containing the seller's items, reduced to those items")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_orders(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("📦 GET /seller/orders - {}", claims.email);

    match seller_service::list_orders(&db, &claims.email).await {
        Ok(orders) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "orders": orders
        })),
        Err(e) => {
            log::error!("❌ Failed to list seller orders for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/dashboard",
    tag = "Seller",
    responses(
        (status = 200, description = "Revenue, product and order summary", body = SellerDashboard)
    ),
    security(("bearer_auth" = []))
)]
pub async fn dashboard(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("📊 GET /seller/dashboard - {}", claims.email);

    match seller_service::dashboard(&db, &claims.email).await {
        Ok(dashboard) => HttpResponse::Ok().json(dashboard),
        Err(e) => {
            log::error!("❌ Dashboard failed for {}: {}", claims.email, e);
            e.error_response()
        }
    }
}
