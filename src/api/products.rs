use actix_web::{web, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::database::MongoDB;
use crate::models::ProductResponse;
use crate::services::product_service::{self, ProductQuery};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeaturedQuery {
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Released products, newest first")
    )
)]
pub async fn list_products(db: web::Data<MongoDB>, query: web::Query<ProductQuery>) -> HttpResponse {
    log::info!(
        "🛍️  GET /products - search: {:?}, category: {:?}",
        query.search,
        query.category
    );

    match product_service::list_released(&db, &query).await {
        Ok((products, total)) => {
            let products: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
            log::info!("✅ {} of {} products returned", products.len(), total);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "products": products,
                "total": total
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to list products: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/products/featured",
    tag = "Products",
    params(FeaturedQuery),
    responses(
        (status = 200, description = "Best-selling released products")
    )
)]
pub async fn featured_products(db: web::Data<MongoDB>, query: web::Query<FeaturedQuery>) -> HttpResponse {
    log::info!("⭐ GET /products/featured");

    match product_service::featured(&db, query.limit).await {
        Ok(products) => {
            let products: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "products": products
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to load featured products: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/products/categories",
    tag = "Products",
    responses(
        (status = 200, description = "Distinct categories of released products")
    )
)]
pub async fn list_categories(db: web::Data<MongoDB>) -> HttpResponse {
    match product_service::categories(&db).await {
        Ok(categories) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "categories": categories
        })),
        Err(e) => {
            log::error!("❌ Failed to load categories: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "Not found or not released")
    )
)]
pub async fn get_product(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let product_id = path.into_inner();
    log::info!("🔍 GET /products/{}", product_id);

    match product_service::get_released(&db, &product_id).await {
        Ok(product) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "product": ProductResponse::from(product)
        })),
        Err(e) => {
            log::warn!("❌ Product {} unavailable: {}", product_id, e);
            e.error_response()
        }
    }
}
