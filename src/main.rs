mod api;
mod config;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use middleware::{AuthMiddleware, RoleGuard};
use models::Role;
use services::{PaymentProcessor, StripeClient};
use utils::AppError;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::AppConfig::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("🚀 Starting BizNest API...");

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url).await.map_err(|e| {
        log::error!("❌ Failed to connect to MongoDB: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    log::info!("✅ MongoDB connected successfully");

    // 👑 Bootstrap admin account
    match &config.admin {
        Some(seed) => seeds::admin_seed::seed_admin(&db, seed).await,
        None => log::info!("👑 ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin seed"),
    }

    let processor: Arc<dyn PaymentProcessor> =
        Arc::new(StripeClient::new(&config.stripe_secret_key, &config.stripe_api_base));
    let processor_data: web::Data<dyn PaymentProcessor> = web::Data::from(processor);
    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config.clone());

    let bind_address = config.bind_address();
    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_address);

    let cors_origins = config.cors_origins.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        // Malformed bodies, queries and paths get the same JSON envelope as other errors
        let json_config = web::JsonConfig::default()
            .limit(256 * 1024)
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into());
        let query_config =
            web::QueryConfig::default().error_handler(|err, _| AppError::BadRequest(err.to_string()).into());
        let path_config =
            web::PathConfig::default().error_handler(|err, _| AppError::BadRequest(err.to_string()).into());

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(processor_data.clone())
            .app_data(json_config)
            .app_data(query_config)
            .app_data(path_config)
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(middleware::RequestMetrics)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Auth endpoints
            .service(
                web::scope("/api/v1/auth")
                    .route("/login", web::post().to(api::auth::login))
                    .route("/register", web::post().to(api::auth::register))
                    .route("/refresh", web::post().to(api::auth::refresh_token))
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware)
                            .route("/me", web::get().to(api::auth::get_me))
                            .route("/profile", web::put().to(api::auth::update_profile)),
                    ),
            )
            // ==================== CATALOG (public) ====================
            .service(
                web::scope("/api/v1/products")
                    .route("", web::get().to(api::products::list_products))
                    .route("/featured", web::get().to(api::products::featured_products))
                    .route("/categories", web::get().to(api::products::list_categories))
                    .route("/{id}", web::get().to(api::products::get_product)),
            )
            // ==================== CUSTOMER ====================
            .service(
                web::scope("/api/v1/cart")
                    .wrap(RoleGuard::only(Role::Customer))
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(api::cart::get_cart))
                    .route("", web::delete().to(api::cart::clear_cart))
                    .route("/items", web::post().to(api::cart::add_item))
                    .route("/items", web::put().to(api::cart::update_item))
                    .route("/items/{product_id}/{unit}", web::delete().to(api::cart::remove_item)),
            )
            .service(
                web::scope("/api/v1/checkout")
                    .wrap(RoleGuard::only(Role::Customer))
                    .wrap(AuthMiddleware)
                    .route("/payment-intent", web::post().to(api::checkout::create_payment_intent))
                    .route("/confirm", web::post().to(api::checkout::confirm)),
            )
            .service(
                web::scope("/api/v1/orders")
                    .wrap(RoleGuard::only(Role::Customer))
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(api::orders::list_orders))
                    .route("/{id}", web::get().to(api::orders::get_order)),
            )
            // ==================== SELLER ====================
            .service(
                web::scope("/api/v1/seller")
                    .wrap(RoleGuard::only(Role::Seller))
                    .wrap(AuthMiddleware)
                    .route("/products", web::post().to(api::seller::create_product))
                    .route("/products", web::get().to(api::seller::list_products))
                    .route("/products/{id}", web::get().to(api::seller::get_product))
                    .route("/products/{id}", web::put().to(api::seller::update_product))
                    .route("/products/{id}", web::delete().to(api::seller::delete_product))
                    .route("/orders", web::get().to(api::seller::list_orders))
                    .route("/dashboard", web::get().to(api::seller::dashboard)),
            )
            // ==================== ADMIN ====================
            .service(
                web::scope("/api/v1/admin")
                    .wrap(RoleGuard::only(Role::Admin))
                    .wrap(AuthMiddleware)
                    .route("/products", web::get().to(api::admin::list_products))
                    .route("/products/{id}/status", web::patch().to(api::admin::set_product_status))
                    .route("/products/{id}", web::delete().to(api::admin::delete_product))
                    .route("/users", web::get().to(api::admin::list_users))
                    .route("/users/{id}/status", web::patch().to(api::admin::set_user_status))
                    .route("/users/{id}", web::delete().to(api::admin::delete_user))
                    .route("/payments", web::get().to(api::admin::list_payments))
                    .route("/stats", web::get().to(api::admin::stats))
                    .route("/messages", web::get().to(api::admin::list_messages))
                    .route("/messages/{id}/read", web::patch().to(api::admin::mark_message_read))
                    .route("/messages/{id}/reply", web::post().to(api::admin::reply_to_message))
                    .route("/messages/{id}", web::delete().to(api::admin::delete_message)),
            )
            // ==================== CONTACT ====================
            .service(
                web::scope("/api/v1/contact")
                    .route("", web::post().to(api::contact::submit))
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware)
                            .route("/mine", web::get().to(api::contact::my_messages))
                            .route("/{id}/read", web::patch().to(api::contact::mark_read)),
                    ),
            )
    })
    .bind(bind_address)?
    .run()
    .await
}
