use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BizNest Marketplace API",
        version = "1.0.0",
        description = "Multi-role marketplace API. \n\n**Authentication:** Most endpoints require a JWT Bearer access token.\n\n**Roles:**\n- Customers browse, fill a cart and check out\n- Sellers list products and follow their orders\n- Admins moderate products, users and support messages",
        contact(
            name = "BizNest Team",
            email = "support@biznest.example.com"
        )
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::register,
        crate::api::auth::refresh_token,
        crate::api::auth::get_me,
        crate::api::auth::update_profile,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Catalog
        crate::api::products::list_products,
        crate::api::products::featured_products,
        crate::api::products::list_categories,
        crate::api::products::get_product,

        // Cart
        crate::api::cart::get_cart,
        crate::api::cart::add_item,
        crate::api::cart::update_item,
        crate::api::cart::remove_item,
        crate::api::cart::clear_cart,

        // Checkout & Orders
        crate::api::checkout::create_payment_intent,
        crate::api::checkout::confirm,
        crate::api::orders::list_orders,
        crate::api::orders::get_order,

        // Seller
        crate::api::seller::create_product,
        crate::api::seller::list_products,
        crate::api::seller::get_product,
        crate::api::seller::update_product,
        crate::api::seller::delete_product,
        crate::api::seller::list_orders,
        crate::api::seller::dashboard,

        // Admin
        crate::api::admin::list_products,
        crate::api::admin::set_product_status,
        crate::api::admin::delete_product,
        crate::api::admin::list_users,
        crate::api::admin::set_user_status,
        crate::api::admin::delete_user,
        crate::api::admin::list_payments,
        crate::api::admin::stats,
        crate::api::admin::list_messages,
        crate::api::admin::mark_message_read,
        crate::api::admin::reply_to_message,
        crate::api::admin::delete_message,

        // Contact
        crate::api::contact::submit,
        crate::api::contact::my_messages,
        crate::api::contact::mark_read,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::RefreshTokenRequest,
            crate::services::auth_service::UpdateProfileRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::UserInfo,
            crate::models::Role,
            crate::models::RoleDetails,
            crate::models::ProfileDetailsUpdate,

            // Health
            crate::api::health::HealthResponse,

            // Catalog
            crate::models::ProductResponse,
            crate::models::ProductUnit,
            crate::models::ProductStatus,
            crate::models::CreateProductRequest,
            crate::models::UpdateProductRequest,
            crate::models::UpdateProductStatusRequest,

            // Cart & Checkout
            crate::models::CartItem,
            crate::models::CartResponse,
            crate::models::AddCartItemRequest,
            crate::models::UpdateCartItemRequest,
            crate::services::checkout_service::ConfirmCheckoutRequest,
            crate::services::checkout_service::PaymentIntentResponse,
            crate::models::PaymentResponse,
            crate::models::PaymentItem,
            crate::models::PaymentStatus,
            crate::models::ShippingInfo,

            // Seller & Admin
            crate::models::SellerOrder,
            crate::services::seller_service::SellerDashboard,
            crate::services::admin_service::UpdateUserStatusRequest,
            crate::services::admin_service::AdminStats,

            // Contact
            crate::models::ContactRequest,
            crate::models::ReplyRequest,
            crate::models::ContactMessageResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login, token refresh and profile."),
        (name = "Health", description = "Health check and Prometheus metrics."),
        (name = "Products", description = "Public catalog of released products."),
        (name = "Cart", description = "Customer shopping cart."),
        (name = "Checkout", description = "Payment intents and order confirmation."),
        (name = "Orders", description = "Customer order history."),
        (name = "Seller", description = "Seller product management, orders and dashboard."),
        (name = "Admin", description = "Moderation, user management, payments, stats and support inbox."),
        (name = "Contact", description = "Public contact form and the sender's replies."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/checkout/confirm"));
        assert!(doc.paths.paths.contains_key("/api/v1/admin/messages/{id}/reply"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_metrics_documented_as_plain_text() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        let content = &json["paths"]["/metrics"]["get"]["responses"]["200"]["content"];
        assert!(content.get("text/plain").is_some());
        assert!(json["components"]["schemas"].get("MetricsResponse").is_none());
    }
}
