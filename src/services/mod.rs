pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod checkout_service;
pub mod contact_service;
pub mod payment_processor;
pub mod product_service;
pub mod seller_service;

pub use payment_processor::{PaymentProcessor, StripeClient};
