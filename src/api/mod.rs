pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod seller;
pub mod swagger;
