use futures::TryStreamExt;
use mongodb::bson::doc;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{
    database::{self, MongoDB},
    models::{Payment, ProductStatus, SellerOrder, User},
    utils::{AppError, AppResult},
};

const RECENT_ORDERS: usize = 5;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SellerDashboard {
    pub success: bool,
    pub revenue: f64,
    /// Product count per status, every status present
    pub products: BTreeMap<String, u64>,
    pub total_products: u64,
    pub order_count: usize,
    pub units_sold: i64,
    pub recent_orders: Vec<SellerOrder>,
}

/// Fills in zero for statuses with no products.
pub fn with_all_statuses(counts: BTreeMap<String, u64>) -> BTreeMap<String, u64> {
    let mut all: BTreeMap<String, u64> = [ProductStatus::Pending, ProductStatus::Released, ProductStatus::Rejected]
        .iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();
    all.extend(counts);
    all
}

pub fn build_dashboard(
    revenue: f64,
    product_counts: BTreeMap<String, u64>,
    orders: Vec<SellerOrder>,
) -> SellerDashboard {
    let products = with_all_statuses(product_counts);
    let units_sold = orders.iter().map(|order| order.units_sold).sum();

    SellerDashboard {
        success: true,
        revenue,
        total_products: products.values().sum(),
        products,
        order_count: orders.len(),
        units_sold,
        recent_orders: orders.into_iter().take(RECENT_ORDERS).collect(),
    }
}

/// Payments containing at least one of the seller's lines, reduced to those
/// lines, newest first.
pub async fn list_orders(db: &MongoDB, seller_email: &str) -> AppResult<Vec<SellerOrder>> {
    let payments: Vec<Payment> = db
        .collection::<Payment>(database::PAYMENTS)
        .find(doc! { "items.seller_email": seller_email })
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(payments.iter().map(|payment| payment.for_seller(seller_email)).collect())
}

pub async fn dashboard(db: &MongoDB, seller_email: &str) -> AppResult<SellerDashboard> {
    let seller = db
        .collection::<User>(database::USERS)
        .find_one(doc! { "email": seller_email })
        .await?
        .ok_or_else(|| AppError::NotFound("Seller not found".to_string()))?;

    let product_counts = db
        .count_by(database::PRODUCTS, doc! { "seller_email": seller_email }, "status")
        .await?;
    let orders = list_orders(db, seller_email).await?;

    log::debug!("📊 Dashboard for {}: {} orders", seller_email, orders.len());

    Ok(build_dashboard(
        seller.details.revenue().unwrap_or(0.0),
        product_counts,
        orders,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(units_sold: i64, created_at: i64) -> SellerOrder {
        SellerOrder {
            payment_id: format!("p{}", created_at),
            customer_email: "c@example.com".into(),
            customer_name: "Cleo".into(),
            items: vec![],
            units_sold,
            subtotal: 0.0,
            currency: "usd".into(),
            shipping: None,
            created_at,
        }
    }

    #[test]
    fn test_statuses_zero_filled() {
        let mut counts = BTreeMap::new();
        counts.insert("released".to_string(), 4);
        let all = with_all_statuses(counts);
        assert_eq!(all["pending"], 0);
        assert_eq!(all["released"], 4);
        assert_eq!(all["rejected"], 0);
    }

    #[test]
    fn test_dashboard_summary() {
        let mut counts = BTreeMap::new();
        counts.insert("pending".to_string(), 1);
        counts.insert("released".to_string(), 2);

        let orders = (0..7).rev().map(|i| order(2, i)).collect();
        let dashboard = build_dashboard(120.5, counts, orders);

        assert_eq!(dashboard.revenue, 120.5);
        assert_eq!(dashboard.total_products, 3);
        assert_eq!(dashboard.order_count, 7);
        assert_eq!(dashboard.units_sold, 14);
        assert_eq!(dashboard.recent_orders.len(), 5);
        assert_eq!(dashboard.recent_orders[0].created_at, 6);
    }
}
