use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::cart::round_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PaymentItem {
    pub product_id: String,
    pub product_name: String,
    pub unit: String,
    pub price: f64,
    pub quantity: i64,
    pub seller_email: String,
    pub subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct ShippingInfo {
    #[validate(length(min = 2, message = "is required"))]
    pub full_name: String,
    #[validate(length(min = 3, message = "is required"))]
    pub address: String,
    #[validate(length(min = 2, message = "is required"))]
    pub city: String,
    #[validate(length(min = 2, message = "is required"))]
    pub postal_code: String,
    #[validate(length(min = 2, message = "is required"))]
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Denormalized order snapshot plus the processor transaction id
/// (`payments` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub customer_email: String,
    #[serde(default)]
    pub customer_name: String,
    pub transaction_id: String,
    pub items: Vec<PaymentItem>,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub shipping: Option<ShippingInfo>,
    pub created_at: i64,
}

impl Payment {
    /// Sum of line subtotals per seller.
    pub fn revenue_by_seller(&self) -> BTreeMap<String, f64> {
        revenue_by_seller(&self.items)
    }

    /// The order as one seller sees it: only their lines.
    pub fn for_seller(&self, seller_email: &str) -> SellerOrder {
        let items: Vec<PaymentItem> = self
            .items
            .iter()
            .filter(|item| item.seller_email == seller_email)
            .cloned()
            .collect();
        let subtotal = round_money(items.iter().map(|item| item.subtotal).sum());

        SellerOrder {
            payment_id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            customer_email: self.customer_email.clone(),
            customer_name: self.customer_name.clone(),
            units_sold: items.iter().map(|item| item.quantity).sum(),
            items,
            subtotal,
            currency: self.currency.clone(),
            shipping: self.shipping.clone(),
            created_at: self.created_at,
        }
    }
}

pub fn revenue_by_seller(items: &[PaymentItem]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for item in items {
        *totals.entry(item.seller_email.clone()).or_insert(0.0) += item.subtotal;
    }
    for value in totals.values_mut() {
        *value = round_money(*value);
    }
    totals
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PaymentResponse {
    pub id: String,
    pub customer_email: String,
    pub customer_name: String,
    pub transaction_id: String,
    pub items: Vec<PaymentItem>,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub shipping: Option<ShippingInfo>,
    pub created_at: i64,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        PaymentResponse {
            id: payment.id.map(|id| id.to_hex()).unwrap_or_default(),
            customer_email: payment.customer_email,
            customer_name: payment.customer_name,
            transaction_id: payment.transaction_id,
            items: payment.items,
            amount: payment.amount,
            currency: payment.currency,
            status: payment.status,
            shipping: payment.shipping,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SellerOrder {
    pub payment_id: String,
    pub customer_email: String,
    pub customer_name: String,
    pub items: Vec<PaymentItem>,
    pub units_sold: i64,
    pub subtotal: f64,
    pub currency: String,
    pub shipping: Option<ShippingInfo>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(seller: &str, price: f64, quantity: i64) -> PaymentItem {
        PaymentItem {
            product_id: ObjectId::new().to_hex(),
            product_name: "Item".into(),
            unit: "1kg".into(),
            price,
            quantity,
            seller_email: seller.into(),
            subtotal: round_money(price * quantity as f64),
        }
    }

    fn payment(items: Vec<PaymentItem>) -> Payment {
        Payment {
            id: Some(ObjectId::new()),
            customer_email: "c@example.com".into(),
            customer_name: "Cleo".into(),
            transaction_id: "pi_123".into(),
            amount: round_money(items.iter().map(|i| i.subtotal).sum()),
            items,
            currency: "usd".into(),
            status: PaymentStatus::Completed,
            shipping: None,
            created_at: 1,
        }
    }

    #[test]
    fn test_revenue_grouped_per_seller() {
        let p = payment(vec![
            item("a@example.com", 10.0, 2),
            item("b@example.com", 3.33, 3),
            item("a@example.com", 0.5, 1),
        ]);
        let totals = p.revenue_by_seller();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["a@example.com"], 20.5);
        assert_eq!(totals["b@example.com"], 9.99);
    }

    #[test]
    fn test_seller_projection_keeps_only_own_lines() {
        let p = payment(vec![item("a@example.com", 10.0, 2), item("b@example.com", 4.0, 1)]);
        let order = p.for_seller("b@example.com");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.subtotal, 4.0);
        assert_eq!(order.units_sold, 1);
        assert_eq!(order.payment_id, p.id.unwrap().to_hex());
    }

    #[test]
    fn test_shipping_validation() {
        let shipping = ShippingInfo {
            full_name: "Cleo Park".into(),
            address: "1 Main St".into(),
            city: "Lagos".into(),
            postal_code: "100001".into(),
            country: "NG".into(),
            phone: None,
        };
        assert!(shipping.validate().is_ok());

        let missing_city = ShippingInfo { city: "".into(), ..shipping };
        assert!(missing_city.validate().is_err());
    }
}
