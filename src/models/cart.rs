use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::product::Product;

/// One cart line, keyed by `(product_id, unit)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CartItem {
    pub product_id: String,
    pub product_name: String,
    pub unit: String,
    pub price: f64,
    pub quantity: i64,
    pub seller_email: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    pub fn from_product(product: &Product, unit: &str, price: f64, quantity: i64) -> Self {
        CartItem {
            product_id: product.id_hex(),
            product_name: product.name.clone(),
            unit: unit.to_string(),
            price,
            quantity,
            seller_email: product.seller_email.clone(),
            image: product.images.first().cloned(),
        }
    }

    pub fn subtotal(&self) -> f64 {
        round_money(self.price * self.quantity as f64)
    }

    fn matches(&self, product_id: &str, unit: &str) -> bool {
        self.product_id == product_id && self.unit == unit
    }
}

/// Cart document, one per customer (`carts` collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub customer_email: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub updated_at: i64,
}

impl Cart {
    pub fn empty(customer_email: &str) -> Self {
        Cart {
            id: None,
            customer_email: customer_email.to_string(),
            items: Vec::new(),
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn find_item(&self, product_id: &str, unit: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.matches(product_id, unit))
    }

    pub fn quantity_of(&self, product_id: &str, unit: &str) -> i64 {
        self.find_item(product_id, unit).map(|item| item.quantity).unwrap_or(0)
    }

    /// Adds a line, merging quantities with an existing line for the same
    /// product and unit. The price snapshot is refreshed on merge.
    pub fn add_item(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|existing| existing.matches(&item.product_id, &item.unit))
        {
            Some(existing) => {
                existing.quantity += item.quantity;
                existing.price = item.price;
                existing.product_name = item.product_name;
                existing.image = item.image;
            }
            None => self.items.push(item),
        }
    }

    /// Sets the quantity of an existing line; zero removes it.
    /// Returns false when the line does not exist.
    pub fn set_quantity(&mut self, product_id: &str, unit: &str, quantity: i64, price: f64) -> bool {
        let Some(index) = self.items.iter().position(|item| item.matches(product_id, unit)) else {
            return false;
        };

        if quantity <= 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = quantity;
            self.items[index].price = price;
        }
        true
    }

    pub fn remove_item(&mut self, product_id: &str, unit: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !item.matches(product_id, unit));
        self.items.len() != before
    }

    pub fn total(&self) -> f64 {
        round_money(self.items.iter().map(CartItem::subtotal).sum())
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Rounds to cents.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct AddCartItemRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "is required"))]
    pub unit: String,
    #[validate(range(min = 1, max = 1000, message = "must be between 1 and 1000"))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateCartItemRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "is required"))]
    pub unit: String,
    #[validate(range(min = 0, max = 1000, message = "must be between 0 and 1000"))]
    pub quantity: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CartResponse {
    pub success: bool,
    pub items: Vec<CartItem>,
    pub total: f64,
    pub item_count: i64,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        CartResponse {
            success: true,
            total: cart.total(),
            item_count: cart.item_count(),
            items: cart.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, unit: &str, price: f64, quantity: i64) -> CartItem {
        CartItem {
            product_id: product_id.into(),
            product_name: format!("Product {}", product_id),
            unit: unit.into(),
            price,
            quantity,
            seller_email: "seller@example.com".into(),
            image: None,
        }
    }

    #[test]
    fn test_add_merges_same_product_and_unit() {
        let mut cart = Cart::empty("c@example.com");
        cart.add_item(line("p1", "500g", 8.5, 1));
        cart.add_item(line("p1", "500g", 9.0, 2));
        cart.add_item(line("p1", "1kg", 15.0, 1));

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.quantity_of("p1", "500g"), 3);
        assert_eq!(cart.find_item("p1", "500g").unwrap().price, 9.0);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::empty("c@example.com");
        cart.add_item(line("p1", "500g", 8.5, 2));

        assert!(cart.set_quantity("p1", "500g", 5, 8.0));
        assert_eq!(cart.quantity_of("p1", "500g"), 5);
        assert_eq!(cart.find_item("p1", "500g").unwrap().price, 8.0);

        assert!(cart.set_quantity("p1", "500g", 0, 8.0));
        assert!(cart.items.is_empty());

        assert!(!cart.set_quantity("p2", "500g", 1, 1.0));
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::empty("c@example.com");
        cart.add_item(line("p1", "500g", 1.0, 1));
        assert!(!cart.remove_item("p1", "1kg"));
        assert!(cart.remove_item("p1", "500g"));
        assert!(cart.items.is_empty());
    }

    #[test]
    fn test_total_rounds_to_cents() {
        let mut cart = Cart::empty("c@example.com");
        cart.add_item(line("p1", "a", 0.1, 3));
        cart.add_item(line("p2", "b", 19.99, 2));
        assert_eq!(cart.total(), 40.28);

        let response = CartResponse::from(cart);
        assert_eq!(response.item_count, 5);
        assert_eq!(response.total, 40.28);
    }

    #[test]
    fn test_add_request_validation() {
        let ok = AddCartItemRequest { product_id: "p".into(), unit: "1kg".into(), quantity: 2 };
        assert!(ok.validate().is_ok());

        let zero = AddCartItemRequest { product_id: "p".into(), unit: "1kg".into(), quantity: 0 };
        assert!(zero.validate().is_err());

        let update = UpdateCartItemRequest { product_id: "p".into(), unit: "1kg".into(), quantity: 0 };
        assert!(update.validate().is_ok());
    }
}
