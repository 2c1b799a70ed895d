use mongodb::bson::{self, doc};

use crate::{
    database::{self, MongoDB},
    models::{AddCartItemRequest, Cart, CartItem, Product, UpdateCartItemRequest},
    services::product_service,
    utils::{AppError, AppResult},
};
use validator::Validate;

/// Checks that `quantity` of `unit` can be bought from `product` and returns
/// the current unit price.
pub fn price_for(product: &Product, unit: &str, quantity: i64) -> AppResult<f64> {
    if !product.is_released() {
        return Err(AppError::BadRequest(format!(
            "{} is not available for purchase",
            product.name
        )));
    }

    let product_unit = product.find_unit(unit).ok_or_else(|| {
        AppError::BadRequest(format!("{} has no unit '{}'", product.name, unit))
    })?;

    if quantity > product_unit.stock {
        return Err(AppError::BadRequest(format!(
            "Only {} left in stock for {} ({})",
            product_unit.stock, product.name, unit
        )));
    }

    Ok(product_unit.price)
}

pub async fn get_cart(db: &MongoDB, customer_email: &str) -> AppResult<Cart> {
    let cart = db
        .collection::<Cart>(database::CARTS)
        .find_one(doc! { "customer_email": customer_email })
        .await?;

    Ok(cart.unwrap_or_else(|| Cart::empty(customer_email)))
}

async fn save_cart(db: &MongoDB, cart: &mut Cart) -> AppResult<()> {
    cart.updated_at = chrono::Utc::now().timestamp();

    db.collection::<Cart>(database::CARTS)
        .update_one(
            doc! { "customer_email": &cart.customer_email },
            doc! { "$set": {
                "items": bson::to_bson(&cart.items)?,
                "updated_at": cart.updated_at,
            } },
        )
        .upsert(true)
        .await?;

    Ok(())
}

pub async fn add_item(db: &MongoDB, customer_email: &str, request: &AddCartItemRequest) -> AppResult<Cart> {
    request.validate()?;

    let product = product_service::find_by_id(db, &request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let mut cart = get_cart(db, customer_email).await?;
    let merged_quantity = cart.quantity_of(&request.product_id, &request.unit) + request.quantity;
    let price = price_for(&product, &request.unit, merged_quantity)?;

    cart.add_item(CartItem::from_product(&product, &request.unit, price, request.quantity));
    save_cart(db, &mut cart).await?;

    log::info!(
        "🛒 {} added {} x {} ({}) to cart",
        customer_email,
        request.quantity,
        product.name,
        request.unit
    );

    Ok(cart)
}

pub async fn update_item(
    db: &MongoDB,
    customer_email: &str,
    request: &UpdateCartItemRequest,
) -> AppResult<Cart> {
    request.validate()?;

    let mut cart = get_cart(db, customer_email).await?;
    if cart.find_item(&request.product_id, &request.unit).is_none() {
        return Err(AppError::NotFound("Item not found in cart".to_string()));
    }

    let price = if request.quantity == 0 {
        0.0
    } else {
        let product = product_service::find_by_id(db, &request.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        price_for(&product, &request.unit, request.quantity)?
    };

    cart.set_quantity(&request.product_id, &request.unit, request.quantity, price);
    save_cart(db, &mut cart).await?;

    Ok(cart)
}

pub async fn remove_item(db: &MongoDB, customer_email: &str, product_id: &str, unit: &str) -> AppResult<Cart> {
    let mut cart = get_cart(db, customer_email).await?;

    if !cart.remove_item(product_id, unit) {
        return Err(AppError::NotFound("Item not found in cart".to_string()));
    }

    save_cart(db, &mut cart).await?;
    Ok(cart)
}

pub async fn clear_cart(db: &MongoDB, customer_email: &str) -> AppResult<()> {
    db.collection::<Cart>(database::CARTS)
        .update_one(
            doc! { "customer_email": customer_email },
            doc! { "$set": { "items": [], "updated_at": chrono::Utc::now().timestamp() } },
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductStatus, ProductUnit};
    use mongodb::bson::oid::ObjectId;

    fn product(status: ProductStatus) -> Product {
        Product {
            id: Some(ObjectId::new()),
            name: "Shea Butter".into(),
            description: String::new(),
            category: "Beauty".into(),
            images: vec!["https://cdn.example.com/shea.jpg".into()],
            units: vec![ProductUnit { unit: "250ml".into(), price: 6.75, stock: 3 }],
            status,
            rejection_reason: None,
            seller_email: "s@example.com".into(),
            seller_name: "S".into(),
            buyers: vec![],
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_price_for_released_unit() {
        assert_eq!(price_for(&product(ProductStatus::Released), "250ml", 3).unwrap(), 6.75);
    }

    #[test]
    fn test_price_for_rejects_unreleased() {
        let err = price_for(&product(ProductStatus::Pending), "250ml", 1).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_price_for_rejects_unknown_unit() {
        let err = price_for(&product(ProductStatus::Released), "1l", 1).unwrap_err();
        assert!(err.client_message().contains("no unit"));
    }

    #[test]
    fn test_price_for_checks_merged_quantity_against_stock() {
        let p = product(ProductStatus::Released);
        let mut cart = Cart::empty("c@example.com");
        cart.add_item(CartItem::from_product(&p, "250ml", 6.75, 2));

        let merged = cart.quantity_of(&p.id_hex(), "250ml") + 2;
        let err = price_for(&p, "250ml", merged).unwrap_err();
        assert!(err.client_message().contains("Only 3 left"));
    }

    #[test]
    fn test_cart_item_snapshot() {
        let p = product(ProductStatus::Released);
        let item = CartItem::from_product(&p, "250ml", 6.75, 2);
        assert_eq!(item.product_id, p.id_hex());
        assert_eq!(item.seller_email, "s@example.com");
        assert_eq!(item.image.as_deref(), Some("https://cdn.example.com/shea.jpg"));
        assert_eq!(item.subtotal(), 13.5);
    }
}
