use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use crate::{
    database::{self, MongoDB},
    models::{cart::round_money, Cart, Payment, PaymentItem, PaymentStatus, Product, ShippingInfo},
    services::{
        cart_service,
        payment_processor::{to_minor_units, CreateIntentRequest, PaymentIntent, PaymentProcessor},
        product_service,
    },
    utils::{is_duplicate_key, AppError, AppResult},
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ConfirmCheckoutRequest {
    pub payment_intent_id: String,
    #[serde(default)]
    pub shipping: Option<ShippingInfo>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PaymentIntentResponse {
    pub success: bool,
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
    /// Major units (e.g. dollars)
    pub amount: f64,
    pub currency: String,
}

/// Outcome of a confirm call. `created` is false when the payment already
/// existed for this intent.
#[derive(Debug)]
pub struct ConfirmOutcome {
    pub payment: Payment,
    pub created: bool,
}

/// Prices one cart line against the current product.
pub fn price_line(product: &Product, unit: &str, quantity: i64) -> AppResult<PaymentItem> {
    let price = cart_service::price_for(product, unit, quantity)?;

    Ok(PaymentItem {
        product_id: product.id_hex(),
        product_name: product.name.clone(),
        unit: unit.to_string(),
        price,
        quantity,
        seller_email: product.seller_email.clone(),
        subtotal: round_money(price * quantity as f64),
    })
}

pub fn total_of(items: &[PaymentItem]) -> f64 {
    round_money(items.iter().map(|item| item.subtotal).sum())
}

/// Re-prices every cart line against the catalog as it is now.
pub async fn price_cart(db: &MongoDB, cart: &Cart) -> AppResult<(Vec<PaymentItem>, f64)> {
    if cart.items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    let mut items = Vec::with_capacity(cart.items.len());
    for line in &cart.items {
        let product = product_service::find_by_id(db, &line.product_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("{} is no longer available", line.product_name))
            })?;
        items.push(price_line(&product, &line.unit, line.quantity)?);
    }

    let total = total_of(&items);
    Ok((items, total))
}

/// Checks that a processor intent pays exactly for this customer's cart.
pub fn verify_intent(
    intent: &PaymentIntent,
    customer_email: &str,
    expected_amount: i64,
    currency: &str,
) -> AppResult<()> {
    if !intent.is_succeeded() {
        return Err(AppError::BadRequest(format!(
            "Payment not completed (status: {})",
            intent.status
        )));
    }

    match intent.customer_email() {
        Some(owner) if owner.eq_ignore_ascii_case(customer_email) => {}
        _ => {
            return Err(AppError::BadRequest(
                "Payment intent does not belong to this customer".to_string(),
            ))
        }
    }

    if intent.amount != expected_amount {
        return Err(AppError::BadRequest(format!(
            "Payment amount {} does not match cart total {}",
            intent.amount, expected_amount
        )));
    }

    if !intent.currency.eq_ignore_ascii_case(currency) {
        return Err(AppError::BadRequest(format!(
            "Payment currency {} does not match {}",
            intent.currency, currency
        )));
    }

    Ok(())
}

pub async fn create_payment_intent(
    db: &MongoDB,
    processor: &dyn PaymentProcessor,
    customer_email: &str,
    currency: &str,
) -> AppResult<PaymentIntentResponse> {
    let cart = cart_service::get_cart(db, customer_email).await?;
    let (items, total) = price_cart(db, &cart).await?;

    let intent = processor
        .create_intent(&CreateIntentRequest {
            amount: to_minor_units(total),
            currency: currency.to_string(),
            customer_email: customer_email.to_string(),
            description: format!("BizNest order ({} items)", items.len()),
        })
        .await?;

    log::info!("✅ Payment intent {} created for {} ({} {})", intent.id, customer_email, total, currency);

    Ok(PaymentIntentResponse {
        success: true,
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
        amount: total,
        currency: currency.to_string(),
    })
}

fn existing_for(payment: Payment, customer_email: &str) -> AppResult<ConfirmOutcome> {
    if payment.customer_email != customer_email {
        return Err(AppError::BadRequest("Payment intent already used".to_string()));
    }
    Ok(ConfirmOutcome { payment, created: false })
}

/// Result of recording a payment document.
#[derive(Debug, PartialEq)]
pub enum Inserted {
    New(Option<ObjectId>),
    /// Another confirm already recorded this `transaction_id`.
    Duplicate,
}

/// Storage side of a confirm: payment lookup, stock moves and settlement.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    async fn find_payment(&self, transaction_id: &str) -> AppResult<Option<Payment>>;

    /// The customer's cart re-priced against the catalog, with its total.
    async fn priced_cart(&self, customer_email: &str) -> AppResult<(Vec<PaymentItem>, f64)>;

    /// Takes `quantity` from the unit only if enough stock is left.
    async fn decrement_stock(&self, item: &PaymentItem) -> AppResult<bool>;

    /// Gives reserved quantities back. Failures are logged, not returned.
    async fn restore_stock(&self, items: &[PaymentItem]);

    async fn insert_payment(&self, payment: &Payment) -> AppResult<Inserted>;

    /// Credits sellers, records the buyer on each product and empties the cart.
    async fn settle(&self, payment: &Payment) -> AppResult<()>;
}

async fn credit_sellers(db: &MongoDB, payment: &Payment) -> AppResult<()> {
    for (seller_email, amount) in payment.revenue_by_seller() {
        db.collection::<Document>(database::USERS)
            .update_one(
                doc! { "email": &seller_email, "details.role": "seller" },
                doc! { "$inc": { "details.revenue": amount } },
            )
            .await?;
    }
    Ok(())
}

async fn record_buyer(db: &MongoDB, payment: &Payment) -> AppResult<()> {
    let product_ids: BTreeSet<&str> = payment.items.iter().map(|item| item.product_id.as_str()).collect();

    for product_id in product_ids {
        let oid = product_service::parse_object_id(product_id, "product")?;
        db.collection::<Product>(database::PRODUCTS)
            .update_one(
                doc! { "_id": oid },
                doc! { "$addToSet": { "buyers": &payment.customer_email } },
            )
            .await?;
    }
    Ok(())
}

#[async_trait]
impl CheckoutStore for MongoDB {
    async fn find_payment(&self, transaction_id: &str) -> AppResult<Option<Payment>> {
        Ok(self
            .collection::<Payment>(database::PAYMENTS)
            .find_one(doc! { "transaction_id": transaction_id })
            .await?)
    }

    async fn priced_cart(&self, customer_email: &str) -> AppResult<(Vec<PaymentItem>, f64)> {
        let cart = cart_service::get_cart(self, customer_email).await?;
        price_cart(self, &cart).await
    }

    async fn decrement_stock(&self, item: &PaymentItem) -> AppResult<bool> {
        let product_id = product_service::parse_object_id(&item.product_id, "product")?;

        let result = self
            .collection::<Product>(database::PRODUCTS)
            .update_one(
                doc! {
                    "_id": product_id,
                    "units": { "$elemMatch": { "unit": &item.unit, "stock": { "$gte": item.quantity } } },
                },
                doc! { "$inc": { "units.$.stock": -item.quantity } },
            )
            .await?;

        Ok(result.modified_count == 1)
    }

    async fn restore_stock(&self, items: &[PaymentItem]) {
        for item in items {
            let Ok(product_id) = ObjectId::parse_str(&item.product_id) else {
                continue;
            };

            let restored = self
                .collection::<Product>(database::PRODUCTS)
                .update_one(
                    doc! { "_id": product_id, "units.unit": &item.unit },
                    doc! { "$inc": { "units.$.stock": item.quantity } },
                )
                .await;

            if let Err(e) = restored {
                log::error!(
                    "❌ Failed to restore {} x {} ({}): {}",
                    item.quantity,
                    item.product_id,
                    item.unit,
                    e
                );
            }
        }
    }

    async fn insert_payment(&self, payment: &Payment) -> AppResult<Inserted> {
        match self.collection::<Payment>(database::PAYMENTS).insert_one(payment).await {
            Ok(result) => Ok(Inserted::New(result.inserted_id.as_object_id())),
            Err(e) if is_duplicate_key(&e) => Ok(Inserted::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn settle(&self, payment: &Payment) -> AppResult<()> {
        credit_sellers(self, payment).await?;
        record_buyer(self, payment).await?;
        cart_service::clear_cart(self, &payment.customer_email).await
    }
}

/// Decrements every line or none of them.
async fn reserve_stock(store: &dyn CheckoutStore, items: &[PaymentItem]) -> AppResult<()> {
    for (index, item) in items.iter().enumerate() {
        let reserved = match store.decrement_stock(item).await {
            Ok(reserved) => reserved,
            Err(e) => {
                store.restore_stock(&items[..index]).await;
                return Err(e);
            }
        };

        if !reserved {
            store.restore_stock(&items[..index]).await;
            log::warn!("⚠️  Stock ran out for {} ({}) during checkout", item.product_name, item.unit);
            return Err(AppError::Conflict(format!(
                "Insufficient stock for {} ({})",
                item.product_name, item.unit
            )));
        }
    }
    Ok(())
}

/// Turns a succeeded payment intent into a recorded order.
///
/// Stock is reserved line by line with a conditional decrement; a line that
/// cannot be reserved releases the earlier ones and fails with 409. The
/// payment document is inserted before sellers are credited so that a
/// concurrent confirm of the same intent loses on the unique
/// `transaction_id` index and gives its stock back.
pub async fn confirm(
    store: &dyn CheckoutStore,
    processor: &dyn PaymentProcessor,
    customer_email: &str,
    customer_name: &str,
    currency: &str,
    request: ConfirmCheckoutRequest,
) -> AppResult<ConfirmOutcome> {
    if let Some(shipping) = &request.shipping {
        shipping.validate()?;
    }

    if let Some(existing) = store.find_payment(&request.payment_intent_id).await? {
        log::info!("♻️  Payment {} already recorded", request.payment_intent_id);
        return existing_for(existing, customer_email);
    }

    let intent = processor.retrieve_intent(&request.payment_intent_id).await?;
    let (items, total) = store.priced_cart(customer_email).await?;
    verify_intent(&intent, customer_email, to_minor_units(total), currency)?;

    reserve_stock(store, &items).await?;

    let mut payment = Payment {
        id: None,
        customer_email: customer_email.to_string(),
        customer_name: customer_name.to_string(),
        transaction_id: intent.id.clone(),
        items,
        amount: total,
        currency: currency.to_lowercase(),
        status: PaymentStatus::Completed,
        shipping: request.shipping,
        created_at: chrono::Utc::now().timestamp(),
    };

    match store.insert_payment(&payment).await {
        Ok(Inserted::New(id)) => payment.id = id,
        Ok(Inserted::Duplicate) => {
            store.restore_stock(&payment.items).await;
            let existing = store
                .find_payment(&payment.transaction_id)
                .await?
                .ok_or_else(|| AppError::Internal("Payment vanished after duplicate insert".to_string()))?;
            return existing_for(existing, customer_email);
        }
        Err(e) => {
            store.restore_stock(&payment.items).await;
            return Err(e);
        }
    }

    store.settle(&payment).await?;

    log::info!(
        "✅ Order {} confirmed for {}: {} {}",
        payment.transaction_id,
        customer_email,
        payment.amount,
        payment.currency
    );

    Ok(ConfirmOutcome { payment, created: true })
}

pub async fn list_orders(db: &MongoDB, customer_email: &str) -> AppResult<Vec<Payment>> {
    let cursor = db
        .collection::<Payment>(database::PAYMENTS)
        .find(doc! { "customer_email": customer_email })
        .sort(doc! { "created_at": -1 })
        .await?;

    Ok(cursor.try_collect().await?)
}

pub async fn get_order(db: &MongoDB, customer_email: &str, order_id: &str) -> AppResult<Payment> {
    let oid = product_service::parse_object_id(order_id, "order")?;

    db.collection::<Payment>(database::PAYMENTS)
        .find_one(doc! { "_id": oid, "customer_email": customer_email })
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}
