use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    database::{self, MongoDB},
    models::{Cart, ContactMessage, Payment, Product, Role, User, UserInfo},
    services::{product_service::parse_object_id, seller_service::with_all_statuses},
    utils::{AppError, AppResult},
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleQuery {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AdminStats {
    pub success: bool,
    pub users: BTreeMap<String, u64>,
    pub total_users: u64,
    pub products: BTreeMap<String, u64>,
    pub payment_count: u64,
    pub gross_revenue: f64,
    pub unread_messages: u64,
}

/// Admins may not lock themselves out or delete their own account.
pub fn ensure_not_self(admin_id: &str, target_id: &str, action: &str) -> AppResult<()> {
    if admin_id == target_id {
        return Err(AppError::BadRequest(format!("You cannot {} your own account", action)));
    }
    Ok(())
}

pub fn role_filter(role: Option<&str>) -> AppResult<Document> {
    match role.map(str::trim).filter(|r| !r.is_empty()) {
        Some(role) => {
            let role: Role = role.parse().map_err(AppError::BadRequest)?;
            Ok(doc! { "details.role": role.as_str() })
        }
        None => Ok(doc! {}),
    }
}

fn with_all_roles(counts: BTreeMap<String, u64>) -> BTreeMap<String, u64> {
    let mut all: BTreeMap<String, u64> = [Role::Customer, Role::Seller, Role::Admin]
        .iter()
        .map(|role| (role.as_str().to_string(), 0))
        .collect();
    all.extend(counts);
    all
}

// ==================== USERS ====================

pub async fn list_users(db: &MongoDB, role: Option<&str>) -> AppResult<Vec<UserInfo>> {
    let users: Vec<User> = db
        .collection::<User>(database::USERS)
        .find(role_filter(role)?)
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(users.into_iter().map(UserInfo::from).collect())
}

pub async fn set_user_active(
    db: &MongoDB,
    admin_id: &str,
    user_id: &str,
    is_active: bool,
) -> AppResult<UserInfo> {
    if !is_active {
        ensure_not_self(admin_id, user_id, "deactivate")?;
    }

    let object_id = parse_object_id(user_id, "user")?;

    let user = db
        .collection::<User>(database::USERS)
        .find_one_and_update(
            doc! { "_id": object_id },
            doc! { "$set": { "is_active": is_active, "updated_at": mongodb::bson::DateTime::now() } },
        )
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    log::info!(
        "🛡️  User {} {}",
        user.email,
        if is_active { "activated" } else { "deactivated" }
    );

    Ok(UserInfo::from(user))
}

/// Deletes a user together with what only they own: a customer's cart or a
/// seller's products.
pub async fn delete_user(db: &MongoDB, admin_id: &str, user_id: &str) -> AppResult<()> {
    ensure_not_self(admin_id, user_id, "delete")?;

    let object_id = parse_object_id(user_id, "user")?;

    let user = db
        .collection::<User>(database::USERS)
        .find_one_and_delete(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    match user.role() {
        Role::Customer => {
            db.collection::<Cart>(database::CARTS)
                .delete_one(doc! { "customer_email": &user.email })
                .await?;
        }
        Role::Seller => {
            let removed = db
                .collection::<Product>(database::PRODUCTS)
                .delete_many(doc! { "seller_email": &user.email })
                .await?;
            log::info!("🗑️  Removed {} products of {}", removed.deleted_count, user.email);
        }
        Role::Admin => {}
    }

    log::info!("🗑️  User {} deleted", user.email);

    Ok(())
}

// ==================== PAYMENTS ====================

pub async fn list_payments(db: &MongoDB) -> AppResult<Vec<Payment>> {
    Ok(db
        .collection::<Payment>(database::PAYMENTS)
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?)
}

async fn gross_revenue(db: &MongoDB) -> AppResult<f64> {
    let pipeline = vec![doc! { "$group": { "_id": Bson::Null, "total": { "$sum": "$amount" } } }];

    let mut cursor = db
        .collection::<Document>(database::PAYMENTS)
        .aggregate(pipeline)
        .await?;

    let total = match cursor.try_next().await? {
        Some(group) => match group.get("total") {
            Some(Bson::Double(v)) => *v,
            Some(Bson::Int32(v)) => *v as f64,
            Some(Bson::Int64(v)) => *v as f64,
            _ => 0.0,
        },
        None => 0.0,
    };

    Ok(crate::models::cart::round_money(total))
}

pub async fn stats(db: &MongoDB) -> AppResult<AdminStats> {
    let users = with_all_roles(db.count_by(database::USERS, doc! {}, "details.role").await?);
    let products = with_all_statuses(db.count_by(database::PRODUCTS, doc! {}, "status").await?);

    let payment_count = db
        .collection::<Payment>(database::PAYMENTS)
        .count_documents(doc! {})
        .await?;
    let unread_messages = db
        .collection::<ContactMessage>(database::CONTACT_MESSAGES)
        .count_documents(doc! { "admin_read": false })
        .await?;

    Ok(AdminStats {
        success: true,
        total_users: users.values().sum(),
        users,
        products,
        payment_count,
        gross_revenue: gross_revenue(db).await?,
        unread_messages,
    })
}
