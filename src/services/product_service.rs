use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use serde::Deserialize;
use validator::Validate;

use crate::{
    database::{self, MongoDB},
    models::{
        CreateProductRequest, Product, ProductStatus, UpdateProductRequest, UpdateProductStatusRequest,
    },
    utils::{AppError, AppResult},
};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_FEATURED: i64 = 8;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub status: Option<String>,
}

pub fn parse_object_id(id: &str, label: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| AppError::BadRequest(format!("Invalid {} ID", label)))
}

pub fn page_size(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

/// Case-insensitive exact match, with the value regex-escaped.
fn exact_ci(value: &str) -> Document {
    doc! { "$regex": format!("^{}$", regex::escape(value.trim())), "$options": "i" }
}

/// Filter for the public catalog: released products, optional substring
/// search over name/description/category, optional category.
pub fn catalog_filter(query: &ProductQuery) -> Document {
    let mut filter = doc! { "status": ProductStatus::Released.as_str() };

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = regex::escape(search);
        filter.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": &pattern, "$options": "i" } },
                doc! { "description": { "$regex": &pattern, "$options": "i" } },
                doc! { "category": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    if let Some(category) = query.category.as_deref().filter(|c| !c.trim().is_empty()) {
        filter.insert("category", exact_ci(category));
    }

    filter
}

pub fn status_filter(base: Document, status: Option<&str>) -> AppResult<Document> {
    let mut filter = base;
    if let Some(raw) = status.filter(|s| !s.trim().is_empty()) {
        let status: ProductStatus = raw.parse().map_err(AppError::BadRequest)?;
        filter.insert("status", status.as_str());
    }
    Ok(filter)
}

/// Released products ordered by how many distinct customers bought them.
pub fn featured_pipeline(limit: i64) -> Vec<Document> {
    vec![
        doc! { "$match": { "status": ProductStatus::Released.as_str() } },
        doc! { "$addFields": { "buyer_count": { "$size": { "$ifNull": ["$buyers", []] } } } },
        doc! { "$sort": { "buyer_count": -1, "created_at": -1 } },
        doc! { "$limit": limit },
    ]
}

async fn find_many(db: &MongoDB, filter: Document, skip: u64, limit: Option<i64>) -> AppResult<Vec<Product>> {
    let collection = db.collection::<Product>(database::PRODUCTS);
    let mut find = collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(skip);
    if let Some(limit) = limit {
        find = find.limit(limit);
    }

    Ok(find.await?.try_collect().await?)
}

// ==================== PUBLIC CATALOG ====================

pub async fn list_released(db: &MongoDB, query: &ProductQuery) -> AppResult<(Vec<Product>, u64)> {
    let filter = catalog_filter(query);
    let limit = page_size(query.limit, DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let total = db
        .collection::<Product>(database::PRODUCTS)
        .count_documents(filter.clone())
        .await?;
    let products = find_many(db, filter, offset, Some(limit)).await?;

    Ok((products, total))
}

pub async fn featured(db: &MongoDB, limit: Option<i64>) -> AppResult<Vec<Product>> {
    let limit = page_size(limit, DEFAULT_FEATURED);

    let mut cursor = db
        .collection::<Product>(database::PRODUCTS)
        .aggregate(featured_pipeline(limit))
        .await?;

    let mut products = Vec::new();
    while let Some(document) = cursor.try_next().await? {
        products.push(bson::from_document::<Product>(document)?);
    }

    Ok(products)
}

pub async fn categories(db: &MongoDB) -> AppResult<Vec<String>> {
    let values = db
        .collection::<Product>(database::PRODUCTS)
        .distinct("category", doc! { "status": ProductStatus::Released.as_str() })
        .await?;

    let mut categories: Vec<String> = values
        .into_iter()
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect();
    categories.sort_by_key(|c| c.to_lowercase());
    categories.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

    Ok(categories)
}

pub async fn find_by_id(db: &MongoDB, product_id: &str) -> AppResult<Option<Product>> {
    let object_id = parse_object_id(product_id, "product")?;

    Ok(db
        .collection::<Product>(database::PRODUCTS)
        .find_one(doc! { "_id": object_id })
        .await?)
}

pub async fn get_released(db: &MongoDB, product_id: &str) -> AppResult<Product> {
    find_by_id(db, product_id)
        .await?
        .filter(Product::is_released)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

// ==================== SELLER ====================

pub async fn create_product(
    db: &MongoDB,
    seller_email: &str,
    seller_name: &str,
    request: CreateProductRequest,
) -> AppResult<Product> {
    request.validate()?;

    let now = chrono::Utc::now().timestamp();
    let product = Product {
        id: Some(ObjectId::new()),
        name: request.name.trim().to_string(),
        description: request.description,
        category: request.category.trim().to_string(),
        images: request.images,
        units: normalize_units(request.units),
        status: ProductStatus::Pending,
        rejection_reason: None,
        seller_email: seller_email.to_string(),
        seller_name: seller_name.to_string(),
        buyers: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    db.collection::<Product>(database::PRODUCTS)
        .insert_one(&product)
        .await?;

    log::info!("✅ Product created: {} by {} (pending review)", product.id_hex(), seller_email);

    Ok(product)
}

fn normalize_units(units: Vec<crate::models::ProductUnit>) -> Vec<crate::models::ProductUnit> {
    units
        .into_iter()
        .map(|mut unit| {
            unit.unit = unit.unit.trim().to_string();
            unit
        })
        .collect()
}

pub async fn list_seller_products(
    db: &MongoDB,
    seller_email: &str,
    status: Option<&str>,
) -> AppResult<Vec<Product>> {
    let filter = status_filter(doc! { "seller_email": seller_email }, status)?;
    find_many(db, filter, 0, None).await
}

pub async fn get_seller_product(db: &MongoDB, seller_email: &str, product_id: &str) -> AppResult<Product> {
    find_by_id(db, product_id)
        .await?
        .filter(|product| product.seller_email == seller_email)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Update document for a seller edit. Only supplied fields are written, so
/// stock moved by a concurrent checkout is never overwritten unless the
/// seller sends new units.
pub fn seller_update(request: UpdateProductRequest, now: i64) -> AppResult<Document> {
    let mut set = doc! {
        "status": ProductStatus::Pending.as_str(),
        "updated_at": now,
    };

    if let Some(name) = request.name {
        set.insert("name", name.trim());
    }
    if let Some(description) = request.description {
        set.insert("description", description);
    }
    if let Some(category) = request.category {
        set.insert("category", category.trim());
    }
    if let Some(images) = request.images {
        set.insert("images", images);
    }
    if let Some(units) = request.units {
        set.insert("units", bson::to_bson(&normalize_units(units))?);
    }

    Ok(doc! { "$set": set, "$unset": { "rejection_reason": "" } })
}

pub async fn update_seller_product(
    db: &MongoDB,
    seller_email: &str,
    product_id: &str,
    request: UpdateProductRequest,
) -> AppResult<Product> {
    if request.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }
    request.validate()?;

    let object_id = parse_object_id(product_id, "product")?;
    let update = seller_update(request, chrono::Utc::now().timestamp())?;

    let product = db
        .collection::<Product>(database::PRODUCTS)
        .find_one_and_update(doc! { "_id": object_id, "seller_email": seller_email }, update)
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    log::info!("✏️  Product {} updated by {} (back to pending)", product_id, seller_email);

    Ok(product)
}

pub async fn delete_seller_product(db: &MongoDB, seller_email: &str, product_id: &str) -> AppResult<()> {
    let object_id = parse_object_id(product_id, "product")?;

    let result = db
        .collection::<Product>(database::PRODUCTS)
        .delete_one(doc! { "_id": object_id, "seller_email": seller_email })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(())
}

// ==================== ADMIN ====================

pub async fn list_all(db: &MongoDB, status: Option<&str>) -> AppResult<Vec<Product>> {
    let filter = status_filter(doc! {}, status)?;
    find_many(db, filter, 0, None).await
}

pub async fn set_status(
    db: &MongoDB,
    product_id: &str,
    request: &UpdateProductStatusRequest,
) -> AppResult<Product> {
    if !request.status.is_moderation_target() {
        return Err(AppError::BadRequest(
            "Status must be released or rejected".to_string(),
        ));
    }

    let object_id = parse_object_id(product_id, "product")?;
    let now = chrono::Utc::now().timestamp();

    let update = match request.status {
        ProductStatus::Rejected => {
            let reason = request
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or("Rejected by moderator");
            doc! { "$set": { "status": request.status.as_str(), "rejection_reason": reason, "updated_at": now } }
        }
        _ => doc! {
            "$set": { "status": request.status.as_str(), "updated_at": now },
            "$unset": { "rejection_reason": "" }
        },
    };

    let product = db
        .collection::<Product>(database::PRODUCTS)
        .find_one_and_update(doc! { "_id": object_id }, update)
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    log::info!("🛡️  Product {} moderated: {}", product_id, request.status);

    Ok(product)
}

pub async fn delete_any(db: &MongoDB, product_id: &str) -> AppResult<()> {
    let object_id = parse_object_id(product_id, "product")?;

    let result = db
        .collection::<Product>(database::PRODUCTS)
        .delete_one(doc! { "_id": object_id })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_filter_only_released() {
        let filter = catalog_filter(&ProductQuery::default());
        assert_eq!(filter.get_str("status").unwrap(), "released");
        assert!(filter.get("$or").is_none());
        assert!(filter.get("category").is_none());
    }

    #[test]
    fn test_search_is_regex_escaped() {
        let filter = catalog_filter(&ProductQuery {
            search: Some("  c++ (new) ".into()),
            ..Default::default()
        });

        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);
        let name = clauses[0].as_document().unwrap().get_document("name").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), r"c\+\+ \(new\)");
        assert_eq!(name.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_blank_search_ignored() {
        let filter = catalog_filter(&ProductQuery {
            search: Some("   ".into()),
            category: Some("".into()),
            ..Default::default()
        });
        assert!(filter.get("$or").is_none());
        assert!(filter.get("category").is_none());
    }

    #[test]
    fn test_category_exact_case_insensitive() {
        let filter = catalog_filter(&ProductQuery {
            category: Some("Home.Garden".into()),
            ..Default::default()
        });
        let category = filter.get_document("category").unwrap();
        assert_eq!(category.get_str("$regex").unwrap(), r"^Home\.Garden$");
    }

    #[test]
    fn test_page_size_clamped() {
        assert_eq!(page_size(None, DEFAULT_PAGE_SIZE), 20);
        assert_eq!(page_size(Some(0), DEFAULT_PAGE_SIZE), 1);
        assert_eq!(page_size(Some(500), DEFAULT_PAGE_SIZE), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_status_filter() {
        let filter = status_filter(doc! { "seller_email": "s@x.io" }, Some("Rejected")).unwrap();
        assert_eq!(filter.get_str("status").unwrap(), "rejected");
        assert!(status_filter(doc! {}, Some("archived")).is_err());
        assert!(status_filter(doc! {}, None).unwrap().is_empty());
    }

    #[test]
    fn test_featured_pipeline_sorts_by_buyer_count() {
        let pipeline = featured_pipeline(8);
        assert_eq!(pipeline.len(), 4);
        let sort = pipeline[2].get_document("$sort").unwrap();
        let keys: Vec<&String> = sort.keys().collect();
        assert_eq!(keys, vec!["buyer_count", "created_at"]);
        assert_eq!(pipeline[3].get_i64("$limit").unwrap(), 8);
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("not-an-id", "product").is_err());
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "product").unwrap(), id);
    }

    #[test]
    fn test_seller_update_leaves_units_alone_when_not_sent() {
        let update = seller_update(
            UpdateProductRequest {
                name: Some("  Clover Honey ".into()),
                ..Default::default()
            },
            200,
        )
        .unwrap();

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("name").unwrap(), "Clover Honey");
        assert_eq!(set.get_str("status").unwrap(), "pending");
        assert_eq!(set.get_i64("updated_at").unwrap(), 200);
        assert!(set.get("units").is_none());
        assert!(set.get("description").is_none());
        assert!(update.get_document("$unset").unwrap().contains_key("rejection_reason"));
    }

    #[test]
    fn test_seller_update_writes_units_when_sent() {
        let update = seller_update(
            UpdateProductRequest {
                units: Some(vec![crate::models::ProductUnit { unit: " 1kg ".into(), price: 12.0, stock: 4 }]),
                ..Default::default()
            },
            200,
        )
        .unwrap();

        let units = update.get_document("$set").unwrap().get_array("units").unwrap();
        assert_eq!(units.len(), 1);
        let unit = units[0].as_document().unwrap();
        assert_eq!(unit.get_str("unit").unwrap(), "1kg");
        assert_eq!(unit.get_i64("stock").unwrap(), 4);
    }
}
