use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Pending,
    Released,
    Rejected,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Released => "released",
            ProductStatus::Rejected => "rejected",
        }
    }

    /// Admin moderation only moves products to a decided state.
    pub fn is_moderation_target(&self) -> bool {
        matches!(self, ProductStatus::Released | ProductStatus::Rejected)
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ProductStatus::Pending),
            "released" => Ok(ProductStatus::Released),
            "rejected" => Ok(ProductStatus::Rejected),
            other => Err(format!("Invalid status: {}. Supported: pending, released, rejected", other)),
        }
    }
}

/// A priced, stocked sub-SKU of a product ("500g", "1kg").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProductUnit {
    pub unit: String,
    pub price: f64,
    pub stock: i64,
}

/// Product document (`products` collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub category: String,

    #[serde(default)]
    pub images: Vec<String>,

    pub units: Vec<ProductUnit>,

    pub status: ProductStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    pub seller_email: String,

    #[serde(default)]
    pub seller_name: String,

    /// Distinct customers that completed a purchase; drives "featured".
    #[serde(default)]
    pub buyers: Vec<String>,

    /// Unix timestamp
    pub created_at: i64,

    pub updated_at: i64,
}

impl Product {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn find_unit(&self, unit: &str) -> Option<&ProductUnit> {
        self.units.iter().find(|u| u.unit == unit)
    }

    pub fn total_stock(&self) -> i64 {
        self.units.iter().map(|u| u.stock).sum()
    }

    pub fn is_released(&self) -> bool {
        self.status == ProductStatus::Released
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("blank", "cannot be empty".to_string()));
    }
    Ok(())
}

/// Validates a unit list: non-empty, unique non-blank names, positive price,
/// non-negative stock. Names travel as a single path segment in cart URLs, so
/// they may not contain '/'.
pub fn validate_units(units: &[ProductUnit]) -> Result<(), ValidationError> {
    if units.is_empty() {
        return Err(invalid("units", "must contain at least one unit".to_string()));
    }

    let mut seen = HashSet::new();
    for unit in units {
        let name = unit.unit.trim();
        if name.is_empty() {
            return Err(invalid("units", "cannot have an empty unit name".to_string()));
        }
        if name.contains('/') {
            return Err(invalid("units", format!("name {} cannot contain '/'", name)));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(invalid("units", format!("has duplicate unit {}", name)));
        }
        if !unit.price.is_finite() || unit.price <= 0.0 {
            return Err(invalid("units", format!("price for {} must be greater than zero", name)));
        }
        if unit.stock < 0 {
            return Err(invalid("units", format!("stock for {} cannot be negative", name)));
        }
    }

    Ok(())
}

fn validate_unit_list(units: &Vec<ProductUnit>) -> Result<(), ValidationError> {
    validate_units(units)
}

/// Body for creating a product
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateProductRequest {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "not_blank")]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[validate(custom = "validate_unit_list")]
    pub units: Vec<ProductUnit>,
}

/// Partial update from the owning seller
#[derive(Debug, Default, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateProductRequest {
    #[validate(custom = "not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "not_blank")]
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    #[validate(custom = "validate_unit_list")]
    pub units: Option<Vec<ProductUnit>>,
}

impl UpdateProductRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.images.is_none()
            && self.units.is_none()
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateProductStatusRequest {
    pub status: ProductStatus,
    pub reason: Option<String>,
}

/// Product as returned by the API
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub images: Vec<String>,
    pub units: Vec<ProductUnit>,
    pub status: ProductStatus,
    pub rejection_reason: Option<String>,
    pub seller_email: String,
    pub seller_name: String,
    pub buyer_count: usize,
    pub in_stock: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.id_hex(),
            in_stock: product.total_stock() > 0,
            buyer_count: product.buyers.len(),
            name: product.name,
            description: product.description,
            category: product.category,
            images: product.images,
            units: product.units,
            status: product.status,
            rejection_reason: product.rejection_reason,
            seller_email: product.seller_email,
            seller_name: product.seller_name,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, price: f64, stock: i64) -> ProductUnit {
        ProductUnit { unit: name.into(), price, stock }
    }

    fn sample_product(status: ProductStatus) -> Product {
        Product {
            id: Some(ObjectId::new()),
            name: "Wildflower Honey".into(),
            description: "Raw honey".into(),
            category: "Food".into(),
            images: vec![],
            units: vec![unit("500g", 8.5, 10), unit("1kg", 15.0, 0)],
            status,
            rejection_reason: Some("blurry photos".into()),
            seller_email: "farm@example.com".into(),
            seller_name: "Farm".into(),
            buyers: vec!["a@example.com".into()],
            created_at: 100,
            updated_at: 100,
        }
    }

    #[test]
    fn test_validate_units() {
        assert!(validate_units(&[unit("500g", 1.0, 0)]).is_ok());
        assert!(validate_units(&[]).is_err());
        assert!(validate_units(&[unit(" ", 1.0, 1)]).is_err());
        assert!(validate_units(&[unit("1kg", 0.0, 1)]).is_err());
        assert!(validate_units(&[unit("1kg", f64::NAN, 1)]).is_err());
        assert!(validate_units(&[unit("1kg", 2.0, -1)]).is_err());

        let err = validate_units(&[unit("1kg", 2.0, 1), unit("1KG", 3.0, 1)]).unwrap_err();
        assert!(err.message.unwrap().contains("duplicate"));
    }

    #[test]
    fn test_status_parse_and_moderation_targets() {
        assert_eq!("Released".parse::<ProductStatus>().unwrap(), ProductStatus::Released);
        assert!("archived".parse::<ProductStatus>().is_err());
        assert!(!ProductStatus::Pending.is_moderation_target());
        assert!(ProductStatus::Rejected.is_moderation_target());
    }

    #[test]
    fn test_unit_names_cannot_hold_a_slash() {
        assert!(validate_units(&[unit("1/2 kg", 4.0, 3)]).is_err());
        assert!(validate_units(&[unit("half kg", 4.0, 3)]).is_ok());
    }

    #[test]
    fn test_create_request_errors_name_the_field() {
        let request = CreateProductRequest {
            name: "  ".into(),
            description: String::new(),
            category: "Food".into(),
            images: vec![],
            units: vec![unit("500g", 8.5, 10)],
        };
        let err = crate::utils::AppError::from(request.validate().unwrap_err());
        assert_eq!(err.client_message(), "name cannot be empty");
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(UpdateProductRequest::default().is_empty());
        let blank_name = UpdateProductRequest {
            name: Some(" ".into()),
            ..Default::default()
        };
        assert!(blank_name.validate().is_err());
        let bad_units = UpdateProductRequest {
            units: Some(vec![]),
            ..Default::default()
        };
        assert!(bad_units.validate().is_err());
    }

    #[test]
    fn test_response_projection() {
        let product = sample_product(ProductStatus::Released);
        let id = product.id_hex();
        let response = ProductResponse::from(product);
        assert_eq!(response.id, id);
        assert_eq!(response.buyer_count, 1);
        assert!(response.in_stock);
    }
}
