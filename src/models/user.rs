use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Invalid role: {}. Supported: customer, seller, admin", other)),
        }
    }
}

/// Role-specific sub-document stored under `details`, tagged by `role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleDetails {
    Customer {
        #[serde(default)]
        phone: Option<String>,
        #[serde(default)]
        address: Option<String>,
    },
    Seller {
        store_name: String,
        #[serde(default)]
        phone: Option<String>,
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        revenue: f64,
    },
    Admin {
        #[serde(default)]
        permissions: Vec<String>,
    },
}

impl RoleDetails {
    pub fn role(&self) -> Role {
        match self {
            RoleDetails::Customer { .. } => Role::Customer,
            RoleDetails::Seller { .. } => Role::Seller,
            RoleDetails::Admin { .. } => Role::Admin,
        }
    }

    pub fn revenue(&self) -> Option<f64> {
        match self {
            RoleDetails::Seller { revenue, .. } => Some(*revenue),
            _ => None,
        }
    }

    /// Applies the contact fields a user may edit on their own profile.
    /// Role and revenue stay untouched.
    pub fn apply_profile_update(&mut self, update: &ProfileDetailsUpdate) {
        match self {
            RoleDetails::Customer { phone, address } => {
                if let Some(p) = &update.phone {
                    *phone = Some(p.clone());
                }
                if let Some(a) = &update.address {
                    *address = Some(a.clone());
                }
            }
            RoleDetails::Seller { store_name, phone, address, .. } => {
                let new_name = update.store_name.as_deref().map(str::trim);
                if let Some(s) = new_name.filter(|s| !s.is_empty()) {
                    *store_name = s.to_string();
                }
                if let Some(p) = &update.phone {
                    *phone = Some(p.clone());
                }
                if let Some(a) = &update.address {
                    *address = Some(a.clone());
                }
            }
            RoleDetails::Admin { .. } => {}
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub email: String,
    pub password: String,
    pub name: String,
    pub details: RoleDetails,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
    pub last_login: Option<BsonDateTime>,
}

fn default_is_active() -> bool {
    true
}

impl User {
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn role(&self) -> Role {
        self.details.role()
    }
}

fn store_name_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("cannot be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Editable contact fields of a role-detail payload.
#[derive(Debug, Default, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct ProfileDetailsUpdate {
    #[validate(custom = "store_name_not_blank")]
    pub store_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// User as exposed over the API (no password hash).
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub details: RoleDetails,
    pub is_active: bool,
    pub created_at: Option<i64>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.id_hex(),
            role: user.role(),
            email: user.email,
            name: user.name,
            details: user.details,
            is_active: user.is_active,
            created_at: user.created_at.map(|d| d.timestamp_millis() / 1000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn test_role_parse() {
        assert_eq!("Seller".parse::<Role>().unwrap(), Role::Seller);
        assert_eq!(" customer ".parse::<Role>().unwrap(), Role::Customer);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_details_tagged_by_role() {
        let details = RoleDetails::Seller {
            store_name: "Green Farm".into(),
            phone: None,
            address: None,
            revenue: 12.5,
        };
        let doc = bson::to_document(&details).unwrap();
        assert_eq!(doc.get_str("role").unwrap(), "seller");
        assert_eq!(doc.get_f64("revenue").unwrap(), 12.5);

        let back: RoleDetails = bson::from_document(doc).unwrap();
        assert_eq!(back.role(), Role::Seller);
    }

    #[test]
    fn test_seller_revenue_defaults_to_zero() {
        let json = serde_json::json!({ "role": "seller", "store_name": "Nest" });
        let details: RoleDetails = serde_json::from_value(json).unwrap();
        assert_eq!(details.revenue(), Some(0.0));
    }

    #[test]
    fn test_blank_store_name_rejected_and_never_applied() {
        let update = ProfileDetailsUpdate {
            store_name: Some("   ".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let mut details = RoleDetails::Seller {
            store_name: "Green Farm".into(),
            phone: None,
            address: None,
            revenue: 0.0,
        };
        details.apply_profile_update(&update);
        assert!(matches!(details, RoleDetails::Seller { ref store_name, .. } if store_name == "Green Farm"));
    }

    #[test]
    fn test_profile_update_keeps_revenue() {
        let mut details = RoleDetails::Seller {
            store_name: "Old".into(),
            phone: None,
            address: None,
            revenue: 99.0,
        };
        details.apply_profile_update(&ProfileDetailsUpdate {
            store_name: Some("New".into()),
            phone: Some("555-0101".into()),
            address: None,
        });

        match details {
            RoleDetails::Seller { store_name, phone, revenue, .. } => {
                assert_eq!(store_name, "New");
                assert_eq!(phone.as_deref(), Some("555-0101"));
                assert_eq!(revenue, 99.0);
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_user_info_hides_password() {
        let user = User {
            _id: Some(ObjectId::new()),
            email: "ana@example.com".into(),
            password: "$2b$12$hash".into(),
            name: "Ana".into(),
            details: RoleDetails::Customer { phone: None, address: None },
            is_active: true,
            created_at: Some(BsonDateTime::from_millis(1_700_000_000_000)),
            updated_at: None,
            last_login: None,
        };
        let json = serde_json::to_value(UserInfo::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "customer");
        assert_eq!(json["created_at"], 1_700_000_000);
    }
}
