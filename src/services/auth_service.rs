use crate::{
    database::{self, MongoDB},
    models::{ProfileDetailsUpdate, Role, RoleDetails, User, UserInfo},
    utils::{is_duplicate_key, AppError, AppResult},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user id (ObjectId hex)
    pub email: String,
    pub name: String,
    pub role: Role,
    pub token_type: String,    // "access" | "refresh"
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

// Request/Response structures
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub details: ProfileDetailsUpdate,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[serde(default)]
    pub details: ProfileDetailsUpdate,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: String,
    pub user: UserInfo,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "biznest-api".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "biznest-client".to_string())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn build_claims(user: &User, token_type: &str, lifetime: Duration) -> Claims {
    let now = Utc::now();

    Claims {
        sub: user.id_hex(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role(),
        token_type: token_type.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + lifetime).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    }
}

fn sign(claims: &Claims) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Generate access token (24h)
pub fn generate_jwt(user: &User) -> AppResult<String> {
    sign(&build_claims(user, ACCESS_TOKEN, Duration::hours(24)))
}

// Generate refresh token (30 days)
pub fn generate_refresh_token(user: &User) -> AppResult<String> {
    sign(&build_claims(user, REFRESH_TOKEN, Duration::days(30)))
}

// Verify JWT signature, expiry, audience and issuer
pub fn verify_token(token: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);
    validation.set_issuer(&[get_jwt_issuer()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

pub fn verify_access_token(token: &str) -> Result<Claims, String> {
    let claims = verify_token(token)?;
    if claims.token_type != ACCESS_TOKEN {
        return Err("Invalid token: not an access token".to_string());
    }
    Ok(claims)
}

fn auth_response(user: User) -> AppResult<AuthResponse> {
    let token = generate_jwt(&user)?;
    let refresh_token = generate_refresh_token(&user)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token,
        user: UserInfo::from(user),
    })
}

/// Builds the role-detail payload for a self-registration.
/// Admin accounts are only created by the startup seed.
pub fn details_for_registration(role: Role, details: &ProfileDetailsUpdate) -> AppResult<RoleDetails> {
    match role {
        Role::Customer => Ok(RoleDetails::Customer {
            phone: details.phone.clone(),
            address: details.address.clone(),
        }),
        Role::Seller => {
            let store_name = details
                .store_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::BadRequest("Store name is required for sellers".to_string()))?;

            Ok(RoleDetails::Seller {
                store_name: store_name.to_string(),
                phone: details.phone.clone(),
                address: details.address.clone(),
                revenue: 0.0,
            })
        }
        Role::Admin => Err(AppError::BadRequest(
            "Admin accounts cannot be self-registered".to_string(),
        )),
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> AppResult<AuthResponse> {
    request.validate()?;

    let collection = db.collection::<User>(database::USERS);
    let email = normalize_email(&request.email);

    let user = collection
        .find_one(doc! { "email": &email })
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Forbidden("Account is inactive".to_string()));
    }

    collection
        .update_one(
            doc! { "email": &email },
            doc! { "$set": { "last_login": BsonDateTime::now() } },
        )
        .await?;

    auth_response(user)
}

// User registration
pub async fn register(db: &MongoDB, request: &RegisterRequest) -> AppResult<AuthResponse> {
    request.validate()?;

    let collection = db.collection::<User>(database::USERS);
    let email = normalize_email(&request.email);
    let details = details_for_registration(request.role, &request.details)?;

    if collection.find_one(doc! { "email": &email }).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let now = BsonDateTime::now();
    let new_user = User {
        _id: Some(ObjectId::new()),
        email: email.clone(),
        password: hash_password(&request.password)?,
        name: request.name.trim().to_string(),
        details,
        is_active: true,
        created_at: Some(now),
        updated_at: Some(now),
        last_login: Some(now),
    };

    // Two concurrent registrations can both pass the lookup; the unique index decides.
    if let Err(e) = collection.insert_one(&new_user).await {
        if is_duplicate_key(&e) {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }
        return Err(e.into());
    }

    log::info!("✅ User registered successfully: {} (role: {})", email, new_user.role());

    auth_response(new_user)
}

// Refresh token
pub async fn refresh_token(db: &MongoDB, request: &RefreshTokenRequest) -> AppResult<AuthResponse> {
    let claims = verify_token(&request.refresh_token).map_err(AppError::Unauthorized)?;

    if claims.token_type != REFRESH_TOKEN {
        return Err(AppError::Unauthorized("Not a refresh token".to_string()));
    }

    let user = find_user_by_id(db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Forbidden("Account is inactive".to_string()));
    }

    auth_response(user)
}

pub async fn find_user_by_id(db: &MongoDB, user_id: &str) -> AppResult<Option<User>> {
    let object_id = ObjectId::parse_str(user_id)
        .map_err(|_| AppError::BadRequest("Invalid user ID".to_string()))?;

    Ok(db
        .collection::<User>(database::USERS)
        .find_one(doc! { "_id": object_id })
        .await?)
}

// Get current user
pub async fn get_current_user(db: &MongoDB, user_id: &str) -> AppResult<UserInfo> {
    find_user_by_id(db, user_id)
        .await?
        .map(UserInfo::from)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Updates name and contact fields. Role and seller revenue are not editable here.
pub async fn update_profile(
    db: &MongoDB,
    user_id: &str,
    request: &UpdateProfileRequest,
) -> AppResult<UserInfo> {
    request.validate()?;
    request.details.validate()?;

    let mut user = find_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(name) = &request.name {
        user.name = name.trim().to_string();
    }
    user.details.apply_profile_update(&request.details);

    let mut set = doc! {
        "name": &user.name,
        "updated_at": BsonDateTime::now(),
    };
    // Revenue is owned by checkout's $inc; only write the editable detail fields.
    match &user.details {
        RoleDetails::Customer { phone, address } => {
            set.insert("details.phone", phone.clone());
            set.insert("details.address", address.clone());
        }
        RoleDetails::Seller { store_name, phone, address, .. } => {
            set.insert("details.store_name", store_name.clone());
            set.insert("details.phone", phone.clone());
            set.insert("details.address", address.clone());
        }
        RoleDetails::Admin { .. } => {}
    }

    db.collection::<User>(database::USERS)
        .update_one(doc! { "_id": user._id }, doc! { "$set": set })
        .await?;

    Ok(UserInfo::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role_details: RoleDetails) -> User {
        User {
            _id: Some(ObjectId::new()),
            email: "sam@example.com".into(),
            password: String::new(),
            name: "Sam".into(),
            details: role_details,
            is_active: true,
            created_at: None,
            updated_at: None,
            last_login: None,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let seller = user(RoleDetails::Seller {
            store_name: "Sam's".into(),
            phone: None,
            address: None,
            revenue: 0.0,
        });
        let token = generate_jwt(&seller).unwrap();
        let claims = verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, seller.id_hex());
        assert_eq!(claims.role, Role::Seller);
        assert_eq!(claims.email, "sam@example.com");
        assert_eq!(claims.token_type, ACCESS_TOKEN);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let customer = user(RoleDetails::Customer { phone: None, address: None });
        let refresh = generate_refresh_token(&customer).unwrap();

        assert!(verify_token(&refresh).is_ok());
        assert!(verify_access_token(&refresh).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let customer = user(RoleDetails::Customer { phone: None, address: None });
        let token = generate_jwt(&customer).unwrap();
        let tampered = format!("{}x", token);
        assert!(verify_token(&tampered).is_err());
        assert!(verify_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let customer = user(RoleDetails::Customer { phone: None, address: None });
        let claims = build_claims(&customer, ACCESS_TOKEN, Duration::hours(1));
        let forged = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"someone-elses-secret"),
        )
        .unwrap();
        assert!(verify_token(&forged).is_err());
    }

    #[test]
    fn test_registration_details() {
        let seller = details_for_registration(
            Role::Seller,
            &ProfileDetailsUpdate { store_name: Some(" Nest Goods ".into()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(seller.role(), Role::Seller);
        assert_eq!(seller.revenue(), Some(0.0));

        let missing_store = details_for_registration(Role::Seller, &ProfileDetailsUpdate::default());
        assert!(matches!(missing_store, Err(AppError::BadRequest(_))));

        let admin = details_for_registration(Role::Admin, &ProfileDetailsUpdate::default());
        assert!(matches!(admin, Err(AppError::BadRequest(_))));

        let customer = details_for_registration(Role::Customer, &ProfileDetailsUpdate::default()).unwrap();
        assert_eq!(customer.role(), Role::Customer);
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            email: "bad".into(),
            password: "123".into(),
            name: "A".into(),
            role: Role::Customer,
            details: ProfileDetailsUpdate::default(),
        };
        let err = AppError::from(request.validate().unwrap_err());
        let message = err.client_message();
        assert!(message.contains("email"));
        assert!(message.contains("password"));
        assert!(message.contains("name"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Mixed@Case.COM "), "mixed@case.com");
    }

    #[test]
    fn test_password_hash_verifies() {
        let hashed = hash_password("hunter22").unwrap();
        assert!(verify("hunter22", &hashed).unwrap());
        assert!(!verify("hunter23", &hashed).unwrap());
    }
}
