use crate::config::AdminSeed;
use crate::database::{self, MongoDB};
use crate::models::{RoleDetails, User};
use crate::services::auth_service::hash_password;
use mongodb::bson::{doc, DateTime as BsonDateTime};

/// Full permission set of the bootstrap admin.
const ADMIN_PERMISSIONS: [&str; 4] = ["products", "users", "payments", "messages"];

fn admin_user(seed: &AdminSeed, password_hash: String) -> User {
    let now = BsonDateTime::now();

    User {
        _id: None,
        email: seed.email.clone(),
        password: password_hash,
        name: seed.name.clone(),
        details: RoleDetails::Admin {
            permissions: ADMIN_PERMISSIONS.iter().map(|p| p.to_string()).collect(),
        },
        is_active: true,
        created_at: Some(now),
        updated_at: Some(now),
        last_login: None,
    }
}

/// Creates the bootstrap admin if no account uses its email yet.
/// Failures are logged; startup continues.
pub async fn seed_admin(db: &MongoDB, seed: &AdminSeed) {
    let collection = db.collection::<User>(database::USERS);

    let existing = match collection.count_documents(doc! { "email": &seed.email }).await {
        Ok(count) => count,
        Err(e) => {
            log::error!("   ❌ Failed to check for admin account: {}", e);
            return;
        }
    };

    if existing > 0 {
        log::info!("👑 Admin account {} already exists, skipping seed", seed.email);
        return;
    }

    let password_hash = match hash_password(&seed.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("   ❌ Failed to hash admin password: {}", e);
            return;
        }
    };

    match collection.insert_one(admin_user(seed, password_hash)).await {
        Ok(_) => log::info!("   ✅ Admin account {} created", seed.email),
        Err(e) => log::error!("   ❌ Failed to seed admin account: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_admin_user_shape() {
        let seed = AdminSeed {
            email: "admin@biznest.example.com".into(),
            password: "secret".into(),
            name: "Root".into(),
        };
        let user = admin_user(&seed, "hash".into());

        assert_eq!(user.role(), Role::Admin);
        assert_eq!(user.password, "hash");
        assert!(user.is_active);
        match user.details {
            RoleDetails::Admin { permissions } => assert_eq!(permissions.len(), 4),
            other => panic!("unexpected details: {:?}", other),
        }
    }
}
