use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection, Database};
use std::collections::BTreeMap;
use std::error::Error;

pub const USERS: &str = "users";
pub const PRODUCTS: &str = "products";
pub const CARTS: &str = "carts";
pub const PAYMENTS: &str = "payments";
pub const CONTACT_MESSAGES: &str = "contact_messages";

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));
        client_options.app_name = Some("biznest-api".to_string());

        let client = Client::with_options(client_options)?;

        let db = client.database(&database_name_from_uri(uri));

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the marketplace relies on. Creating an index that
    /// already exists is a no-op on the server, so any error is a real
    /// failure. A unique index that cannot be built aborts startup.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        for (collection_name, keys, is_unique) in index_specs() {
            let collection = self.database().collection::<Document>(collection_name);
            let label = format!("{}({})", collection_name, keys);

            let model = if is_unique {
                IndexModel::builder().keys(keys).options(unique()).build()
            } else {
                IndexModel::builder().keys(keys).build()
            };

            match collection.create_index(model).await {
                Ok(_) => log::info!("   ✅ Index ready: {}", label),
                Err(e) if is_unique => {
                    log::error!("   ❌ Unique index failed: {} ({})", label, e);
                    return Err(e.into());
                }
                Err(e) => log::warn!("   ⚠️  Index failed: {} ({})", label, e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Check if the connection is healthy
    pub async fn ping(&self) -> bool {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .is_ok()
    }

    /// Number of documents per distinct value of `field` among those
    /// matching `filter`.
    pub async fn count_by(
        &self,
        collection: &str,
        filter: Document,
        field: &str,
    ) -> Result<BTreeMap<String, u64>, mongodb::error::Error> {
        let pipeline = vec![
            doc! { "$match": filter },
            doc! { "$group": { "_id": format!("${}", field), "count": { "$sum": 1 } } },
        ];

        let groups: Vec<Document> = self
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;

        Ok(tally(groups))
    }
}

/// (collection, keys, unique). The unique ones back duplicate-email
/// rejection, one cart per customer and idempotent payments.
fn index_specs() -> Vec<(&'static str, Document, bool)> {
    vec![
        (USERS, doc! { "email": 1 }, true),
        (USERS, doc! { "details.role": 1 }, false),
        (PRODUCTS, doc! { "status": 1, "created_at": -1 }, false),
        (PRODUCTS, doc! { "seller_email": 1 }, false),
        (PRODUCTS, doc! { "category": 1 }, false),
        (CARTS, doc! { "customer_email": 1 }, true),
        (PAYMENTS, doc! { "transaction_id": 1 }, true),
        (PAYMENTS, doc! { "customer_email": 1, "created_at": -1 }, false),
        (PAYMENTS, doc! { "items.seller_email": 1 }, false),
        (CONTACT_MESSAGES, doc! { "email": 1 }, false),
        (CONTACT_MESSAGES, doc! { "admin_read": 1 }, false),
    ]
}

/// Folds `{_id, count}` group documents into a map. Groups with a missing
/// key are dropped.
fn tally(groups: Vec<Document>) -> BTreeMap<String, u64> {
    groups
        .into_iter()
        .filter_map(|group| {
            let key = match group.get("_id") {
                Some(Bson::String(key)) => key.clone(),
                _ => return None,
            };
            let count = match group.get("count") {
                Some(Bson::Int32(n)) => *n as u64,
                Some(Bson::Int64(n)) => *n as u64,
                _ => 0,
            };
            Some((key, count))
        })
        .collect()
}

/// Database name is the URI path segment; falls back to `biznest`.
fn database_name_from_uri(uri: &str) -> String {
    let without_scheme = uri.split("://").nth(1).unwrap_or(uri);

    without_scheme
        .split_once('/')
        .map(|(_, rest)| rest.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or("biznest")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_name_from_uri() {
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/shop"), "shop");
        assert_eq!(
            database_name_from_uri("mongodb+srv://u:p@cluster.example.net/market?retryWrites=true"),
            "market"
        );
        assert_eq!(database_name_from_uri("mongodb://localhost:27017"), "biznest");
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/?w=majority"), "biznest");
    }

    #[test]
    fn test_tally_groups() {
        let counts = tally(vec![
            doc! { "_id": "pending", "count": 3 },
            doc! { "_id": "released", "count": 7_i64 },
            doc! { "_id": Bson::Null, "count": 1 },
        ]);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["pending"], 3);
        assert_eq!(counts["released"], 7);
    }

    #[test]
    fn test_unique_index_specs() {
        let unique: Vec<(&str, Document)> = index_specs()
            .into_iter()
            .filter(|(_, _, is_unique)| *is_unique)
            .map(|(collection, keys, _)| (collection, keys))
            .collect();

        assert_eq!(
            unique,
            vec![
                (USERS, doc! { "email": 1 }),
                (CARTS, doc! { "customer_email": 1 }),
                (PAYMENTS, doc! { "transaction_id": 1 }),
            ]
        );
    }
}
