use std::env;

/// Runtime configuration read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub currency: String,
    pub cors_origins: Vec<String>,
    pub admin: Option<AdminSeed>,
}

/// Bootstrap admin account, created at startup if no user has this email.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a valid port number, got '{}'", raw))?,
            None => 5000,
        };

        let database_url = lookup("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set".to_string())?;
        let stripe_secret_key =
            lookup("STRIPE_SECRET_KEY").ok_or_else(|| "STRIPE_SECRET_KEY must be set".to_string())?;

        let stripe_api_base = lookup("STRIPE_API_BASE")
            .unwrap_or_else(|| "https://api.stripe.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        let currency = lookup("PAYMENT_CURRENCY")
            .unwrap_or_else(|| "usd".to_string())
            .to_lowercase();

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email: email.trim().to_lowercase(),
                password,
                name: lookup("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            host,
            port,
            database_url,
            stripe_secret_key,
            stripe_api_base,
            currency,
            cors_origins,
            admin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "mongodb://localhost:27017/biznest"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.currency, "usd");
        assert_eq!(config.stripe_api_base, "https://api.stripe.com/v1");
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_missing_required_vars() {
        let err = AppConfig::from_lookup(lookup_from(&[("STRIPE_SECRET_KEY", "sk")])).unwrap_err();
        assert!(err.contains("DATABASE_URL"));

        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "mongodb://x")])).unwrap_err();
        assert!(err.contains("STRIPE_SECRET_KEY"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "mongodb://x"),
            ("STRIPE_SECRET_KEY", "sk"),
            ("PORT", "http"),
        ]))
        .unwrap_err();
        assert!(err.contains("PORT"));
    }

    #[test]
    fn test_admin_seed_and_origins() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "mongodb://x"),
            ("STRIPE_SECRET_KEY", "sk"),
            ("ADMIN_EMAIL", " Boss@BizNest.io "),
            ("ADMIN_PASSWORD", "secret123"),
            ("CORS_ORIGINS", "https://biznest.io, ,https://admin.biznest.io"),
            ("PAYMENT_CURRENCY", "EUR"),
        ]))
        .unwrap();

        let admin = config.admin.unwrap();
        assert_eq!(admin.email, "boss@biznest.io");
        assert_eq!(admin.name, "Administrator");
        assert_eq!(config.cors_origins, vec!["https://biznest.io", "https://admin.biznest.io"]);
        assert_eq!(config.currency, "eur");
    }
}
