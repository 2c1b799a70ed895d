use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::database::MongoDB;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

fn health_report(database_up: bool) -> HealthResponse {
    HealthResponse {
        status: if database_up { "healthy" } else { "degraded" }.to_string(),
        service: "biznest-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_up { "connected" } else { "unreachable" }.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(db: web::Data<MongoDB>) -> impl Responder {
    let report = health_report(db.ping().await);

    if report.status == "healthy" {
        HttpResponse::Ok().json(report)
    } else {
        log::warn!("⚠️  Health check: database unreachable");
        HttpResponse::ServiceUnavailable().json(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_report() {
        let up = health_report(true);
        assert_eq!(up.status, "healthy");
        assert_eq!(up.service, "biznest-api");
        assert_eq!(up.version, env!("CARGO_PKG_VERSION"));

        let down = health_report(false);
        assert_eq!(down.status, "degraded");
        assert_eq!(down.database, "unreachable");
    }
}
