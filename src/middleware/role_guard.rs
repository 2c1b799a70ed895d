use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use super::auth::reject;
use crate::models::Role;
use crate::services::auth_service::Claims;

/// Lets a request through only if the authenticated caller has one of the
/// allowed roles. Must sit inside `AuthMiddleware`.
pub struct RoleGuard {
    allowed: Rc<Vec<Role>>,
}

impl RoleGuard {
    pub fn new(allowed: &[Role]) -> Self {
        Self { allowed: Rc::new(allowed.to_vec()) }
    }

    pub fn only(role: Role) -> Self {
        Self::new(&[role])
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RoleGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleGuardService {
            service,
            allowed: Rc::clone(&self.allowed),
        }))
    }
}

pub struct RoleGuardService<S> {
    service: S,
    allowed: Rc<Vec<Role>>,
}

impl<S, B> Service<ServiceRequest> for RoleGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req.extensions().get::<Claims>().map(|claims| claims.role);

        match role {
            Some(role) if self.allowed.contains(&role) => {
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Some(role) => {
                log::warn!("🚫 Role {} denied on {} {}", role, req.method(), req.path());
                let response = HttpResponse::Forbidden().json(serde_json::json!({
                    "success": false,
                    "error": "Insufficient permissions"
                }));
                Box::pin(async move { Ok(reject(req, response)) })
            }
            None => {
                let response = HttpResponse::Unauthorized().json(serde_json::json!({
                    "success": false,
                    "error": "Authentication required"
                }));
                Box::pin(async move { Ok(reject(req, response)) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::AuthMiddleware;
    use crate::models::{RoleDetails, User};
    use crate::services::auth_service::generate_jwt;
    use actix_web::{http::header, test, web, App};
    use mongodb::bson::oid::ObjectId;

    fn token_for(details: RoleDetails) -> String {
        let user = User {
            _id: Some(ObjectId::new()),
            email: "u@example.com".into(),
            password: String::new(),
            name: "U".into(),
            details,
            is_active: true,
            created_at: None,
            updated_at: None,
            last_login: None,
        };
        generate_jwt(&user).unwrap()
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_role_guard_allows_and_denies() {
        let app = test::init_service(
            App::new().service(
                web::scope("/admin")
                    .wrap(RoleGuard::only(Role::Admin))
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(ok)),
            ),
        )
        .await;

        let admin = token_for(RoleDetails::Admin { permissions: vec![] });
        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", admin)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let customer = token_for(RoleDetails::Customer { phone: None, address: None });
        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", customer)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Insufficient permissions");
    }

    #[actix_web::test]
    async fn test_role_guard_without_claims() {
        let app = test::init_service(
            App::new().service(
                web::scope("/seller")
                    .wrap(RoleGuard::only(Role::Seller))
                    .route("", web::get().to(ok)),
            ),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/seller").to_request()).await;
        assert_eq!(resp.status(), 401);
    }
}
