use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::services::auth_service::verify_access_token;

/// JSON 401/403 body in the API's error envelope.
pub(crate) fn reject<B>(req: ServiceRequest, response: HttpResponse) -> ServiceResponse<EitherBody<B>> {
    req.into_response(response).map_into_right_body()
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Verifies the bearer access token and stores its `Claims` in the request
/// extensions, where handlers read them through `web::ReqData<Claims>`.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let Some(token) = bearer_token(&req) else {
            log::warn!("⚠️  Missing bearer token: {} {}", req.method(), req.path());
            let response = HttpResponse::Unauthorized().json(serde_json::json!({
                "success": false,
                "error": "Missing authorization token"
            }));
            return Box::pin(async move { Ok(reject(req, response)) });
        };

        match verify_access_token(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(e) => {
                log::warn!("⚠️  Rejected token on {}: {}", req.path(), e);
                let response = HttpResponse::Unauthorized().json(serde_json::json!({
                    "success": false,
                    "error": e
                }));
                Box::pin(async move { Ok(reject(req, response)) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoleDetails, User};
    use crate::services::auth_service::{generate_jwt, generate_refresh_token, Claims};
    use actix_web::{test, web, App};
    use mongodb::bson::oid::ObjectId;

    fn user() -> User {
        User {
            _id: Some(ObjectId::new()),
            email: "c@example.com".into(),
            password: String::new(),
            name: "Cleo".into(),
            details: RoleDetails::Customer { phone: None, address: None },
            is_active: true,
            created_at: None,
            updated_at: None,
            last_login: None,
        }
    }

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.email.clone())
    }

    #[actix_web::test]
    async fn test_rejects_missing_token() {
        let app = test::init_service(
            App::new().service(web::scope("/p").wrap(AuthMiddleware).route("", web::get().to(whoami))),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/p").to_request()).await;
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_accepts_access_token_and_exposes_claims() {
        let app = test::init_service(
            App::new().service(web::scope("/p").wrap(AuthMiddleware).route("", web::get().to(whoami))),
        )
        .await;

        let token = generate_jwt(&user()).unwrap();
        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(test::read_body(resp).await, "c@example.com");
    }

    #[actix_web::test]
    async fn test_rejects_refresh_token() {
        let app = test::init_service(
            App::new().service(web::scope("/p").wrap(AuthMiddleware).route("", web::get().to(whoami))),
        )
        .await;

        let token = generate_refresh_token(&user()).unwrap();
        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }
}
