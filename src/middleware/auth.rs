use crate::{
    cache::RedisCache,
    models::SessionUser,
    services::{session_service, token_service},
    utils::error::AppError,
};
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Cookie-based authentication: verifies the `ac_token` JWT, then loads the
/// session record from Redis. The cached record, not the token payload, is
/// what downstream handlers see as the request user.
pub struct Authenticated;

impl<S, B> Transform<S, ServiceRequest> for Authenticated
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticatedMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticatedMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthenticatedMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthenticatedMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = req
                .cookie(session_service::ACCESS_COOKIE)
                .map(|c| c.value().to_string());

            let token = match token {
                Some(t) if !t.is_empty() => t,
                _ => {
                    return Err(AppError::Unauthorized(
                        "Please login to access this resource".to_string(),
                    )
                    .into())
                }
            };

            let claims = token_service::verify_access_token(&token).map_err(Error::from)?;

            let cache = req
                .app_data::<web::Data<RedisCache>>()
                .cloned()
                .ok_or_else(|| {
                    Error::from(AppError::CacheError("Cache is not configured".to_string()))
                })?;

            let user = session_service::load_session(&cache, &claims.sub)
                .await
                .map_err(Error::from)?
                .ok_or_else(|| {
                    Error::from(AppError::NotFound(
                        "Session not found. Please login again".to_string(),
                    ))
                })?;

            req.extensions_mut().insert(user);
            service.call(req).await
        })
    }
}

/// Role gate, applied after [`Authenticated`]. Rejects with 403 unless the
/// session user's role is in the allow-list.
pub struct RequireRoles(pub &'static [&'static str]);

impl<S, B> Transform<S, ServiceRequest> for RequireRoles
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRolesMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRolesMiddleware {
            service: Rc::new(service),
            roles: self.0,
        }))
    }
}

pub struct RequireRolesMiddleware<S> {
    service: Rc<S>,
    roles: &'static [&'static str],
}

impl<S, B> Service<ServiceRequest> for RequireRolesMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let roles = self.roles;

        Box::pin(async move {
            let role = req
                .extensions()
                .get::<SessionUser>()
                .map(|user| user.role.clone());

            match role {
                Some(role) if roles.contains(&role.as_str()) => service.call(req).await,
                Some(role) => Err(AppError::Forbidden(format!(
                    "Role: {} is not allowed to access this resource",
                    role
                ))
                .into()),
                None => Err(AppError::Unauthorized(
                    "Please login to access this resource".to_string(),
                )
                .into()),
            }
        })
    }
}

/// Lets handlers take `SessionUser` as an argument once [`Authenticated`]
/// has populated the request extensions.
impl FromRequest for SessionUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<SessionUser>()
                .cloned()
                .ok_or_else(|| {
                    AppError::Unauthorized("Please login to access this resource".to_string())
                        .into()
                }),
        )
    }
}
