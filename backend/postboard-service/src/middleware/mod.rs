/// HTTP middleware utilities for postboard-service
///
/// Provides the bearer-token identity extractor and request metrics.
pub mod permissions;

pub use permissions::*;

use crate::error::AppError;
use crate::metrics;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpRequest};
use crypto_core::jwt::JwtCodec;
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

// =====================================================================
// Authentication
// =====================================================================

/// Identity of the caller, resolved from `Authorization: Bearer <token>`.
///
/// Adding this as a handler argument makes the route require authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub handle: String,
}

impl AuthContext {
    fn from_request_sync(req: &HttpRequest) -> Result<Self, AppError> {
        let codec = req
            .app_data::<web::Data<JwtCodec>>()
            .ok_or_else(|| AppError::Internal("JWT codec not configured".to_string()))?;

        let header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".to_string()))?;

        let claims = codec.validate(token).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(AuthContext {
            user_id: claims.sub,
            handle: claims.handle,
        })
    }
}

impl FromRequest for AuthContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_request_sync(req))
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

/// Records request latency per matched route pattern.
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
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
        let service = self.service.clone();
        // Route patterns keep label cardinality bounded.
        let path = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();
            let status = match &res {
                Ok(response) => response.status().as_u16(),
                Err(err) => err.as_response_error().status_code().as_u16(),
            };
            metrics::record_http_request(&method, &path, status, elapsed);
            tracing::debug!(%method, %path, status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
            res
        })
    }
}
