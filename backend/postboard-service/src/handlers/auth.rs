/// Signup and login
use crate::error::Result;
use crate::services::validation::{LoginRequest, SignupRequest};
use crate::services::{MediaStorage, UserService};
use actix_web::{web, HttpResponse};
use crypto_core::jwt::JwtCodec;
use doc_store::DocumentStore;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn signup(
    store: web::Data<dyn DocumentStore>,
    jwt: web::Data<JwtCodec>,
    media: web::Data<MediaStorage>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let token = UserService::new(store.into_inner())
        .signup(&jwt, req.into_inner(), media.default_image_url())
        .await?;
    Ok(HttpResponse::Created().json(TokenResponse { token }))
}

pub async fn login(
    store: web::Data<dyn DocumentStore>,
    jwt: web::Data<JwtCodec>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let token = UserService::new(store.into_inner())
        .login(&jwt, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}
