/// Profile handlers
use crate::error::{AppError, Result};
use crate::middleware::AuthContext;
use crate::services::validation::UserDetailsRequest;
use crate::services::{MediaStorage, UserService};
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use doc_store::DocumentStore;

pub async fn add_user_details(
    store: web::Data<dyn DocumentStore>,
    auth: AuthContext,
    req: web::Json<UserDetailsRequest>,
) -> Result<HttpResponse> {
    UserService::new(store.into_inner())
        .add_details(&auth, &req)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "Details added successfully"})))
}

pub async fn get_authenticated_user(
    store: web::Data<dyn DocumentStore>,
    auth: AuthContext,
) -> Result<HttpResponse> {
    let user = UserService::new(store.into_inner())
        .authenticated_user(&auth)
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn get_user_details(
    store: web::Data<dyn DocumentStore>,
    handle: web::Path<String>,
) -> Result<HttpResponse> {
    user_details_response(store, &handle).await
}

/// `GET /user/image` is the public profile of the user handled `image`.
pub async fn get_image_user_details(store: web::Data<dyn DocumentStore>) -> Result<HttpResponse> {
    user_details_response(store, "image").await
}

async fn user_details_response(
    store: web::Data<dyn DocumentStore>,
    handle: &str,
) -> Result<HttpResponse> {
    let details = UserService::new(store.into_inner())
        .user_details(handle)
        .await?;
    Ok(HttpResponse::Ok().json(details))
}

/// Raw image upload; the body is the file.
pub async fn upload_image(
    store: web::Data<dyn DocumentStore>,
    media: web::Data<MediaStorage>,
    auth: AuthContext,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let content_type = req
        .mime_type()
        .ok()
        .flatten()
        .ok_or_else(|| AppError::BadRequest("Wrong file type submitted".to_string()))?;

    let image_url = media.save(&body, &content_type).await?;
    UserService::new(store.into_inner())
        .set_image_url(&auth, &image_url)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Image uploaded successfully",
        "imageUrl": image_url,
    })))
}
