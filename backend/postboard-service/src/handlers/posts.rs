/// Post handlers - posts, comments and likes
use crate::error::Result;
use crate::middleware::AuthContext;
use crate::services::validation::TextBody;
use crate::services::PostService;
use actix_web::{web, HttpResponse};
use doc_store::DocumentStore;

/// List every post, newest first
pub async fn get_all_posts(store: web::Data<dyn DocumentStore>) -> Result<HttpResponse> {
    let posts = PostService::new(store.into_inner()).list_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn create_post(
    store: web::Data<dyn DocumentStore>,
    auth: AuthContext,
    req: web::Json<TextBody>,
) -> Result<HttpResponse> {
    let body = req.require("body")?;
    let post = PostService::new(store.into_inner())
        .create_post(&auth, body)
        .await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn get_post(
    store: web::Data<dyn DocumentStore>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post = PostService::new(store.into_inner())
        .get_post(&post_id)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    store: web::Data<dyn DocumentStore>,
    auth: AuthContext,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    PostService::new(store.into_inner())
        .delete_post(&auth, &post_id)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "Post deleted successfully"})))
}

pub async fn add_comment(
    store: web::Data<dyn DocumentStore>,
    auth: AuthContext,
    post_id: web::Path<String>,
    req: web::Json<TextBody>,
) -> Result<HttpResponse> {
    let body = req.require("comment")?;
    let comment = PostService::new(store.into_inner())
        .add_comment(&auth, &post_id, body)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn like_post(
    store: web::Data<dyn DocumentStore>,
    auth: AuthContext,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post = PostService::new(store.into_inner())
        .like_post(&auth, &post_id)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn unlike_post(
    store: web::Data<dyn DocumentStore>,
    auth: AuthContext,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post = PostService::new(store.into_inner())
        .unlike_post(&auth, &post_id)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}
