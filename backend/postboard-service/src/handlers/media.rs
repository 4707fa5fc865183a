/// Serves uploaded profile images from the media directory
use crate::error::Result;
use crate::services::MediaStorage;
use actix_web::{http::header, web, HttpResponse};

pub async fn serve_image(
    media: web::Data<MediaStorage>,
    file_name: web::Path<String>,
) -> Result<HttpResponse> {
    let (bytes, content_type) = media.open(&file_name).await?;
    Ok(HttpResponse::Ok()
        .insert_header(header::ContentType(content_type))
        .insert_header(header::CacheControl(vec![header::CacheDirective::MaxAge(86400)]))
        .body(bytes))
}
