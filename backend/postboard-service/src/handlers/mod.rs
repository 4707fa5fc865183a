/// HTTP handlers and the route table
pub mod auth;
pub mod health;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod users;

use crate::metrics::serve_metrics;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/health/live", web::get().to(health::liveness_check))
        .route("/metrics", web::get().to(serve_metrics))
        .route("/posts", web::get().to(posts::get_all_posts))
        .route("/post", web::post().to(posts::create_post))
        .service(
            web::resource("/post/{post_id}")
                .route(web::get().to(posts::get_post))
                .route(web::delete().to(posts::delete_post)),
        )
        .route("/post/{post_id}/comment", web::post().to(posts::add_comment))
        .route("/post/{post_id}/like", web::get().to(posts::like_post))
        .route("/post/{post_id}/unlike", web::get().to(posts::unlike_post))
        .route("/signup", web::post().to(auth::signup))
        .route("/login", web::post().to(auth::login))
        .service(
            web::resource("/user")
                .route(web::get().to(users::get_authenticated_user))
                .route(web::post().to(users::add_user_details)),
        )
        // Shadows `/user/{handle}` for every method, so GET is routed here too.
        .service(
            web::resource("/user/image")
                .route(web::post().to(users::upload_image))
                .route(web::get().to(users::get_image_user_details)),
        )
        .route("/user/{handle}", web::get().to(users::get_user_details))
        .route(
            "/notifications",
            web::post().to(notifications::mark_notifications_read),
        )
        .route("/media/{file_name}", web::get().to(media::serve_image));
}
