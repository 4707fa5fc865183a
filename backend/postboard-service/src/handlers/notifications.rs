/// Notification handlers
use crate::error::Result;
use crate::middleware::AuthContext;
use crate::services::NotificationService;
use actix_web::{web, HttpResponse};
use doc_store::DocumentStore;

/// Body: JSON array of notification ids.
pub async fn mark_notifications_read(
    store: web::Data<dyn DocumentStore>,
    auth: AuthContext,
    req: web::Json<Vec<String>>,
) -> Result<HttpResponse> {
    let marked = NotificationService::new(store.into_inner())
        .mark_read(&auth, &req)
        .await?;
    tracing::debug!(handle = %auth.handle, marked, "notifications marked read");
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "Notifications marked read"})))
}
