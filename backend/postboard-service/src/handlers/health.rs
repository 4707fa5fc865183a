/// Liveness and readiness probes
use actix_web::{web, HttpResponse};
use doc_store::DocumentStore;

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

/// Ready when the document store answers a ping.
pub async fn health_check(store: web::Data<dyn DocumentStore>) -> HttpResponse {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "store": "reachable",
        })),
        Err(err) => {
            tracing::warn!(error = %err, "store health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unavailable",
                "store": "unreachable",
            }))
        }
    }
}
