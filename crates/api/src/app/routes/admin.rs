//! Operator endpoints.

use axum::{extract::Extension, response::IntoResponse, Json};

use crate::cache::ResponseCache;

pub async fn purge_cache(Extension(cache): Extension<ResponseCache>) -> impl IntoResponse {
    let purged = cache.purge();
    tracing::info!(purged, "response cache purged");
    Json(serde_json::json!({ "purged": purged }))
}
