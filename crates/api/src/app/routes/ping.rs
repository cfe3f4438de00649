use axum::{extract::Path, response::IntoResponse, Json};

pub async fn get(Path(name): Path<String>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": format!("Hello, {name}"),
    }))
}
