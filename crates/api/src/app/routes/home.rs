use axum::{extract::Extension, response::IntoResponse, Json};

use warden_auth::{Principal, UserPrincipal};

pub async fn index(principal: Option<Extension<UserPrincipal>>) -> impl IntoResponse {
    let name = principal
        .as_ref()
        .map(|Extension(p)| p.name())
        .filter(|name| !name.is_empty());
    Json(serde_json::json!({
        "message": "Welcome",
        "signed_in_as": name,
    }))
}

/// Admin-only profile page. Rendered per principal, so never cached.
pub async fn my_profile(Extension(principal): Extension<UserPrincipal>) -> impl IntoResponse {
    Json(serde_json::json!({
        "email": principal.name(),
    }))
}
