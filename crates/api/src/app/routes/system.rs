use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use warden_auth::{Principal, UserPrincipal};

use crate::context::AuthorizationOutcome;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(principal): Extension<UserPrincipal>,
    Extension(authz): Extension<AuthorizationOutcome>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": principal.name(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "authorization": authz,
    }))
}
