use axum::http::{HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use serde_json::json;

use warden_auth::{ContractViolation, Denial};

/// Failure response for a denied request.
///
/// `Unauthenticated` → 401 with a `WWW-Authenticate` challenge,
/// `Forbidden` → 403.
pub fn denial_response(denial: Denial) -> axum::response::Response {
    match denial {
        Denial::Unauthenticated => {
            let mut res = json_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authorization has been denied for this request.",
            );
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            res
        }
        Denial::Forbidden => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "This request has been forbidden.",
        ),
    }
}

/// The filter was wired incorrectly. Details go to the log, not the client.
pub fn contract_violation_response(_violation: &ContractViolation) -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "authorization is misconfigured for this route",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
