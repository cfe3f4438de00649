//! Decision explanations for the calling principal.
//!
//! Answers "what would happen if I called this operation?" without calling
//! it: the operation is checked through the command pipeline and every
//! applicable allow-list is explained.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use warden_auth::{AuthorizeFilter, FilterOutcome, Principal, UserPrincipal, explain};
use warden_core::OperationId;

use crate::app::errors;
use crate::authz::{CommandAuthzError, CommandContext, CommandPipeline, authorize_command};

pub async fn explain_operation(
    Path(operation): Path<String>,
    Extension(filter): Extension<AuthorizeFilter<CommandPipeline>>,
    principal: Option<Extension<UserPrincipal>>,
) -> Response {
    let Ok(operation) = OperationId::new(operation) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_operation", "invalid operation id");
    };
    let Some(policy) = filter.registry().resolve(&operation) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "unknown operation");
    };

    let principal = principal.map(|Extension(p)| p);
    let explanations: Vec<_> = policy
        .allow_lists
        .iter()
        .map(|allow| explain(principal.as_ref().map(|p| p as &dyn Principal), allow))
        .collect();

    let ctx = CommandContext::new(principal, operation.clone());
    let outcome = match authorize_command(&filter, &ctx) {
        Ok(outcome) => outcome,
        Err(CommandAuthzError::Denied(denial)) => FilterOutcome::Denied { denial },
        Err(CommandAuthzError::Contract(violation)) => {
            tracing::error!(%operation, error = %violation, "authorization contract violated");
            return errors::contract_violation_response(&violation);
        }
    };

    Json(serde_json::json!({
        "operation": operation,
        "group": policy.group,
        "bypass": policy.bypass,
        "result": outcome,
        "explanations": explanations,
    }))
    .into_response()
}
