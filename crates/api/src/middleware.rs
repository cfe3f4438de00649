use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use warden_auth::{
    AuthorizeFilter, CachePolicy, ContractViolation, FilterOutcome, Pipeline, TokenVerifier, explain,
};

use crate::app::errors;
use crate::authz::HttpPipeline;
use crate::bindings::RouteBindings;
use crate::cache::CacheHook;
use crate::context::AuthorizationOutcome;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Attach the bearer token's principal to the request.
///
/// Never rejects: a missing or invalid token leaves the request anonymous
/// and the authorize step decides what that means for the route.
pub async fn authenticate(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let principal = match extract_bearer(req.headers()) {
        Ok(Some(token)) => match state.verifier.verify(token, Utc::now()) {
            Ok(claims) => Some(claims.into_principal()),
            Err(e) => {
                tracing::warn!(error = %e, "bearer token rejected");
                None
            }
        },
        Ok(None) => None,
        Err(status) => {
            tracing::warn!(%status, "malformed authorization header");
            None
        }
    };

    if let Some(principal) = principal {
        req.extensions_mut().insert(principal);
    }
    next.run(req).await
}

pub(crate) fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, StatusCode> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Some(token))
}

#[derive(Clone)]
pub struct AuthorizeState {
    pub filter: AuthorizeFilter<HttpPipeline>,
    pub bindings: Arc<RouteBindings>,
}

/// Run the authorization filter for the matched route.
pub async fn authorize(State(state): State<AuthorizeState>, mut req: Request, next: Next) -> Response {
    let Some(binding) = state.bindings.resolve_request(&req) else {
        let violation = ContractViolation::UnresolvedOperation;
        tracing::error!(method = %req.method(), uri = %req.uri(), error = %violation, "authorization contract violated");
        return errors::contract_violation_response(&violation);
    };
    let operation = binding.operation.clone();

    let result = {
        let hook = req.extensions().get::<CacheHook>().cloned();
        let cache = hook.as_ref().map(|h| h as &dyn CachePolicy<Request>);
        state.filter.authorize(&req, &operation, cache)
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(violation) => {
            tracing::error!(%operation, error = %violation, "authorization contract violated");
            return errors::contract_violation_response(&violation);
        }
    };

    match outcome {
        FilterOutcome::Denied { denial } => {
            let principal = HttpPipeline::principal(&req);
            let reason = state
                .filter
                .registry()
                .resolve(&operation)
                .and_then(|policy| {
                    policy
                        .allow_lists
                        .iter()
                        .map(|allow| explain(principal, allow))
                        .find(|e| !e.decision.is_accepted())
                })
                .map(|e| e.reason)
                .unwrap_or_default();
            tracing::info!(
                %operation,
                user = principal.map(|p| p.name()).unwrap_or_default(),
                decision = %denial,
                %reason,
                "request denied"
            );
            return errors::denial_response(denial);
        }
        FilterOutcome::Bypassed => tracing::debug!(%operation, "anonymous access allowed"),
        FilterOutcome::Unprotected => tracing::debug!(%operation, "operation is unprotected"),
        FilterOutcome::Accepted { revalidation } => {
            tracing::debug!(%operation, revalidation, "request accepted")
        }
    }

    req.extensions_mut()
        .insert(AuthorizationOutcome::new(operation, outcome));
    next.run(req).await
}
