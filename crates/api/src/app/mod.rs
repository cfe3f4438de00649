//! HTTP API application wiring (Axum router + authorization layers).
//!
//! - `routes/`: HTTP handlers (one file per area)
//! - `errors.rs`: consistent error and denial responses
//!
//! Layer order, outermost first: `authenticate` → `response_cache` →
//! `authorize` → handler. The cache sits outside `authorize` so that every
//! cached response is revalidated before it is served.

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use warden_auth::{AuthorizeFilter, Hs256Verifier};

use crate::authz::{CommandPipeline, HttpPipeline};
use crate::cache::ResponseCache;
use crate::config::{ConfigError, PolicyConfig};
use crate::middleware;

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(jwt_secret: &str, policy: PolicyConfig) -> Result<Router, ConfigError> {
    let compiled = policy.compile()?;

    let auth_state = middleware::AuthState {
        verifier: Arc::new(Hs256Verifier::new(jwt_secret.as_bytes())),
    };
    let authorize_state = middleware::AuthorizeState {
        filter: AuthorizeFilter::<HttpPipeline>::new(Arc::clone(&compiled.registry)),
        bindings: Arc::clone(&compiled.bindings),
    };
    let commands = AuthorizeFilter::<CommandPipeline>::new(Arc::clone(&compiled.registry));
    let cache = ResponseCache::new(Arc::clone(&compiled.bindings));

    let app = routes::router()
        .route_layer(axum::middleware::from_fn_with_state(
            authorize_state,
            middleware::authorize,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            cache.clone(),
            crate::cache::response_cache,
        ))
        .layer(Extension(cache))
        .layer(Extension(commands))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::authenticate,
        )));

    tracing::info!(
        operations = compiled.registry.len(),
        routes = compiled.bindings.len(),
        "authorization policy loaded"
    );
    Ok(app)
}
