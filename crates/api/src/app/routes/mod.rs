use axum::{
    routing::{delete, get},
    Router,
};

pub mod admin;
pub mod explain;
pub mod home;
pub mod ping;
pub mod system;

/// Router for every bound route. Paths must match the policy's route bindings.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/whoami", get(system::whoami))
        .route("/authz/explain/:operation", get(explain::explain_operation))
        .route("/", get(home::index))
        .route("/my-profile", get(home::my_profile))
        .route("/api/ping/:name", get(ping::get))
        .route("/admin/cache", delete(admin::purge_cache))
}
