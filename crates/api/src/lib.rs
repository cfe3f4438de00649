//! HTTP API: authorization middleware, response cache, policy config, routes.

pub mod app;
pub mod authz;
pub mod bindings;
pub mod cache;
pub mod config;
pub mod context;
pub mod middleware;
