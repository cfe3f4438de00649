//! Route → operation bindings.
//!
//! The router knows paths; the policy registry knows operations. This table
//! joins the two using the path template axum matched for the request.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{MatchedPath, Request};
use axum::http::Method;
use thiserror::Error;

use warden_core::OperationId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("route {method} {path} is bound more than once")]
    DuplicateRoute { method: Method, path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    pub operation: OperationId,
    /// Response-cache lifetime; `None` means never cached.
    pub cache_ttl: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteBindings {
    routes: HashMap<String, HashMap<Method, RouteBinding>>,
}

impl RouteBindings {
    /// Bind `method path` to an operation. A route may only be bound once.
    pub fn bind(
        &mut self,
        method: Method,
        path: &str,
        binding: RouteBinding,
    ) -> Result<(), BindingError> {
        let by_method = self.routes.entry(path.to_string()).or_default();
        if by_method.contains_key(&method) {
            return Err(BindingError::DuplicateRoute {
                method,
                path: path.to_string(),
            });
        }
        by_method.insert(method, binding);
        Ok(())
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Option<&RouteBinding> {
        self.routes.get(path)?.get(method)
    }

    /// Binding for the route axum matched for `req`, if any.
    pub fn resolve_request(&self, req: &Request) -> Option<&RouteBinding> {
        let matched = req.extensions().get::<MatchedPath>()?;
        self.resolve(req.method(), matched.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(op: &str) -> RouteBinding {
        RouteBinding {
            operation: OperationId::new(op).unwrap(),
            cache_ttl: None,
        }
    }

    #[test]
    fn resolves_by_method_and_template() {
        let mut b = RouteBindings::default();
        b.bind(Method::GET, "/api/ping/:name", binding("ping.get")).unwrap();
        b.bind(Method::DELETE, "/api/ping/:name", binding("ping.delete")).unwrap();

        assert_eq!(
            b.resolve(&Method::GET, "/api/ping/:name").unwrap().operation.as_str(),
            "ping.get"
        );
        assert_eq!(
            b.resolve(&Method::DELETE, "/api/ping/:name").unwrap().operation.as_str(),
            "ping.delete"
        );
        assert!(b.resolve(&Method::POST, "/api/ping/:name").is_none());
        assert!(b.resolve(&Method::GET, "/api/ping/bob").is_none());
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn rejects_double_binding() {
        let mut b = RouteBindings::default();
        assert!(b.is_empty());
        b.bind(Method::GET, "/", binding("a")).unwrap();
        assert!(!b.is_empty());
        assert_eq!(
            b.bind(Method::GET, "/", binding("b")),
            Err(BindingError::DuplicateRoute {
                method: Method::GET,
                path: "/".to_string(),
            })
        );
    }

    #[test]
    fn request_without_matched_path_is_unresolved() {
        let mut b = RouteBindings::default();
        b.bind(Method::GET, "/", binding("a")).unwrap();
        let req = Request::builder().uri("/").body(axum::body::Body::empty()).unwrap();
        assert!(b.resolve_request(&req).is_none());
    }
}
