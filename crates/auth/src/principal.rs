use serde::{Deserialize, Serialize};

use crate::Role;

/// Identity asserted for the current request.
///
/// Populated upstream (token verification, session lookup, ...) and read-only
/// to the decision engine. Role membership is a capability, not a list: the
/// engine only ever asks `has_role`.
pub trait Principal {
    fn is_authenticated(&self) -> bool;

    /// User name; empty when unauthenticated.
    fn name(&self) -> &str;

    fn has_role(&self, role: &str) -> bool;
}

/// A principal backed by a name and a fixed role set.
///
/// Role membership checks are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPrincipal {
    name: String,
    roles: Vec<Role>,
    authenticated: bool,
}

impl UserPrincipal {
    /// An authenticated principal.
    pub fn authenticated(name: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            name: name.into(),
            roles,
            authenticated: true,
        }
    }

    /// An unauthenticated principal (no name, no roles).
    pub fn anonymous() -> Self {
        Self {
            name: String::new(),
            roles: Vec::new(),
            authenticated: false,
        }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl Principal for UserPrincipal {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn has_role(&self, role: &str) -> bool {
        self.authenticated && self.roles.iter().any(|r| r.matches(role))
    }
}
