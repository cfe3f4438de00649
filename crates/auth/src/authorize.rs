use serde::Serialize;

use crate::{AllowList, Decision, Principal};

/// Which check of the decision rule rejected a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedCheck {
    /// No principal, or the principal is not authenticated.
    Authentication,
    /// The principal's name is not in a non-empty user list.
    UserList,
    /// The principal holds none of the roles in a non-empty role list.
    RoleList,
}

impl FailedCheck {
    pub fn decision(self) -> Decision {
        match self {
            FailedCheck::Authentication | FailedCheck::UserList => Decision::Unauthenticated,
            FailedCheck::RoleList => Decision::Forbidden,
        }
    }
}

fn evaluate(principal: Option<&dyn Principal>, allow: &AllowList) -> Result<(), FailedCheck> {
    let Some(principal) = principal.filter(|p| p.is_authenticated()) else {
        return Err(FailedCheck::Authentication);
    };

    if !allow.permits_user(principal.name()) {
        return Err(FailedCheck::UserList);
    }

    let roles = allow.allowed_roles();
    if !roles.is_empty() && !roles.iter().any(|r| principal.has_role(r.as_str())) {
        return Err(FailedCheck::RoleList);
    }

    Ok(())
}

/// Decide whether `principal` may run an operation guarded by `allow`.
///
/// Checks run in a fixed order and the first failure wins:
/// 1. absent / unauthenticated principal → `Unauthenticated`
/// 2. name not in a non-empty user list (case-insensitive) → `Unauthenticated`
/// 3. none of a non-empty role list held → `Forbidden`
/// 4. otherwise → `Accepted`
///
/// - No IO
/// - No panics
/// - No state
pub fn decide(principal: Option<&dyn Principal>, allow: &AllowList) -> Decision {
    match evaluate(principal, allow) {
        Ok(()) => Decision::Accepted,
        Err(check) => check.decision(),
    }
}

/// Decide against several stacked allow-lists.
///
/// Lists apply conjunctively in the given order; the first non-accepted
/// decision is returned. An empty slice accepts.
pub fn decide_all(principal: Option<&dyn Principal>, lists: &[AllowList]) -> Decision {
    lists
        .iter()
        .map(|allow| decide(principal, allow))
        .find(|decision| !decision.is_accepted())
        .unwrap_or(Decision::Accepted)
}

/// Pluggable decision function used by the filter adapters.
///
/// Implementations must be pure: the cache layer may call them again from a
/// different task than the request that first authorized a response.
pub trait DecisionEngine: Send + Sync + 'static {
    fn decide(&self, principal: Option<&dyn Principal>, allow: &AllowList) -> Decision;

    fn decide_all(&self, principal: Option<&dyn Principal>, lists: &[AllowList]) -> Decision {
        lists
            .iter()
            .map(|allow| self.decide(principal, allow))
            .find(|decision| !decision.is_accepted())
            .unwrap_or(Decision::Accepted)
    }
}

/// The standard decision rule ([`decide`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEngine;

impl DecisionEngine for StandardEngine {
    fn decide(&self, principal: Option<&dyn Principal>, allow: &AllowList) -> Decision {
        decide(principal, allow)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a decision, for logs and debugging endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionExplanation {
    pub decision: Decision,

    /// HTTP status the decision maps to.
    pub status: u16,

    /// Human-readable reason for the decision.
    pub reason: String,

    pub failed_check: Option<FailedCheck>,

    pub principal: PrincipalState,

    pub allowed_users: Vec<String>,
    pub allowed_roles: Vec<String>,
}

/// What the engine could see of the principal.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub present: bool,
    pub authenticated: bool,
    pub name: Option<String>,
}

/// Explain why [`decide`] returns what it returns for these inputs.
pub fn explain(principal: Option<&dyn Principal>, allow: &AllowList) -> DecisionExplanation {
    let state = PrincipalState {
        present: principal.is_some(),
        authenticated: principal.is_some_and(|p| p.is_authenticated()),
        name: principal
            .filter(|p| p.is_authenticated())
            .map(|p| p.name().to_string()),
    };

    let allowed_users = allow.allowed_users().to_vec();
    let allowed_roles: Vec<String> = allow
        .allowed_roles()
        .iter()
        .map(|r| r.as_str().to_string())
        .collect();

    let (decision, failed_check, reason) = match evaluate(principal, allow) {
        Ok(()) => {
            let reason = if allow.is_unrestricted() {
                "principal is authenticated and the allow-list has no restrictions".to_string()
            } else {
                "principal is authenticated and passes every configured restriction".to_string()
            };
            (Decision::Accepted, None, reason)
        }
        Err(check) => {
            let reason = match check {
                FailedCheck::Authentication if principal.is_none() => {
                    "no principal is associated with the request".to_string()
                }
                FailedCheck::Authentication => "principal is not authenticated".to_string(),
                FailedCheck::UserList => format!(
                    "user '{}' is not in the permitted users {:?}",
                    state.name.as_deref().unwrap_or_default(),
                    allowed_users
                ),
                FailedCheck::RoleList => format!(
                    "user '{}' holds none of the permitted roles {:?}",
                    state.name.as_deref().unwrap_or_default(),
                    allowed_roles
                ),
            };
            (check.decision(), Some(check), reason)
        }
    };

    DecisionExplanation {
        decision,
        status: decision.status_code(),
        reason,
        failed_check,
        principal: state,
        allowed_users,
        allowed_roles,
    }
}
