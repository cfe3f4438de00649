use serde::{Deserialize, Serialize};

/// Outcome of an authorization decision.
///
/// Three values, not a boolean: callers distinguish "prove who you are"
/// from "you are known but not permitted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Proceed.
    Accepted,
    /// Not authenticated, or not one of the permitted users (HTTP 401).
    Unauthenticated,
    /// Authenticated but holds none of the permitted roles (HTTP 403).
    Forbidden,
}

impl Decision {
    /// HTTP status code this decision maps to.
    pub fn status_code(self) -> u16 {
        match self {
            Decision::Accepted => 202,
            Decision::Unauthenticated => 401,
            Decision::Forbidden => 403,
        }
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, Decision::Accepted)
    }

    /// The rejected subset, or `None` when accepted.
    pub fn denial(self) -> Option<Denial> {
        match self {
            Decision::Accepted => None,
            Decision::Unauthenticated => Some(Denial::Unauthenticated),
            Decision::Forbidden => Some(Denial::Forbidden),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Accepted => "accepted",
            Decision::Unauthenticated => "unauthenticated",
            Decision::Forbidden => "forbidden",
        }
    }
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected decision. Response writers take this, not a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    Unauthenticated,
    Forbidden,
}

impl Denial {
    pub fn status_code(self) -> u16 {
        Decision::from(self).status_code()
    }
}

impl From<Denial> for Decision {
    fn from(value: Denial) -> Self {
        match value {
            Denial::Unauthenticated => Decision::Unauthenticated,
            Denial::Forbidden => Decision::Forbidden,
        }
    }
}

impl core::fmt::Display for Denial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&Decision::from(*self), f)
    }
}
