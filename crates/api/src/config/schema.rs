use std::time::Duration;

use axum::http::Method;
use serde::Deserialize;
use thiserror::Error;

use warden_auth::AllowList;
use warden_core::{GroupId, OperationId};

use super::ConfigError;

/// Longest response-cache lifetime an operation may ask for.
const MAX_CACHE_SECONDS: u64 = 86_400;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    pub version: u32,

    /// Allow-lists applied to every operation.
    #[serde(default)]
    pub global: Vec<AllowList>,

    #[serde(default)]
    pub groups: Vec<GroupConfig>,

    #[serde(default)]
    pub operations: Vec<OperationConfig>,
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        if self.operations.is_empty() {
            return Err(ConfigError::Invalid("operations must not be empty".into()));
        }
        for op in &self.operations {
            op.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub id: GroupId,

    #[serde(default)]
    pub allow_anonymous: bool,

    #[serde(default)]
    pub authorize: Vec<AllowList>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationConfig {
    pub id: OperationId,

    #[serde(default)]
    pub group: Option<GroupId>,

    pub route: RouteSpec,

    #[serde(default)]
    pub allow_anonymous: bool,

    #[serde(default)]
    pub authorize: Vec<AllowList>,

    /// Response-cache lifetime; GET operations only.
    #[serde(default)]
    pub cache_seconds: Option<u64>,
}

impl OperationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secs) = self.cache_seconds {
            if self.route.method != Method::GET {
                return Err(ConfigError::Invalid(format!(
                    "operations.{}: cache_seconds is only allowed on GET routes",
                    self.id
                )));
            }
            if !(1..=MAX_CACHE_SECONDS).contains(&secs) {
                return Err(ConfigError::Invalid(format!(
                    "operations.{}: cache_seconds must be between 1 and {MAX_CACHE_SECONDS}",
                    self.id
                )));
            }
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteSpecError {
    #[error("invalid route: {0} (expected \"METHOD /path\")")]
    Malformed(String),

    #[error("invalid route method: {0}")]
    InvalidMethod(String),

    #[error("invalid route path: {0} (must start with '/')")]
    InvalidPath(String),
}

/// `"METHOD /path"`, with the path written the way the router spells it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct RouteSpec {
    pub method: Method,
    pub path: String,
}

impl TryFrom<String> for RouteSpec {
    type Error = RouteSpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let Some((method, path)) = value.trim().split_once(' ') else {
            return Err(RouteSpecError::Malformed(value.clone()));
        };

        let method = method.trim();
        if method.is_empty() || method.chars().any(|c| !c.is_ascii_uppercase()) {
            return Err(RouteSpecError::InvalidMethod(method.to_string()));
        }
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| RouteSpecError::InvalidMethod(method.to_string()))?;

        let path = path.trim();
        if !path.starts_with('/') {
            return Err(RouteSpecError::InvalidPath(path.to_string()));
        }

        Ok(Self {
            method,
            path: path.to_string(),
        })
    }
}
