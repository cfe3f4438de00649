//! Configuration: process settings from the environment, policy from YAML.

pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use warden_auth::{GroupPolicy, OperationPolicy, PolicyRegistry, RegistryError};

use crate::bindings::{BindingError, RouteBinding, RouteBindings};

pub use schema::{GroupConfig, OperationConfig, PolicyConfig, RouteSpec, RouteSpecError};

/// Policy used when `WARDEN_POLICY_FILE` is not set.
pub const DEFAULT_POLICY: &str = include_str!("../../policy.yaml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path} failed: {message}")]
    Read { path: PathBuf, message: String },

    #[error("invalid yaml: {0}")]
    Yaml(String),

    #[error("unsupported policy version {0} (expected 1)")]
    UnsupportedVersion(u32),

    #[error("invalid policy: {0}")]
    Invalid(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Binding(#[from] BindingError),
}

pub fn load_from_file(path: &Path) -> Result<PolicyConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<PolicyConfig, ConfigError> {
    let cfg: PolicyConfig =
        serde_yaml::from_str(s).map_err(|e| ConfigError::Yaml(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn default_policy() -> Result<PolicyConfig, ConfigError> {
    load_from_str(DEFAULT_POLICY)
}

/// Compiled policy: the registry the filters consult and the route bindings
/// the HTTP middleware resolves operations with.
pub struct CompiledPolicy {
    pub registry: Arc<PolicyRegistry>,
    pub bindings: Arc<RouteBindings>,
}

impl PolicyConfig {
    pub fn compile(self) -> Result<CompiledPolicy, ConfigError> {
        let mut builder = PolicyRegistry::builder();
        for allow in self.global {
            builder = builder.global(allow);
        }
        for group in self.groups {
            builder = builder.group(
                group.id,
                GroupPolicy {
                    allow_anonymous: group.allow_anonymous,
                    authorize: group.authorize,
                },
            );
        }

        let mut bindings = RouteBindings::default();
        for op in self.operations {
            let cache_ttl = op.cache_ttl();
            bindings
                .bind(
                    op.route.method.clone(),
                    &op.route.path,
                    RouteBinding {
                        operation: op.id.clone(),
                        cache_ttl,
                    },
                )?;
            builder = builder.operation(
                op.id,
                OperationPolicy {
                    group: op.group,
                    allow_anonymous: op.allow_anonymous,
                    authorize: op.authorize,
                },
            );
        }

        Ok(CompiledPolicy {
            registry: Arc::new(builder.build()?),
            bindings: Arc::new(bindings),
        })
    }
}

/// Process settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `WARDEN_LISTEN`
    pub listen: String,
    /// `JWT_SECRET`
    pub jwt_secret: String,
    /// `WARDEN_POLICY_FILE`
    pub policy_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        let listen = std::env::var("WARDEN_LISTEN").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let policy_file = std::env::var_os("WARDEN_POLICY_FILE").map(PathBuf::from);

        Self {
            listen,
            jwt_secret,
            policy_file,
        }
    }

    pub fn load_policy(&self) -> Result<PolicyConfig, ConfigError> {
        match &self.policy_file {
            Some(path) => load_from_file(path),
            None => default_policy(),
        }
    }
}
