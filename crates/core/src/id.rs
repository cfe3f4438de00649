//! Strongly-typed identifiers for protected operations.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifier of a protected operation (a single handler / action).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperationId(String);

/// Identifier of a group of operations (the enclosing controller / route group).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupId(String);

fn validate(name: &'static str, value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::invalid_id(format!("{name}: must not be empty")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(CoreError::invalid_id(format!(
            "{name}: '{value}' must not contain whitespace"
        )));
    }
    Ok(())
}

macro_rules! impl_name_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a validated identifier.
            pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
                let value = value.into();
                validate($name, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $t {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_name_newtype!(OperationId, "OperationId");
impl_name_newtype!(GroupId, "GroupId");
