//! Explicit policy registry.
//!
//! Maps operation identifiers to the allow-lists that guard them and to the
//! "allow anonymous" bypass marker, at operation level and at the level of
//! the enclosing group. Everything is registered up front; nothing is
//! discovered at request time.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use warden_core::{GroupId, OperationId};

use crate::AllowList;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("group '{0}' is registered more than once")]
    DuplicateGroup(GroupId),

    #[error("operation '{0}' is registered more than once")]
    DuplicateOperation(OperationId),

    #[error("operation '{operation}' refers to unknown group '{group}'")]
    UnknownGroup { operation: OperationId, group: GroupId },
}

/// Policy attached to a group of operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPolicy {
    pub allow_anonymous: bool,
    pub authorize: Vec<AllowList>,
}

impl GroupPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_anonymous(mut self) -> Self {
        self.allow_anonymous = true;
        self
    }

    pub fn authorize(mut self, allow: AllowList) -> Self {
        self.authorize.push(allow);
        self
    }
}

/// Policy attached to a single operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationPolicy {
    pub group: Option<GroupId>,
    pub allow_anonymous: bool,
    pub authorize: Vec<AllowList>,
}

impl OperationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn allow_anonymous(mut self) -> Self {
        self.allow_anonymous = true;
        self
    }

    pub fn authorize(mut self, allow: AllowList) -> Self {
        self.authorize.push(allow);
        self
    }
}

/// Effective policy of one operation, flattened at build time.
#[derive(Debug, Clone)]
pub struct ResolvedPolicy {
    pub operation: OperationId,
    pub group: Option<GroupId>,
    /// Bypass marker on the operation or on its group.
    pub bypass: bool,
    /// Allow-lists in evaluation order: global, group, operation.
    pub allow_lists: Arc<[AllowList]>,
}

impl ResolvedPolicy {
    /// No allow-list applies; the operation is not protected at all.
    pub fn is_unprotected(&self) -> bool {
        self.allow_lists.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PolicyRegistryBuilder {
    global: Vec<AllowList>,
    groups: Vec<(GroupId, GroupPolicy)>,
    operations: Vec<(OperationId, OperationPolicy)>,
}

impl PolicyRegistryBuilder {
    /// Allow-list applied to every registered operation.
    pub fn global(mut self, allow: AllowList) -> Self {
        self.global.push(allow);
        self
    }

    pub fn group(mut self, id: GroupId, policy: GroupPolicy) -> Self {
        self.groups.push((id, policy));
        self
    }

    pub fn operation(mut self, id: OperationId, policy: OperationPolicy) -> Self {
        self.operations.push((id, policy));
        self
    }

    pub fn build(self) -> Result<PolicyRegistry, RegistryError> {
        let mut groups: HashMap<GroupId, GroupPolicy> = HashMap::new();
        for (id, policy) in self.groups {
            if groups.contains_key(&id) {
                return Err(RegistryError::DuplicateGroup(id));
            }
            groups.insert(id, policy);
        }

        let mut operations: HashMap<OperationId, ResolvedPolicy> = HashMap::new();
        for (id, policy) in self.operations {
            if operations.contains_key(&id) {
                return Err(RegistryError::DuplicateOperation(id));
            }

            let group_policy = match &policy.group {
                Some(group) => Some(groups.get(group).ok_or_else(|| RegistryError::UnknownGroup {
                    operation: id.clone(),
                    group: group.clone(),
                })?),
                None => None,
            };

            let bypass = policy.allow_anonymous || group_policy.is_some_and(|g| g.allow_anonymous);

            let mut allow_lists = self.global.clone();
            if let Some(g) = group_policy {
                allow_lists.extend(g.authorize.iter().cloned());
            }
            allow_lists.extend(policy.authorize);

            operations.insert(
                id.clone(),
                ResolvedPolicy {
                    operation: id,
                    group: policy.group,
                    bypass,
                    allow_lists: allow_lists.into(),
                },
            );
        }

        Ok(PolicyRegistry { operations })
    }
}

/// Registry of every protected operation and its effective policy.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    operations: HashMap<OperationId, ResolvedPolicy>,
}

impl PolicyRegistry {
    pub fn builder() -> PolicyRegistryBuilder {
        PolicyRegistryBuilder::default()
    }

    pub fn resolve(&self, operation: &OperationId) -> Option<&ResolvedPolicy> {
        self.operations.get(operation)
    }

    /// Whether the operation or its group carries the bypass marker.
    pub fn allows_anonymous(&self, operation: &OperationId) -> bool {
        self.resolve(operation).is_some_and(|p| p.bypass)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
