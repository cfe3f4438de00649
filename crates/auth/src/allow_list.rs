//! Allow-lists attached to protected operations.
//!
//! Both dimensions are configured as comma-separated strings (`users`,
//! `roles`) and parsed once at construction. An empty dimension means
//! "no restriction" for that dimension.

use serde::{Deserialize, Serialize};

use crate::Role;

/// Split a comma-separated configuration string.
///
/// Each piece is trimmed and empty pieces are discarded. Malformed input only
/// ever yields fewer entries; there is no error case.
pub fn split_list(original: &str) -> Vec<String> {
    original
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Permitted user names and roles for a protected operation.
///
/// Immutable once constructed, so a single instance can be consulted from
/// any number of concurrent requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawAllowList", into = "RawAllowList")]
pub struct AllowList {
    users_raw: String,
    roles_raw: String,
    /// Lowercased, deduplicated.
    users: Vec<String>,
    /// Configured order, deduplicated.
    roles: Vec<Role>,
}

impl AllowList {
    pub fn new(users: &str, roles: &str) -> Self {
        let mut parsed_users: Vec<String> = Vec::new();
        for user in split_list(users) {
            let user = user.to_lowercase();
            if !parsed_users.contains(&user) {
                parsed_users.push(user);
            }
        }

        let mut parsed_roles: Vec<Role> = Vec::new();
        for role in split_list(roles) {
            if !parsed_roles.iter().any(|r| r.as_str() == role) {
                parsed_roles.push(Role::new(role));
            }
        }

        Self {
            users_raw: users.to_string(),
            roles_raw: roles.to_string(),
            users: parsed_users,
            roles: parsed_roles,
        }
    }

    /// Only the authentication check applies.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn users(users: &str) -> Self {
        Self::new(users, "")
    }

    pub fn roles(roles: &str) -> Self {
        Self::new("", roles)
    }

    /// The configured user string, as given.
    pub fn users_config(&self) -> &str {
        &self.users_raw
    }

    /// The configured role string, as given.
    pub fn roles_config(&self) -> &str {
        &self.roles_raw
    }

    pub fn allowed_users(&self) -> &[String] {
        &self.users
    }

    pub fn allowed_roles(&self) -> &[Role] {
        &self.roles
    }

    /// Case-insensitive user membership. Always true for an empty user list.
    pub fn permits_user(&self, name: &str) -> bool {
        if self.users.is_empty() {
            return true;
        }
        let name = name.to_lowercase();
        self.users.iter().any(|u| *u == name)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.users.is_empty() && self.roles.is_empty()
    }
}

/// Equality is by the parsed sets, so how the configured strings were
/// spelled or ordered does not matter.
impl PartialEq for AllowList {
    fn eq(&self, other: &Self) -> bool {
        self.users.len() == other.users.len()
            && self.roles.len() == other.roles.len()
            && self.users.iter().all(|u| other.users.contains(u))
            && self.roles.iter().all(|r| other.roles.contains(r))
    }
}

impl Eq for AllowList {}

/// Wire shape of an allow-list in configuration files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAllowList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    users: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    roles: Option<String>,
}

impl From<RawAllowList> for AllowList {
    fn from(raw: RawAllowList) -> Self {
        AllowList::new(
            raw.users.as_deref().unwrap_or_default(),
            raw.roles.as_deref().unwrap_or_default(),
        )
    }
}

impl From<AllowList> for RawAllowList {
    fn from(list: AllowList) -> Self {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        Self {
            users: non_empty(list.users_raw),
            roles: non_empty(list.roles_raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn split_trims_and_drops_empty_pieces() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
        assert!(split_list(" , ,").is_empty());
    }

    #[test]
    fn users_are_matched_case_insensitively() {
        let list = AllowList::users("Alice, carol");
        assert!(list.permits_user("alice"));
        assert!(list.permits_user("CAROL"));
        assert!(!list.permits_user("bob"));
    }

    #[test]
    fn raw_configuration_is_preserved() {
        let list = AllowList::new(" alice ", "Admin,Editor");
        assert_eq!(list.users_config(), " alice ");
        assert_eq!(list.roles_config(), "Admin,Editor");
        assert_eq!(list.allowed_users(), ["alice".to_string()]);
        assert_eq!(list.allowed_roles().len(), 2);
    }

    #[test]
    fn duplicates_collapse() {
        let list = AllowList::new("bob,BOB", "admin,admin");
        assert_eq!(list.allowed_users().len(), 1);
        assert_eq!(list.allowed_roles().len(), 1);
    }

    #[test]
    fn equality_ignores_configured_spelling() {
        assert_eq!(AllowList::new(" a ", ""), AllowList::new("a", ""));
        assert_eq!(AllowList::new("Bob,alice", "x, y"), AllowList::new("alice, bob, BOB", "y,x"));
        assert_eq!(AllowList::new(" , ", ","), AllowList::unrestricted());
        assert_ne!(AllowList::users("a"), AllowList::roles("a"));
        assert_ne!(AllowList::roles("Admin"), AllowList::roles("admin"));
    }

    #[test]
    fn deserializes_from_config_shape() {
        let list: AllowList = serde_json::from_str(r#"{ "roles": "admin, superuser" }"#).unwrap();
        assert!(list.allowed_users().is_empty());
        let roles: Vec<&str> = list.allowed_roles().iter().map(|r| r.as_str()).collect();
        assert_eq!(roles, vec!["admin", "superuser"]);

        let empty: AllowList = serde_json::from_str("{}").unwrap();
        assert!(empty.is_unrestricted());

        assert!(serde_json::from_str::<AllowList>(r#"{ "rolez": "admin" }"#).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 500,
            ..ProptestConfig::default()
        })]

        /// Property: surrounding whitespace and empty pieces never change the result.
        #[test]
        fn split_is_whitespace_insensitive(
            pieces in proptest::collection::vec("[a-z]{1,8}", 0..6),
            pad in "[ \t]{0,3}"
        ) {
            let padded = pieces
                .iter()
                .map(|p| format!("{pad}{p}{pad}"))
                .collect::<Vec<_>>()
                .join(",,");
            prop_assert_eq!(split_list(&padded), pieces.clone());
        }

        /// Property: re-parsing the joined output is a no-op.
        #[test]
        fn split_is_idempotent(input in "[a-z ,]{0,40}") {
            let once = split_list(&input);
            let twice = split_list(&once.join(","));
            prop_assert_eq!(once, twice);
        }
    }
}
