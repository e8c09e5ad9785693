//! Principal records and the credential store trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;

/// Stored credential state for one principal of one realm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    /// Argon2 PHC hashes of every currently valid secret.
    ///
    /// More than one entry is allowed so a secret can be rotated.
    #[serde(default, alias = "passwordHashes")]
    pub password_hashes: Vec<String>,

    /// Scopes the principal is entitled to, mapped to the claim value that is
    /// emitted when the scope is granted (e.g. `uid -> "svc1"`).
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,
}

impl PrincipalRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stored password hash.
    #[must_use]
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hashes.push(hash.into());
        self
    }

    /// Grants a scope carrying `value` as its claim value.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>, value: impl Into<String>) -> Self {
        self.scopes.insert(scope.into(), value.into());
        self
    }

    /// Returns `true` if the principal holds `scope`.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains_key(scope)
    }
}

/// Storage operations for realm principals.
///
/// Implementations may perform blocking or remote I/O; callers must not hold
/// locks across these calls.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the record of `principal` in `realm`.
    ///
    /// Returns `None` if the principal doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find(&self, realm: &str, principal: &str) -> AuthResult<Option<PrincipalRecord>>;

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns an error if the principal already exists or the storage
    /// operation fails.
    async fn insert(&self, realm: &str, principal: &str, record: PrincipalRecord)
    -> AuthResult<()>;

    /// Replace an existing record.
    ///
    /// # Errors
    ///
    /// Returns an error if the principal doesn't exist or the storage
    /// operation fails.
    async fn replace(
        &self,
        realm: &str,
        principal: &str,
        record: PrincipalRecord,
    ) -> AuthResult<()>;

    /// Remove a record.
    ///
    /// Returns `true` if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove(&self, realm: &str, principal: &str) -> AuthResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_record_builder() {
        let record = PrincipalRecord::new()
            .with_password_hash("$argon2id$a")
            .with_password_hash("$argon2id$b")
            .with_scope("uid", "svc1");

        assert_eq!(record.password_hashes.len(), 2);
        assert!(record.has_scope("uid"));
        assert!(!record.has_scope("admin"));
    }

    #[test]
    fn test_principal_record_deserialize_alias() {
        let json = r#"{"passwordHashes": ["$argon2id$x"], "scopes": {"uid": "svc1"}}"#;
        let record: PrincipalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.password_hashes, vec!["$argon2id$x".to_string()]);
        assert_eq!(record.scopes.get("uid").map(String::as_str), Some("svc1"));
    }
}
