//! Process-local credential store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::config::AuthConfig;
use crate::storage::principal::{CredentialStore, PrincipalRecord};
use crate::{AuthError, AuthResult};

/// Credential store kept in a concurrent map keyed by `(realm, principal)`.
///
/// Suitable for configuration-seeded deployments and tests. Entries are
/// cloned out on read so no shard lock outlives a call.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: DashMap<(String, String), PrincipalRecord>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding every principal declared in `[[auth.realms]]`.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let store = Self::new();
        for realm in &config.realms {
            for principal in &realm.principals {
                let record = PrincipalRecord {
                    password_hashes: principal.password_hashes.clone(),
                    scopes: principal.scopes.clone(),
                };
                store.seed(&realm.name, &principal.name, record);
            }
        }
        store
    }

    /// Seeds a record, replacing any existing one.
    pub fn seed(
        &self,
        realm: impl Into<String>,
        principal: impl Into<String>,
        record: PrincipalRecord,
    ) {
        self.records.insert((realm.into(), principal.into()), record);
    }

    /// Number of stored records across all realms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn key(realm: &str, principal: &str) -> (String, String) {
        (realm.to_string(), principal.to_string())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find(&self, realm: &str, principal: &str) -> AuthResult<Option<PrincipalRecord>> {
        Ok(self
            .records
            .get(&Self::key(realm, principal))
            .map(|entry| entry.value().clone()))
    }

    async fn insert(
        &self,
        realm: &str,
        principal: &str,
        record: PrincipalRecord,
    ) -> AuthResult<()> {
        match self.records.entry(Self::key(realm, principal)) {
            Entry::Occupied(_) => Err(AuthError::storage(format!(
                "principal '{principal}' already exists in realm '{realm}'"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn replace(
        &self,
        realm: &str,
        principal: &str,
        record: PrincipalRecord,
    ) -> AuthResult<()> {
        match self.records.get_mut(&Self::key(realm, principal)) {
            Some(mut existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(AuthError::storage(format!(
                "principal '{principal}' not found in realm '{realm}'"
            ))),
        }
    }

    async fn remove(&self, realm: &str, principal: &str) -> AuthResult<bool> {
        Ok(self.records.remove(&Self::key(realm, principal)).is_some())
    }
}
