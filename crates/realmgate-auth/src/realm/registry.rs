//! Realm name to backend mapping.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AuthConfig, ConfigError, RealmKind, is_valid_realm_name};
use crate::realm::backend::DynBackend;
use crate::realm::{InMemoryRealm, ServiceRealm, UserRealm};
use crate::storage::CredentialStore;
use crate::{AuthError, AuthResult};

/// Immutable registry of realms, built once at startup.
///
/// Lookup is an exact match on the realm name.
#[derive(Clone, Default)]
pub struct RealmRegistry {
    realms: HashMap<String, DynBackend>,
}

impl RealmRegistry {
    /// Starts a new registry.
    #[must_use]
    pub fn builder() -> RealmRegistryBuilder {
        RealmRegistryBuilder::default()
    }

    /// Builds the registry from the `[[auth.realms]]` table.
    ///
    /// Service and user realms read principals from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if a realm name is malformed or duplicated, or if an
    /// `in_memory` realm is configured without `allow_test_realms`.
    pub fn from_config(
        config: &AuthConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();

        for realm in &config.realms {
            let backend: DynBackend = match realm.kind {
                RealmKind::InMemory => {
                    if !config.allow_test_realms {
                        return Err(ConfigError::InvalidValue(format!(
                            "Realm '{}' is in_memory but auth.allow_test_realms is false",
                            realm.name
                        )));
                    }
                    tracing::warn!(realm = %realm.name, "Test realm enabled; it accepts a fixed shared secret");
                    Arc::new(InMemoryRealm::new().with_allowed_scopes(realm.scopes.iter().cloned()))
                }
                RealmKind::Service => Arc::new(ServiceRealm::new(&realm.name, store.clone())),
                RealmKind::User => Arc::new(UserRealm::new(&realm.name, store.clone())),
            };

            builder = builder.register(&realm.name, backend)?;
        }

        Ok(builder.build())
    }

    /// Resolves a realm name to its backend.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownRealm` if no realm has that exact name.
    pub fn resolve(&self, name: &str) -> AuthResult<DynBackend> {
        self.realms
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::unknown_realm(name))
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.realms.contains_key(name)
    }

    /// Registered realm names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.realms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered realms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.realms.len()
    }

    /// Returns `true` if no realm is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.realms.is_empty()
    }
}

impl std::fmt::Debug for RealmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmRegistry")
            .field("realms", &self.names())
            .finish()
    }
}

/// Builder for [`RealmRegistry`].
#[derive(Default)]
pub struct RealmRegistryBuilder {
    realms: HashMap<String, DynBackend>,
}

impl RealmRegistryBuilder {
    /// Registers `backend` under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is malformed or already registered.
    pub fn register(
        mut self,
        name: impl Into<String>,
        backend: DynBackend,
    ) -> Result<Self, ConfigError> {
        let name = name.into();

        if !is_valid_realm_name(&name) {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid realm name: '{name}'. Must start with '/' and contain no whitespace"
            )));
        }

        if self.realms.contains_key(&name) {
            return Err(ConfigError::InvalidValue(format!("Duplicate realm: '{name}'")));
        }

        tracing::debug!(realm = %name, kind = %backend.kind(), "Realm registered");
        self.realms.insert(name, backend);
        Ok(self)
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> RealmRegistry {
        RealmRegistry {
            realms: self.realms,
        }
    }
}
