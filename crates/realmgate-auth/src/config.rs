//! Issuance configuration.
//!
//! These types describe the `[auth]` section of the server configuration:
//! issuer identity, signing key source, disclosure policy and the realms
//! registered at startup.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! issuer = "realmgate"
//! conceal_unknown_realm = true
//!
//! [auth.signing]
//! private_key_path = "/etc/realmgate/signing.pem"
//!
//! [[auth.realms]]
//! name = "/services"
//! kind = "service"
//!
//! [[auth.realms.principals]]
//! name = "svc1"
//! password_hashes = ["$argon2id$v=19$..."]
//! scopes = { uid = "svc1" }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root issuance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Value of the `iss` claim.
    pub issuer: String,

    /// Render unknown realms exactly like failed authentication at the HTTP
    /// boundary. Logs and metrics keep the precise reason.
    pub conceal_unknown_realm: bool,

    /// Allow `in_memory` realms. These accept a fixed shared secret and must
    /// stay off in production.
    pub allow_test_realms: bool,

    /// Token signing configuration.
    pub signing: SigningConfig,

    /// Realms registered at startup.
    pub realms: Vec<RealmConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "realmgate".to_string(),
            conceal_unknown_realm: false,
            allow_test_realms: false,
            signing: SigningConfig::default(),
            realms: Vec::new(),
        }
    }
}

/// Token signing configuration.
///
/// Without a key path a fresh P-256 key is generated at startup, so tokens do
/// not survive a restart.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Key identifier published in the JWKS and token headers.
    /// A random UUID is used when unset.
    pub key_id: Option<String>,

    /// Path to a PEM-encoded P-256 private key (PKCS#8 or SEC1).
    pub private_key_path: Option<PathBuf>,
}

/// Backend kind of a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RealmKind {
    /// Fixed-secret test realm.
    InMemory,
    /// Service accounts.
    Service,
    /// Human users.
    User,
}

impl RealmKind {
    /// Returns the configuration name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InMemory => "in_memory",
            Self::Service => "service",
            Self::User => "user",
        }
    }
}

impl fmt::Display for RealmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `[[auth.realms]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RealmConfig {
    /// Hierarchical realm name, e.g. `/services`.
    pub name: String,

    /// Backend kind.
    pub kind: RealmKind,

    /// Scope allow-list for `in_memory` realms. Empty means every scope.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Principals seeded into the credential store.
    #[serde(default)]
    pub principals: Vec<PrincipalConfig>,
}

/// One `[[auth.realms.principals]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrincipalConfig {
    /// Principal name (username or service id).
    pub name: String,

    /// Argon2 PHC hashes of the accepted secrets.
    #[serde(default)]
    pub password_hashes: Vec<String>,

    /// Scope name to claim value.
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Returns `true` if `name` is a well-formed realm name.
#[must_use]
pub fn is_valid_realm_name(name: &str) -> bool {
    name.len() > 1 && name.starts_with('/') && !name.chars().any(char::is_whitespace)
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer is empty
    /// - A realm name is malformed or registered twice
    /// - An `in_memory` realm is configured without `allow_test_realms`
    /// - An `in_memory` realm declares principals
    /// - A principal is declared twice within a realm or has an empty name
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        if let Some(kid) = &self.signing.key_id
            && kid.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue(
                "signing.key_id cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for realm in &self.realms {
            if !is_valid_realm_name(&realm.name) {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid realm name: '{}'. Must start with '/' and contain no whitespace",
                    realm.name
                )));
            }

            if !seen.insert(realm.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "Duplicate realm: '{}'",
                    realm.name
                )));
            }

            if realm.kind == RealmKind::InMemory {
                if !self.allow_test_realms {
                    return Err(ConfigError::InvalidValue(format!(
                        "Realm '{}' is in_memory but auth.allow_test_realms is false",
                        realm.name
                    )));
                }

                if !realm.principals.is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "Realm '{}' is in_memory and cannot declare principals",
                        realm.name
                    )));
                }
            }

            let mut principals = HashSet::new();
            for principal in &realm.principals {
                if principal.name.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "Realm '{}' declares a principal with an empty name",
                        realm.name
                    )));
                }

                if !principals.insert(principal.name.as_str()) {
                    return Err(ConfigError::InvalidValue(format!(
                        "Duplicate principal '{}' in realm '{}'",
                        principal.name, realm.name
                    )));
                }
            }
        }

        Ok(())
    }
}
