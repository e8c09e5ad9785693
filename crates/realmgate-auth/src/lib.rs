//! # realmgate-auth
//!
//! Realm-based token issuance for the realmgate server.
//!
//! This crate provides:
//! - Realms addressed by hierarchical name, each backed by a pluggable
//!   authentication backend
//! - ES256-signed tokens for the password grant
//! - The published key set and OpenID discovery metadata
//! - Axum handlers for the three public endpoints
//!
//! ## Modules
//!
//! - [`config`] - Issuance configuration and validation
//! - [`realm`] - Backend contract, backend variants and the realm registry
//! - [`storage`] - Credential store contract and the in-process store
//! - [`password`] - Argon2 password hashing
//! - [`token`] - Signing keys, claim sets and the token issuer
//! - [`discovery`] - OpenID discovery document
//! - [`http`] - Axum HTTP handlers
//! - [`error`] - Error types

pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod password;
pub mod realm;
pub mod storage;
pub mod token;

pub use config::{AuthConfig, ConfigError, RealmKind};
pub use discovery::DiscoveryDocument;
pub use error::{AdminOperation, AuthError, ErrorCategory};
pub use http::{JwksState, TokenState, jwks_handler, openid_configuration_handler, token_handler};
pub use realm::{AuthenticationBackend, RealmRegistry};
pub use storage::{CredentialStore, MemoryCredentialStore, PrincipalRecord};
pub use token::{SigningKeyHolder, SigningKeyPair, TokenIssuer, TokenRequest, TokenResponse};

/// Type alias for issuance results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use realmgate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError, RealmKind};
    pub use crate::discovery::DiscoveryDocument;
    pub use crate::error::{AdminOperation, AuthError, ErrorCategory};
    pub use crate::http::{
        JwksState, TokenState, jwks_handler, openid_configuration_handler, token_handler,
    };
    pub use crate::realm::{
        AuthenticationBackend, InMemoryRealm, RealmRegistry, ServiceRealm, UserRealm,
    };
    pub use crate::storage::{CredentialStore, MemoryCredentialStore, PrincipalRecord};
    pub use crate::token::{
        ClaimSet, Jwk, Jwks, SigningKeyHolder, SigningKeyPair, TokenIssuer, TokenRequest,
        TokenResponse,
    };
}
