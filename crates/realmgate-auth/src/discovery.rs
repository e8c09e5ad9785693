//! OpenID discovery metadata.
//!
//! The document is a pure function of the request's scheme and host. Nothing
//! is cached or persisted.

use serde::{Deserialize, Serialize};

use crate::token::claims::RESERVED_CLAIMS;
use crate::token::issuer::PASSWORD_GRANT;
use crate::token::keys::SIGNING_ALGORITHM_NAME;

/// Path of the token endpoint.
pub const TOKEN_ENDPOINT_PATH: &str = "/oauth2/access_token";

/// Path of the key set endpoint.
pub const JWKS_PATH: &str = "/oauth2/v3/certs";

/// Path of the discovery document.
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// Scheme used when the caller gives no forwarded-protocol hint.
pub const DEFAULT_SCHEME: &str = "http";

/// OpenID Provider metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// Base URL of this service.
    pub issuer: String,

    /// Absolute URL of the token endpoint.
    pub token_endpoint: String,

    /// Absolute URL of the JWKS.
    pub jwks_uri: String,

    /// Supported grant types.
    pub grant_types_supported: Vec<String>,

    /// Supported response types.
    pub response_types_supported: Vec<String>,

    /// Supported subject identifier types.
    pub subject_types_supported: Vec<String>,

    /// Token signing algorithms.
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// Client authentication methods at the token endpoint.
    pub token_endpoint_auth_methods_supported: Vec<String>,

    /// Claims carried by every token.
    pub claims_supported: Vec<String>,
}

impl DiscoveryDocument {
    /// Builds the document for a request that reached `host` over `scheme`.
    ///
    /// A missing or blank scheme falls back to [`DEFAULT_SCHEME`]. When a
    /// proxy chain supplies several comma-separated values, the first one is
    /// used.
    #[must_use]
    pub fn build(scheme: Option<&str>, host: &str) -> Self {
        let scheme = scheme
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCHEME);
        let base = format!("{scheme}://{}", host.trim().trim_end_matches('/'));

        Self {
            token_endpoint: format!("{base}{TOKEN_ENDPOINT_PATH}"),
            jwks_uri: format!("{base}{JWKS_PATH}"),
            issuer: base,
            grant_types_supported: vec![PASSWORD_GRANT.to_string()],
            response_types_supported: vec!["token".to_string()],
            subject_types_supported: vec!["public".to_string()],
            id_token_signing_alg_values_supported: vec![SIGNING_ALGORITHM_NAME.to_string()],
            token_endpoint_auth_methods_supported: vec!["client_secret_basic".to_string()],
            claims_supported: RESERVED_CLAIMS.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}
