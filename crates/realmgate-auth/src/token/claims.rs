//! Claim set assembly.
//!
//! The issuer owns seven reserved claims. Backends contribute extra claims
//! that fill the remaining space but can never displace a reserved one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime};

/// Claims a backend may return in addition to the reserved set.
pub type ExtraClaims = Map<String, Value>;

/// Claim names owned by the issuer.
pub const RESERVED_CLAIMS: [&str; 7] = ["iss", "sub", "exp", "iat", "jti", "scope", "realm"];

/// Returns `true` if `name` is a reserved claim.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_CLAIMS.contains(&name)
}

/// The full claim set of an issued token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Issuer identity.
    pub iss: String,

    /// Subject (the authenticated principal).
    pub sub: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Unique token id.
    pub jti: String,

    /// Granted scopes, in request order.
    pub scope: Vec<String>,

    /// Realm the principal authenticated against.
    pub realm: String,

    /// Backend-supplied claims.
    #[serde(flatten)]
    pub extra: ExtraClaims,
}

impl ClaimSet {
    /// Builds the reserved part of a claim set.
    ///
    /// `jti` is a fresh UUID v4 drawn from the operating system's CSPRNG.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        realm: impl Into<String>,
        scope: Vec<String>,
        issued_at: OffsetDateTime,
        lifetime: Duration,
    ) -> Self {
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + lifetime).unix_timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            scope,
            realm: realm.into(),
            extra: ExtraClaims::new(),
        }
    }

    /// Merges backend claims. Entries named like a reserved claim are dropped.
    #[must_use]
    pub fn with_extra(mut self, extra: ExtraClaims) -> Self {
        for (name, value) in extra {
            if is_reserved(&name) {
                tracing::debug!(claim = %name, "Dropping backend claim that shadows a reserved claim");
                continue;
            }
            self.extra.insert(name, value);
        }
        self
    }
}
