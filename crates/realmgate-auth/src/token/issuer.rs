//! Password-grant token issuance.
//!
//! [`TokenIssuer::issue`] runs the whole flow for one request:
//!
//! 1. reject any grant type other than `password`
//! 2. resolve the realm (an unknown realm never reaches a backend)
//! 3. authenticate the principal, then authorize the requested scopes
//! 4. assemble the claim set and sign it with the current key
//!
//! Failures are terminal for the request; nothing is retried.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::Instrument;

use crate::realm::{RealmRegistry, RequestedScopes};
use crate::token::claims::ClaimSet;
use crate::token::keys::SigningKeyHolder;
use crate::{AuthError, AuthResult};

/// The only supported grant type.
pub const PASSWORD_GRANT: &str = "password";

/// Lifetime of every issued token.
pub const ACCESS_TOKEN_LIFETIME: Duration = Duration::hours(8);

/// Token type returned to clients.
pub const TOKEN_TYPE: &str = "Bearer";

/// Metric names recorded by the issuer.
pub mod names {
    /// Tokens issued, labelled by realm.
    pub const TOKENS_ISSUED_TOTAL: &str = "realmgate_tokens_issued_total";
    /// Failed token requests, labelled by realm and reason.
    pub const TOKEN_FAILURES_TOTAL: &str = "realmgate_token_failures_total";
}

/// Label used for realms that are not registered.
const UNKNOWN_REALM_LABEL: &str = "unknown";

// ============================================================================
// Request / Response
// ============================================================================

/// Token endpoint request (form-encoded).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Realm name.
    pub realm: Option<String>,

    /// Grant type; must be `password`.
    pub grant_type: Option<String>,

    /// Principal name.
    pub username: Option<String>,

    /// Principal secret.
    pub password: Option<String>,

    /// Space-delimited scope list.
    pub scope: Option<String>,
}

impl TokenRequest {
    /// Creates a password-grant request.
    #[must_use]
    pub fn password(
        realm: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            realm: Some(realm.into()),
            grant_type: Some(PASSWORD_GRANT.to_string()),
            username: Some(username.into()),
            password: Some(password.into()),
            scope: Some(scope.into()),
        }
    }

    /// Splits the scope parameter on whitespace, keeping first occurrences in
    /// order.
    #[must_use]
    pub fn requested_scopes(&self) -> RequestedScopes {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Successful token response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed token.
    pub access_token: String,

    /// Separate identity token. Never issued; serialized as `null`.
    pub id_token: Option<String>,

    /// Always `Bearer`.
    pub token_type: String,

    /// Expiration instant in seconds since the epoch.
    pub expires_in: i64,

    /// Scope string exactly as requested.
    pub scope: String,

    /// Realm the token was issued for.
    pub realm: String,
}

// ============================================================================
// Issuer
// ============================================================================

/// Orchestrates realm lookup, authentication, claims assembly and signing.
#[derive(Clone)]
pub struct TokenIssuer {
    registry: Arc<RealmRegistry>,
    keys: Arc<SigningKeyHolder>,
    issuer: String,
}

impl TokenIssuer {
    /// Creates an issuer stamping `issuer` into the `iss` claim.
    #[must_use]
    pub fn new(
        registry: Arc<RealmRegistry>,
        keys: Arc<SigningKeyHolder>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            keys,
            issuer: issuer.into(),
        }
    }

    /// Returns the realm registry.
    #[must_use]
    pub fn registry(&self) -> &RealmRegistry {
        &self.registry
    }

    /// Returns the signing key holder.
    #[must_use]
    pub fn keys(&self) -> &Arc<SigningKeyHolder> {
        &self.keys
    }

    /// Returns the configured issuer identity.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issues a token for `request`.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if a required parameter is missing
    /// - `UnsupportedGrantType` for any grant other than `password`
    /// - `UnknownRealm` if the realm is not registered
    /// - `AuthenticationFailed` / `AuthorizationDenied` from the backend
    /// - `SigningFailure` if the claim set cannot be signed
    pub async fn issue(&self, request: TokenRequest) -> AuthResult<TokenResponse> {
        let realm_label = match request.realm.as_deref() {
            Some(realm) if self.registry.contains(realm) => realm.to_string(),
            _ => UNKNOWN_REALM_LABEL.to_string(),
        };

        let span = tracing::info_span!(
            "token.issue",
            realm = %realm_label,
            grant_type = request.grant_type.as_deref().unwrap_or_default(),
        );

        let result = self.issue_inner(request).instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(response) => {
                counter!(names::TOKENS_ISSUED_TOTAL, "realm" => realm_label).increment(1);
                tracing::info!(scope = %response.scope, "Token issued");
            }
            Err(e) => {
                counter!(
                    names::TOKEN_FAILURES_TOTAL,
                    "realm" => realm_label,
                    "reason" => e.category().as_str()
                )
                .increment(1);

                if e.is_server_error() {
                    tracing::error!(error = %e, "Token issuance failed");
                } else {
                    tracing::info!(error = %e, category = %e.category(), "Token request rejected");
                }
            }
        });

        result
    }

    async fn issue_inner(&self, request: TokenRequest) -> AuthResult<TokenResponse> {
        let grant_type = request
            .grant_type
            .as_deref()
            .ok_or_else(|| AuthError::invalid_request("grant_type is required"))?;
        if grant_type != PASSWORD_GRANT {
            return Err(AuthError::unsupported_grant_type(grant_type));
        }

        let requested = request.requested_scopes();
        let TokenRequest {
            realm,
            username,
            password,
            scope,
            ..
        } = request;

        let realm = realm.ok_or_else(|| AuthError::invalid_request("realm is required"))?;
        let username =
            username.ok_or_else(|| AuthError::invalid_request("username is required"))?;
        let password =
            password.ok_or_else(|| AuthError::invalid_request("password is required"))?;

        let backend = self.registry.resolve(&realm)?;

        let extra = backend
            .authenticate(&username, &password, &requested)
            .await?;
        let granted = backend.authorize(&extra, &requested).await?;

        let claims = ClaimSet::new(
            &self.issuer,
            username,
            &realm,
            granted,
            OffsetDateTime::now_utc(),
            ACCESS_TOKEN_LIFETIME,
        )
        .with_extra(extra);

        let token = self
            .keys
            .sign(&claims)
            .map_err(|e| AuthError::signing_failure(e.to_string()))?;

        Ok(TokenResponse {
            access_token: token,
            id_token: None,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: claims.exp,
            scope: scope.unwrap_or_default(),
            realm,
        })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("realms", &self.registry.names())
            .field("kid", &self.keys.key_id())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
