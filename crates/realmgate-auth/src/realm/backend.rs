//! The authentication backend contract.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexSet;
use serde_json::Value;

use crate::config::RealmKind;
use crate::error::AdminOperation;
use crate::password;
use crate::storage::{CredentialStore, PrincipalRecord};
use crate::token::claims::ExtraClaims;
use crate::{AuthError, AuthResult};

/// Scopes requested by a client, in request order without duplicates.
pub type RequestedScopes = IndexSet<String>;

/// Message used for every credential failure. It never says whether the
/// principal exists.
pub(crate) const INVALID_CREDENTIALS: &str = "invalid credentials";

/// A realm's authentication backend.
///
/// Backends may perform blocking or remote I/O and are called without any
/// lock held.
#[async_trait]
pub trait AuthenticationBackend: Send + Sync {
    /// Returns the kind of this backend.
    fn kind(&self) -> RealmKind;

    /// Checks `secret` for `principal` and returns the claims the backend
    /// contributes to the token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthenticationFailed` for an empty secret, an
    /// unknown principal or a mismatched secret.
    async fn authenticate(
        &self,
        principal: &str,
        secret: &str,
        requested: &RequestedScopes,
    ) -> AuthResult<ExtraClaims>;

    /// Decides which of the requested scopes are granted.
    ///
    /// The result is always a subset of `requested`, in request order.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthorizationDenied` if a requested scope exceeds
    /// the principal's entitlement.
    async fn authorize(
        &self,
        claims: &ExtraClaims,
        requested: &RequestedScopes,
    ) -> AuthResult<Vec<String>>;

    /// Creates a principal record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedAdminOperation` unless the backend
    /// manages its own principals.
    async fn create(&self, _principal: &str, _record: PrincipalRecord) -> AuthResult<()> {
        Err(AuthError::unsupported_admin_operation(AdminOperation::Create))
    }

    /// Replaces a principal record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedAdminOperation` unless the backend
    /// manages its own principals.
    async fn update(&self, _principal: &str, _record: PrincipalRecord) -> AuthResult<()> {
        Err(AuthError::unsupported_admin_operation(AdminOperation::Update))
    }

    /// Deletes a principal record. Returns `true` if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedAdminOperation` unless the backend
    /// manages its own principals.
    async fn delete(&self, _principal: &str) -> AuthResult<bool> {
        Err(AuthError::unsupported_admin_operation(AdminOperation::Delete))
    }
}

/// Shared handle to a backend.
pub type DynBackend = Arc<dyn AuthenticationBackend>;

/// Looks `principal` up in `store` and checks `secret` against every stored
/// hash.
pub(crate) async fn verify_principal(
    store: &dyn CredentialStore,
    realm: &str,
    principal: &str,
    secret: &str,
) -> AuthResult<PrincipalRecord> {
    if principal.is_empty() || secret.is_empty() {
        return Err(AuthError::authentication_failed(INVALID_CREDENTIALS));
    }

    let record = store.find(realm, principal).await?;
    if record.is_none() {
        tracing::debug!(realm, "Principal not found");
    }

    // A principal without hashes pays for one verification all the same.
    let hashes = record
        .as_ref()
        .map(|r| r.password_hashes.clone())
        .unwrap_or_default();
    let secret = secret.to_owned();
    let matched = tokio::task::spawn_blocking(move || {
        if hashes.is_empty() {
            password::verify_against_placeholder(&secret);
            false
        } else {
            password::verify_any(&secret, &hashes)
        }
    })
    .await
    .map_err(|e| AuthError::internal(format!("password verification task failed: {e}")))?;

    match record {
        Some(record) if matched => Ok(record),
        _ => Err(AuthError::authentication_failed(INVALID_CREDENTIALS)),
    }
}

/// One claim per requested scope the principal holds.
pub(crate) fn entitled_claims(record: &PrincipalRecord, requested: &RequestedScopes) -> ExtraClaims {
    requested
        .iter()
        .filter_map(|scope| {
            record
                .scopes
                .get(scope)
                .map(|value| (scope.clone(), Value::String(value.clone())))
        })
        .collect()
}

/// Grants the requested scopes if every one of them is present as a claim.
pub(crate) fn grant_from_claims(
    claims: &ExtraClaims,
    requested: &RequestedScopes,
) -> AuthResult<Vec<String>> {
    let missing: Vec<&str> = requested
        .iter()
        .filter(|scope| !claims.contains_key(scope.as_str()))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        return Err(AuthError::authorization_denied(format!(
            "scope not granted: {}",
            missing.join(" ")
        )));
    }

    Ok(requested.iter().cloned().collect())
}
