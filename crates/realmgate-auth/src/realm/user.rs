//! Realm of human users.
//!
//! Users are provisioned by an external directory, so this backend only reads
//! the credential store and declines every administrative operation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::AuthResult;
use crate::config::RealmKind;
use crate::realm::backend::{
    AuthenticationBackend, RequestedScopes, entitled_claims, grant_from_claims, verify_principal,
};
use crate::storage::CredentialStore;
use crate::token::claims::ExtraClaims;

/// Claim carrying the username.
pub const UID_CLAIM: &str = "uid";

/// User realm backed by a [`CredentialStore`].
pub struct UserRealm {
    realm: String,
    store: Arc<dyn CredentialStore>,
}

impl UserRealm {
    /// Creates the backend for `realm`, reading principals from `store`.
    #[must_use]
    pub fn new(realm: impl Into<String>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            realm: realm.into(),
            store,
        }
    }
}

impl std::fmt::Debug for UserRealm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRealm")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthenticationBackend for UserRealm {
    fn kind(&self) -> RealmKind {
        RealmKind::User
    }

    async fn authenticate(
        &self,
        principal: &str,
        secret: &str,
        requested: &RequestedScopes,
    ) -> AuthResult<ExtraClaims> {
        let record = verify_principal(self.store.as_ref(), &self.realm, principal, secret).await?;

        let mut claims = entitled_claims(&record, requested);
        // Every user is entitled to its own uid.
        claims
            .entry(UID_CLAIM)
            .or_insert_with(|| Value::String(principal.to_string()));
        Ok(claims)
    }

    async fn authorize(
        &self,
        claims: &ExtraClaims,
        requested: &RequestedScopes,
    ) -> AuthResult<Vec<String>> {
        grant_from_claims(claims, requested)
    }
}
