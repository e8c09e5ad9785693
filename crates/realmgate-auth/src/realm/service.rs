//! Service-account realm.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::config::RealmKind;
use crate::realm::backend::{
    AuthenticationBackend, RequestedScopes, entitled_claims, grant_from_claims, verify_principal,
};
use crate::storage::{CredentialStore, PrincipalRecord};
use crate::token::claims::ExtraClaims;

/// Realm of service accounts kept in a [`CredentialStore`].
///
/// A principal may hold several password hashes at once so its secret can be
/// rotated. Every requested scope the principal holds becomes a claim whose
/// value comes from the principal's scope map.
pub struct ServiceRealm {
    realm: String,
    store: Arc<dyn CredentialStore>,
}

impl ServiceRealm {
    /// Creates the backend for `realm`, reading principals from `store`.
    #[must_use]
    pub fn new(realm: impl Into<String>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            realm: realm.into(),
            store,
        }
    }

    /// Returns the realm this backend serves.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }
}

impl std::fmt::Debug for ServiceRealm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRealm")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthenticationBackend for ServiceRealm {
    fn kind(&self) -> RealmKind {
        RealmKind::Service
    }

    async fn authenticate(
        &self,
        principal: &str,
        secret: &str,
        requested: &RequestedScopes,
    ) -> AuthResult<ExtraClaims> {
        let record = verify_principal(self.store.as_ref(), &self.realm, principal, secret).await?;
        Ok(entitled_claims(&record, requested))
    }

    async fn authorize(
        &self,
        claims: &ExtraClaims,
        requested: &RequestedScopes,
    ) -> AuthResult<Vec<String>> {
        grant_from_claims(claims, requested)
    }

    async fn create(&self, principal: &str, record: PrincipalRecord) -> AuthResult<()> {
        self.store.insert(&self.realm, principal, record).await?;
        tracing::info!(realm = %self.realm, principal, "Service account created");
        Ok(())
    }

    async fn update(&self, principal: &str, record: PrincipalRecord) -> AuthResult<()> {
        self.store.replace(&self.realm, principal, record).await?;
        tracing::info!(realm = %self.realm, principal, "Service account updated");
        Ok(())
    }

    async fn delete(&self, principal: &str) -> AuthResult<bool> {
        let removed = self.store.remove(&self.realm, principal).await?;
        if removed {
            tracing::info!(realm = %self.realm, principal, "Service account deleted");
        }
        Ok(removed)
    }
}
