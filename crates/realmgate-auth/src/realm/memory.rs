//! Fixed-secret realm for integration testing.
//!
//! Every principal authenticates with [`TEST_REALM_SECRET`]. Configuration
//! only builds this backend when `auth.allow_test_realms` is set.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::RealmKind;
use crate::realm::backend::{AuthenticationBackend, INVALID_CREDENTIALS, RequestedScopes};
use crate::token::claims::ExtraClaims;
use crate::{AuthError, AuthResult};

/// The shared secret accepted by [`InMemoryRealm`].
pub const TEST_REALM_SECRET: &str = "test";

/// Test realm accepting any principal with [`TEST_REALM_SECRET`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryRealm {
    allowed_scopes: Option<BTreeSet<String>>,
}

impl InMemoryRealm {
    /// Creates a realm granting every requested scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts grantable scopes to `scopes`. An empty list keeps the realm
    /// unrestricted.
    #[must_use]
    pub fn with_allowed_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes: BTreeSet<String> = scopes.into_iter().map(Into::into).collect();
        self.allowed_scopes = (!scopes.is_empty()).then_some(scopes);
        self
    }
}

#[async_trait]
impl AuthenticationBackend for InMemoryRealm {
    fn kind(&self) -> RealmKind {
        RealmKind::InMemory
    }

    async fn authenticate(
        &self,
        principal: &str,
        secret: &str,
        _requested: &RequestedScopes,
    ) -> AuthResult<ExtraClaims> {
        if principal.is_empty() || secret != TEST_REALM_SECRET {
            return Err(AuthError::authentication_failed(INVALID_CREDENTIALS));
        }

        let mut claims = ExtraClaims::new();
        claims.insert("uid".to_string(), Value::String(principal.to_string()));
        Ok(claims)
    }

    async fn authorize(
        &self,
        _claims: &ExtraClaims,
        requested: &RequestedScopes,
    ) -> AuthResult<Vec<String>> {
        if let Some(allowed) = &self.allowed_scopes
            && let Some(denied) = requested.iter().find(|scope| !allowed.contains(*scope))
        {
            return Err(AuthError::authorization_denied(format!(
                "scope not granted: {denied}"
            )));
        }

        Ok(requested.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdminOperation;
    use crate::storage::PrincipalRecord;

    fn scopes(values: &[&str]) -> RequestedScopes {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_accepts_shared_secret() {
        let realm = InMemoryRealm::new();
        let claims = realm
            .authenticate("svc1", "test", &scopes(&["uid"]))
            .await
            .unwrap();

        assert_eq!(claims.len(), 1);
        assert_eq!(claims["uid"], "svc1");
    }

    #[tokio::test]
    async fn test_rejects_other_secrets() {
        let realm = InMemoryRealm::new();
        for secret in ["wrong", "", "TEST"] {
            let err = realm
                .authenticate("svc1", secret, &scopes(&[]))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::AuthenticationFailed { .. }));
        }

        assert!(realm.authenticate("", "test", &scopes(&[])).await.is_err());
    }

    #[tokio::test]
    async fn test_grants_everything_without_allow_list() {
        let realm = InMemoryRealm::new();
        let granted = realm
            .authorize(&ExtraClaims::new(), &scopes(&["uid", "write"]))
            .await
            .unwrap();
        assert_eq!(granted, vec!["uid", "write"]);
    }

    #[tokio::test]
    async fn test_allow_list_denies_other_scopes() {
        let realm = InMemoryRealm::new().with_allowed_scopes(["uid"]);

        assert!(realm
            .authorize(&ExtraClaims::new(), &scopes(&["uid"]))
            .await
            .is_ok());

        let err = realm
            .authorize(&ExtraClaims::new(), &scopes(&["uid", "write"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AuthorizationDenied { .. }));
    }

    #[tokio::test]
    async fn test_declines_admin_operations() {
        let realm = InMemoryRealm::new();
        assert!(matches!(
            realm.create("svc1", PrincipalRecord::new()).await.unwrap_err(),
            AuthError::UnsupportedAdminOperation {
                operation: AdminOperation::Create
            }
        ));
        assert!(realm.update("svc1", PrincipalRecord::new()).await.is_err());
        assert!(realm.delete("svc1").await.is_err());
    }
}
