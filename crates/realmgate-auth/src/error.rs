//! Token issuance error types.
//!
//! This module defines every failure the issuance core can report, together
//! with the classification helpers used by the HTTP boundary and by logging.

use std::fmt;

/// Errors that can occur while resolving realms, authenticating principals
/// and issuing tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The realm name is not registered.
    #[error("Unknown realm: {realm}")]
    UnknownRealm {
        /// The realm name that was requested.
        realm: String,
    },

    /// The token endpoint does not support the requested grant type.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The unsupported grant type.
        grant_type: String,
    },

    /// The presented credential is missing, unknown or does not match.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of why authentication failed.
        message: String,
    },

    /// The requested scopes exceed what the principal is entitled to.
    #[error("Authorization denied: {message}")]
    AuthorizationDenied {
        /// Description of why the scopes were denied.
        message: String,
    },

    /// The backend declines the administrative operation.
    #[error("Operation not supported by this realm: {operation}")]
    UnsupportedAdminOperation {
        /// The declined operation (`create`, `update` or `delete`).
        operation: AdminOperation,
    },

    /// The token could not be signed.
    #[error("Signing failure: {message}")]
    SigningFailure {
        /// Description of the signing failure.
        message: String,
    },

    /// The request is missing a required parameter or is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// An error occurred while reading or writing credential state.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

/// Administrative operations a backend may decline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminOperation {
    /// Create a principal record.
    Create,
    /// Update a principal record.
    Update,
    /// Delete a principal record.
    Delete,
}

impl AdminOperation {
    /// Returns the operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for AdminOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthError {
    /// Creates a new `UnknownRealm` error.
    #[must_use]
    pub fn unknown_realm(realm: impl Into<String>) -> Self {
        Self::UnknownRealm {
            realm: realm.into(),
        }
    }

    /// Creates a new `UnsupportedGrantType` error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    /// Creates a new `AuthenticationFailed` error.
    #[must_use]
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Creates a new `AuthorizationDenied` error.
    #[must_use]
    pub fn authorization_denied(message: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedAdminOperation` error.
    #[must_use]
    pub fn unsupported_admin_operation(operation: AdminOperation) -> Self {
        Self::UnsupportedAdminOperation { operation }
    }

    /// Creates a new `SigningFailure` error.
    #[must_use]
    pub fn signing_failure(message: impl Into<String>) -> Self {
        Self::SigningFailure {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownRealm { .. }
                | Self::UnsupportedGrantType { .. }
                | Self::AuthenticationFailed { .. }
                | Self::AuthorizationDenied { .. }
                | Self::UnsupportedAdminOperation { .. }
                | Self::InvalidRequest { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::SigningFailure { .. }
                | Self::Storage { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownRealm { .. } => ErrorCategory::Realm,
            Self::UnsupportedGrantType { .. } | Self::InvalidRequest { .. } => {
                ErrorCategory::Validation
            }
            Self::AuthenticationFailed { .. } => ErrorCategory::Authentication,
            Self::AuthorizationDenied { .. } => ErrorCategory::Authorization,
            Self::UnsupportedAdminOperation { .. } => ErrorCategory::Administration,
            Self::SigningFailure { .. } => ErrorCategory::Signing,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 style error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::UnknownRealm { .. } => "invalid_realm",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::AuthenticationFailed { .. } => "invalid_grant",
            Self::AuthorizationDenied { .. } => "invalid_scope",
            Self::UnsupportedAdminOperation { .. } => "unsupported_operation",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::SigningFailure { .. }
            | Self::Storage { .. }
            | Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of issuance errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Realm resolution errors.
    Realm,
    /// Credential verification errors.
    Authentication,
    /// Scope entitlement errors.
    Authorization,
    /// Request validation errors.
    Validation,
    /// Declined administrative operations.
    Administration,
    /// Key or signature errors.
    Signing,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Internal server errors.
    Internal,
}

impl ErrorCategory {
    /// Returns the category label used in logs and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realm => "realm",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Validation => "validation",
            Self::Administration => "administration",
            Self::Signing => "signing",
            Self::Infrastructure => "infrastructure",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::unknown_realm("/nowhere");
        assert_eq!(err.to_string(), "Unknown realm: /nowhere");

        let err = AuthError::unsupported_admin_operation(AdminOperation::Delete);
        assert_eq!(
            err.to_string(),
            "Operation not supported by this realm: delete"
        );

        let err = AuthError::signing_failure("key missing");
        assert_eq!(err.to_string(), "Signing failure: key missing");
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::unknown_realm("/x").is_client_error());
        assert!(AuthError::authentication_failed("bad").is_client_error());
        assert!(AuthError::authorization_denied("scope").is_client_error());
        assert!(AuthError::unsupported_grant_type("implicit").is_client_error());

        let err = AuthError::signing_failure("corrupt");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());

        assert!(AuthError::storage("down").is_server_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::unknown_realm("/x").category(),
            ErrorCategory::Realm
        );
        assert_eq!(
            AuthError::authentication_failed("x").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::authorization_denied("x").category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            AuthError::unsupported_admin_operation(AdminOperation::Create).category(),
            ErrorCategory::Administration
        );
        assert_eq!(
            AuthError::signing_failure("x").category(),
            ErrorCategory::Signing
        );
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(
            AuthError::unknown_realm("/x").oauth_error_code(),
            "invalid_realm"
        );
        assert_eq!(
            AuthError::unsupported_grant_type("code").oauth_error_code(),
            "unsupported_grant_type"
        );
        assert_eq!(
            AuthError::authentication_failed("x").oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::authorization_denied("x").oauth_error_code(),
            "invalid_scope"
        );
        assert_eq!(
            AuthError::signing_failure("x").oauth_error_code(),
            "server_error"
        );
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Realm.to_string(), "realm");
        assert_eq!(ErrorCategory::Signing.to_string(), "signing");
        assert_eq!(AdminOperation::Update.to_string(), "update");
    }
}
