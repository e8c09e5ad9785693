//! Token endpoint (`POST /oauth2/access_token`).
//!
//! ```ignore
//! POST /oauth2/access_token
//! Content-Type: application/x-www-form-urlencoded
//!
//! realm=/services&grant_type=password&username=svc1&password=...&scope=uid
//! ```

use axum::extract::rejection::FormRejection;
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::token::issuer::{TokenIssuer, TokenRequest, TokenResponse};

/// State required for the token endpoint.
#[derive(Clone)]
pub struct TokenState {
    issuer: TokenIssuer,
    conceal_unknown_realm: bool,
}

impl TokenState {
    /// Creates a new token state.
    pub fn new(issuer: TokenIssuer) -> Self {
        Self {
            issuer,
            conceal_unknown_realm: false,
        }
    }

    /// Renders unknown realms exactly like failed authentication.
    #[must_use]
    pub fn with_conceal_unknown_realm(mut self, conceal: bool) -> Self {
        self.conceal_unknown_realm = conceal;
        self
    }

    /// Returns the issuer behind this endpoint.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

/// OAuth 2.0 style error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenError {
    /// Error code.
    pub error: String,

    /// Human-readable error description.
    pub error_description: String,
}

impl TokenError {
    /// Creates a new error body.
    #[must_use]
    pub fn new(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            error_description: description.into(),
        }
    }
}

/// Token endpoint handler.
///
/// Accepts `application/x-www-form-urlencoded` bodies with `realm`,
/// `grant_type`, `username`, `password` and `scope`.
pub async fn token_handler(
    State(state): State<TokenState>,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Response {
    let request = match form {
        Ok(Form(request)) => request,
        Err(rejection) => {
            return token_error_response(
                &AuthError::invalid_request(rejection.body_text()),
                state.conceal_unknown_realm,
            );
        }
    };

    match state.issuer.issue(request).await {
        Ok(response) => token_success_response(response),
        Err(e) => token_error_response(&e, state.conceal_unknown_realm),
    }
}

/// Build a successful token response.
fn token_success_response(response: TokenResponse) -> Response {
    (
        StatusCode::OK,
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
        ],
        Json(response),
    )
        .into_response()
}

/// Build an error response for the token endpoint.
fn token_error_response(error: &AuthError, conceal_unknown_realm: bool) -> Response {
    let (status, body) = error_status_and_body(error, conceal_unknown_realm);

    (
        status,
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
        ],
        Json(body),
    )
        .into_response()
}

fn error_status_and_body(error: &AuthError, conceal_unknown_realm: bool) -> (StatusCode, TokenError) {
    let concealed = AuthError::authentication_failed("invalid credentials");
    let error = match error {
        AuthError::UnknownRealm { .. } if conceal_unknown_realm => &concealed,
        other => other,
    };

    let status = match error {
        AuthError::InvalidRequest { .. }
        | AuthError::UnsupportedGrantType { .. }
        | AuthError::UnknownRealm { .. } => StatusCode::BAD_REQUEST,
        AuthError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
        AuthError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
        AuthError::UnsupportedAdminOperation { .. } => StatusCode::NOT_IMPLEMENTED,
        AuthError::SigningFailure { .. }
        | AuthError::Storage { .. }
        | AuthError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // Server-side details stay in the logs.
    let description = if error.is_server_error() {
        "internal server error".to_string()
    } else {
        error.to_string()
    };

    (status, TokenError::new(error.oauth_error_code(), description))
}
