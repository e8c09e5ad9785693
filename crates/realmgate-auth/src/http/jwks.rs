//! Key set endpoint (`GET /oauth2/v3/certs`).
//!
//! # Example Response
//!
//! ```json
//! {
//!   "keys": [
//!     {
//!       "kty": "EC",
//!       "kid": "6f1c0d5e-...",
//!       "use": "sig",
//!       "alg": "ES256",
//!       "crv": "P-256",
//!       "x": "base64url-encoded-x",
//!       "y": "base64url-encoded-y"
//!     }
//!   ]
//! }
//! ```

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::token::keys::SigningKeyHolder;

/// State for the JWKS endpoint.
#[derive(Clone)]
pub struct JwksState {
    /// Holder of the published key.
    pub keys: Arc<SigningKeyHolder>,
}

impl JwksState {
    /// Creates a new JWKS state.
    pub fn new(keys: Arc<SigningKeyHolder>) -> Self {
        Self { keys }
    }
}

/// Handler for `GET /oauth2/v3/certs`.
///
/// Short cache lifetime so clients pick up a rotated key quickly.
pub async fn jwks_handler(State(state): State<JwksState>) -> impl IntoResponse {
    let jwks = state.keys.public_key_set();
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        Json(jwks),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::keys::SigningKeyPair;

    fn create_test_holder() -> Arc<SigningKeyHolder> {
        Arc::new(SigningKeyHolder::new(
            SigningKeyPair::generate_with_kid("key-1").unwrap(),
        ))
    }

    #[test]
    fn test_jwks_state_clone() {
        let keys = create_test_holder();
        let state = JwksState::new(keys.clone());
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.keys, &cloned.keys));
        assert!(Arc::ptr_eq(&state.keys, &keys));
    }

    #[tokio::test]
    async fn test_jwks_handler_headers() {
        let state = JwksState::new(create_test_holder());
        let response = jwks_handler(State(state)).await.into_response();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=300"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
