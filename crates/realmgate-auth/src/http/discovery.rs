//! Discovery endpoint (`GET /.well-known/openid-configuration`).

use axum::Json;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::discovery::DiscoveryDocument;
use crate::http::token::TokenError;

/// Header carrying the client-facing scheme behind a proxy.
pub const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Handler for `GET /.well-known/openid-configuration`.
///
/// The issuer URL is derived from the `Host` header and the optional
/// `X-Forwarded-Proto` header. Needs no router state.
pub async fn openid_configuration_handler(headers: HeaderMap) -> Response {
    let Some(host) = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.trim().is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(TokenError::new("invalid_request", "Host header is required")),
        )
            .into_response();
    };

    let scheme = headers.get(FORWARDED_PROTO).and_then(|v| v.to_str().ok());
    let doc = DiscoveryDocument::build(scheme, host);

    ([(header::CONTENT_TYPE, "application/json")], Json(doc)).into_response()
}
