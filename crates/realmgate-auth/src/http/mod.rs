//! Axum handlers for the token, key set and discovery endpoints.
//!
//! Routing is left to the server; each handler takes its own state type so
//! routers can mount them independently.

pub mod discovery;
pub mod jwks;
pub mod token;

pub use discovery::openid_configuration_handler;
pub use jwks::{JwksState, jwks_handler};
pub use token::{TokenError, TokenState, token_handler};
