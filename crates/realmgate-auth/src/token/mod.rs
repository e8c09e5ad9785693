//! Token signing and issuance.
//!
//! - [`keys`]: the ES256 signing key, its holder and the published JWKS
//! - [`claims`]: the claim set carried by issued tokens
//! - [`issuer`]: the password-grant issuance flow

pub mod claims;
pub mod issuer;
pub mod keys;

pub use claims::{ClaimSet, ExtraClaims, RESERVED_CLAIMS};
pub use issuer::{ACCESS_TOKEN_LIFETIME, TokenIssuer, TokenRequest, TokenResponse};
pub use keys::{Jwk, Jwks, JwtError, SIGNING_ALGORITHM, SigningKeyHolder, SigningKeyPair};
