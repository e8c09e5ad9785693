//! Password hashing for credential-backed realms.
//!
//! Stored credentials are Argon2id hashes in PHC string format. A principal
//! may carry several hashes at once so that a secret can be rotated without
//! a window in which neither the old nor the new value is accepted.
//!
//! # Example
//!
//! ```
//! use realmgate_auth::password::{hash_password, verify_any};
//!
//! let old = hash_password("p455W0rD").unwrap();
//! let new = hash_password("fooBar").unwrap();
//! let stored = vec![old, new];
//!
//! assert!(verify_any("p455W0rD", &stored));
//! assert!(verify_any("fooBar", &stored));
//! assert!(!verify_any("nope", &stored));
//! ```

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a password for storage using Argon2id with a random salt.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a single stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch and `Err` only if the hash is malformed.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if `hash` is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// Returns `true` if `password` matches at least one of `hashes`.
///
/// Fails closed: an empty password, an empty hash list, or hashes that cannot
/// be parsed never match.
#[must_use]
pub fn verify_any(password: &str, hashes: &[String]) -> bool {
    if password.is_empty() {
        return false;
    }

    hashes.iter().any(|hash| match verify_password(password, hash) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed stored password hash");
            false
        }
    })
}

/// Runs one Argon2 verification of `password` against a fixed placeholder
/// hash and discards the outcome.
///
/// Used when no stored hash exists for a principal, so that an unknown
/// principal costs the same as a wrong secret. Returns `true` if the hasher
/// ran.
pub fn verify_against_placeholder(password: &str) -> bool {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();

    let placeholder = PLACEHOLDER.get_or_init(|| match hash_password("realmgate-placeholder") {
        Ok(hash) => Some(hash),
        Err(e) => {
            tracing::error!(error = %e, "Failed to compute placeholder password hash");
            None
        }
    });

    match placeholder {
        Some(hash) => verify_password(password, hash).is_ok(),
        None => false,
    }
}
