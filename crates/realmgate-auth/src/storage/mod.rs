//! Credential storage contract for credential-backed realms.
//!
//! The issuance core never owns persistent state. Realms that check secrets
//! against stored credentials do so through the [`CredentialStore`] trait,
//! which an external service implements.
//!
//! # Implementations
//!
//! - [`MemoryCredentialStore`] - process-local store seeded from configuration

pub mod memory;
pub mod principal;

pub use memory::MemoryCredentialStore;
pub use principal::{CredentialStore, PrincipalRecord};
