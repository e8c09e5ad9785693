//! Realms and their authentication backends.
//!
//! A realm is addressed by a hierarchical name such as `/services` and owns
//! exactly one [`AuthenticationBackend`]. Backends are selected from
//! configuration at startup and held as trait objects by the
//! [`RealmRegistry`].

pub mod backend;
pub mod memory;
pub mod registry;
pub mod service;
pub mod user;

pub use backend::{AuthenticationBackend, DynBackend, RequestedScopes};
pub use memory::{InMemoryRealm, TEST_REALM_SECRET};
pub use registry::{RealmRegistry, RealmRegistryBuilder};
pub use service::ServiceRealm;
pub use user::UserRealm;
