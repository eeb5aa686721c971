//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract:
//! - Search backends (`OfferSource`)
//! - The persistence collaborator (`OfferStore`)
//! - The secret lookup collaborator (`SecretStore`)

pub mod memory;
pub mod secrets;
pub mod source;
pub mod store;

pub use memory::InMemoryStore;
pub use secrets::{get_secret_safe, EnvSecrets, SecretError, SecretStore};
pub use source::{OfferSource, SourceError};
pub use store::{OfferStore, StoreError};
