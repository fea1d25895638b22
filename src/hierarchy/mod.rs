//! Consistency rules for the client → location → zone → step tree.
//!
//! Everything here works on in-memory documents; loading and persisting is
//! done by `services::HierarchyService` through a `store::DocumentStore`.

pub mod cascade;
pub mod error;
pub mod identity;
pub mod qr;

pub use cascade::{remove_node, NodePath, Removed};
pub use error::HierarchyError;
pub use identity::{assign_identities, check_unique_identities, ensure_identity, Identified};
pub use qr::QrGenerator;
