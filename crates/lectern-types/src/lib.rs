//! # lectern-types
//!
//! Shared domain types used across the Lectern workspace: field scopes,
//! scoped lookup keys, and the opaque identifier newtypes minted by the
//! id manager.

pub mod ids;
pub mod key;
pub mod scope;

pub use ids::{AsideId, DefinitionId, UsageId};
pub use key::{KeyAddress, KeyError, ScopeKey};
pub use scope::Scope;

/// Convenience result type for key operations.
pub type Result<T> = std::result::Result<T, KeyError>;
