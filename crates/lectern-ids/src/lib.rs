//! # lectern-ids
//!
//! Scenario-aware identifier management for the Lectern workbench.
//!
//! The [`IdManager`] mints human-traceable ids of the form:
//!
//! ```text
//! {scenario}.{block_type}[.{slug}].d{def #}(.u{usage #})(.{aside_type})
//! ```
//!
//! So an example: `a-little-html.html.d0.u0`. Definition numbering is local
//! to `scenario + block_type (+ slug)`, and usage numbering is local to the
//! definition id, so ids shift around as little as possible when new content
//! or scenarios are added.
//!
//! The manager is process-local mutable state with no internal locking; it
//! is meant for single-threaded use, with external synchronization if a
//! caller ever shares it across threads.

pub mod manager;

pub use manager::IdManager;

/// Errors for id creation and resolution.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The referenced definition id was never created by this manager.
    #[error("no such definition: {0:?}")]
    NoSuchDefinition(String),

    /// The referenced usage id was never created by this manager.
    #[error("no such usage: {0:?}")]
    NoSuchUsage(String),
}

/// Convenience result type for id operations.
pub type Result<T> = std::result::Result<T, IdError>;
