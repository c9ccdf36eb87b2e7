//! Scoped lookup keys and their decomposition.
//!
//! A `ScopeKey` addresses exactly one logical stored value:
//! `(scope, block_scope_id, user_id, field_name)`. The store derives its
//! row columns (`scope`, `scope_id`, `user_id`, `scenario`, `tag`) from the
//! key through [`ScopeKey::address`], so creation and lookup always resolve
//! to the same record.

use serde::{Deserialize, Serialize};

use crate::Scope;

/// Errors produced while interpreting a scoped key.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The block scope id does not have the expected dot-delimited shape.
    #[error("malformed block scope id: {id:?}")]
    Malformed {
        /// The offending id.
        id: String,
    },

    /// The scope requires a block scope id but none was supplied.
    #[error("scope '{scope}' requires a block scope id")]
    MissingScopeId {
        /// The scope that was being keyed.
        scope: Scope,
    },

    /// An unrecognized scope name.
    #[error("unknown scope name: {0:?}")]
    UnknownScope(String),
}

/// A lookup key for one field value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    /// Visibility class of the field.
    pub scope: Scope,
    /// Definition or usage id the field hangs off, depending on the scope.
    /// `None` only for the "all" block scope (user data crossing all blocks).
    pub block_scope_id: Option<String>,
    /// Acting user, or `None` for values that are not user-specific.
    pub user_id: Option<String>,
    /// Field name within the component.
    pub field_name: String,
}

/// The storage address derived from a [`ScopeKey`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyAddress {
    /// Block-scope bucket name ("definition", "usage", "type", "all",
    /// "parent", "children").
    pub block_scope_name: &'static str,
    /// Scenario slug extracted from the scope id, when the id carries one.
    pub scenario: Option<String>,
    /// Block-type tag extracted from the scope id, or the id verbatim for
    /// the "type" and "all" buckets.
    pub tag: Option<String>,
}

impl ScopeKey {
    /// Build a key.
    pub fn new(
        scope: Scope,
        block_scope_id: Option<impl Into<String>>,
        user_id: Option<impl Into<String>>,
        field_name: impl Into<String>,
    ) -> Self {
        ScopeKey {
            scope,
            block_scope_id: block_scope_id.map(Into::into),
            user_id: user_id.map(Into::into),
            field_name: field_name.into(),
        }
    }

    /// Decompose the key into its storage address.
    ///
    /// The "type" bucket holds per-type values global to a block class, and
    /// "all" holds user data crossing every scenario and block; neither
    /// follows the `{scenario}.{tag}.…` id convention, so their scope id is
    /// used verbatim as the tag with no scenario. Every other bucket expects
    /// an id of at least three dot-separated parts:
    /// `{scenario}.{tag}.{rest}`.
    ///
    /// # Errors
    ///
    /// - [`KeyError::MissingScopeId`] if a non-"all" bucket has no scope id
    /// - [`KeyError::Malformed`] if the id has fewer than three parts
    pub fn address(&self) -> Result<KeyAddress, KeyError> {
        let block_scope_name = self.scope.block_scope_name();

        if matches!(block_scope_name, "type" | "all") {
            return Ok(KeyAddress {
                block_scope_name,
                scenario: None,
                tag: self.block_scope_id.clone(),
            });
        }

        let id = self
            .block_scope_id
            .as_deref()
            .ok_or(KeyError::MissingScopeId { scope: self.scope })?;

        let mut parts = id.splitn(3, '.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scenario), Some(tag), Some(_rest)) => Ok(KeyAddress {
                block_scope_name,
                scenario: Some(scenario.to_string()),
                tag: Some(tag.to_string()),
            }),
            _ => Err(KeyError::Malformed { id: id.to_string() }),
        }
    }
}
