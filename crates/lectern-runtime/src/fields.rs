//! Field declarations and the field-storage layer.
//!
//! Components declare typed fields with a scope and a default; the
//! [`FieldData`] accessor translates a component's field access into a
//! [`ScopeKey`] lookup, delegates to the store, and handles JSON
//! (de)serialization of the payload.

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use lectern_db::{state, DbError};
use lectern_types::{DefinitionId, Scope, ScopeKey, UsageId};

use crate::{Result, RuntimeError};

/// A field declared by a component: name, scope, and default value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub scope: Scope,
    pub default: serde_json::Value,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, scope: Scope, default: serde_json::Value) -> Self {
        FieldSpec {
            name: name.into(),
            scope,
            default,
        }
    }
}

/// The identity context a block's fields are resolved against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeIds {
    pub block_type: String,
    pub definition_id: DefinitionId,
    pub usage_id: UsageId,
    /// Acting user; attached to keys only for user-specific scopes.
    pub user_id: Option<String>,
}

impl ScopeIds {
    /// Build the lookup key for one field in one scope.
    ///
    /// The block-scope id depends on the scope: definition-scoped fields
    /// key on the definition id, type-scoped fields on the block type
    /// verbatim, user-info fields on nothing (they cross all blocks), and
    /// everything else on the usage id.
    pub fn scope_key(&self, scope: Scope, field_name: &str) -> ScopeKey {
        let block_scope_id = match scope {
            Scope::Content => Some(self.definition_id.as_str().to_string()),
            Scope::Preferences | Scope::Configuration => Some(self.block_type.clone()),
            Scope::UserInfo => None,
            Scope::Settings
            | Scope::UserState
            | Scope::UserStateSummary
            | Scope::Parent
            | Scope::Children => Some(self.usage_id.as_str().to_string()),
        };

        let user_id = if scope.is_user_specific() {
            self.user_id.clone()
        } else {
            None
        };

        ScopeKey {
            scope,
            block_scope_id,
            user_id,
            field_name: field_name.to_string(),
        }
    }
}

/// Field accessor for one block: scope ids plus the store connection.
pub struct FieldData<'a> {
    conn: &'a Connection,
    scope_ids: ScopeIds,
}

impl<'a> FieldData<'a> {
    pub fn new(conn: &'a Connection, scope_ids: ScopeIds) -> Self {
        FieldData { conn, scope_ids }
    }

    pub fn scope_ids(&self) -> &ScopeIds {
        &self.scope_ids
    }

    /// Get a field's stored value.
    ///
    /// # Errors
    ///
    /// [`DbError::NotFound`] (wrapped) if the field was never set.
    pub fn get(&self, scope: Scope, field_name: &str) -> Result<serde_json::Value> {
        let key = self.scope_ids.scope_key(scope, field_name);
        Ok(state::get(self.conn, &key)?)
    }

    /// Get a field's stored value, falling back to the declared default.
    pub fn get_or_default(&self, spec: &FieldSpec) -> Result<serde_json::Value> {
        match self.get(spec.scope, &spec.name) {
            Ok(value) => Ok(value),
            Err(RuntimeError::Db(DbError::NotFound(_))) => Ok(spec.default.clone()),
            Err(e) => Err(e),
        }
    }

    /// Get a field deserialized into a concrete type.
    pub fn get_as<T: DeserializeOwned>(&self, scope: Scope, field_name: &str) -> Result<T> {
        let value = self.get(scope, field_name)?;
        serde_json::from_value(value).map_err(|e| RuntimeError::Serialization(e.to_string()))
    }

    /// Set a field's value.
    pub fn set(&self, scope: Scope, field_name: &str, value: &serde_json::Value) -> Result<()> {
        let key = self.scope_ids.scope_key(scope, field_name);
        state::set(self.conn, &key, value)?;
        Ok(())
    }

    /// Set a field from any serializable value.
    pub fn set_as<T: Serialize>(&self, scope: Scope, field_name: &str, value: &T) -> Result<()> {
        let value =
            serde_json::to_value(value).map_err(|e| RuntimeError::Serialization(e.to_string()))?;
        self.set(scope, field_name, &value)
    }

    /// Delete a field's value.
    ///
    /// # Errors
    ///
    /// [`DbError::NotFound`] (wrapped) if the field was never set.
    pub fn delete(&self, scope: Scope, field_name: &str) -> Result<()> {
        let key = self.scope_ids.scope_key(scope, field_name);
        state::delete(self.conn, &key)?;
        Ok(())
    }

    /// Whether a field has a stored value.
    pub fn has(&self, scope: Scope, field_name: &str) -> Result<bool> {
        let key = self.scope_ids.scope_key(scope, field_name);
        Ok(state::has(self.conn, &key)?)
    }
}
