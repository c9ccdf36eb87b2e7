//! # lectern-runtime
//!
//! The workbench runtime façade. A [`Runtime`] bundles the two core
//! services — the scenario-aware id manager and the SQLite-backed scoped
//! key-value store — into one explicit context object that is constructed
//! once at process start and passed by handle to everything that needs
//! persistence or identity services.
//!
//! ## Modules
//!
//! - [`fields`] — field declarations and the field-storage layer
//! - [`component`] — the pluggable component capability trait
//! - [`scenario`] — declarative scenario trees, loading, and the catalog
//! - [`config`] — TOML runtime configuration
//! - [`events`] — analytics-style event publishing
//! - [`users`] — the stand-in user service

pub mod component;
pub mod config;
pub mod events;
pub mod fields;
pub mod scenario;
pub mod users;

use std::path::Path;

use rusqlite::Connection;

use lectern_db::state;
use lectern_ids::IdManager;

pub use component::Component;
pub use config::RuntimeConfig;
pub use fields::{FieldData, FieldSpec, ScopeIds};
pub use scenario::{BlockSpec, ScenarioCatalog};
pub use lectern_types::{AsideId, DefinitionId, Scope, ScopeKey, UsageId};

/// Errors surfaced by the runtime façade.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Db(#[from] lectern_db::DbError),

    #[error(transparent)]
    Id(#[from] lectern_ids::IdError),

    #[error(transparent)]
    Key(#[from] lectern_types::KeyError),

    /// A component was asked for a view it does not provide.
    #[error("no such view: {0:?}")]
    NoSuchView(String),

    /// A component was asked for a handler it does not provide.
    #[error("no such handler: {0:?}")]
    NoSuchHandler(String),

    /// A scenario name was registered twice.
    #[error("scenario {0:?} is already registered")]
    DuplicateScenario(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// The workbench runtime context.
///
/// Owns the state database connection and the id manager. Single-threaded
/// by design: the id tables are process-local mutable state with no
/// internal locking, while the backing database itself tolerates sharing
/// across worker processes.
pub struct Runtime {
    conn: Connection,
    ids: IdManager,
    user_id: Option<String>,
    reset_state_on_start: bool,
}

impl Runtime {
    /// Open a runtime from configuration. An empty database path means an
    /// in-memory, throwaway workbench.
    pub fn open(config: &RuntimeConfig) -> Result<Self> {
        let conn = if config.database.path.is_empty() {
            lectern_db::open_memory()?
        } else {
            lectern_db::open(Path::new(&config.database.path))?
        };

        Ok(Runtime {
            conn,
            ids: IdManager::new(),
            user_id: config.workbench.default_user_id.clone(),
            reset_state_on_start: config.workbench.reset_state_on_start,
        })
    }

    /// Open an in-memory runtime with default configuration.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&RuntimeConfig::default())
    }

    /// The state database connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// The id manager (read access).
    pub fn ids(&self) -> &IdManager {
        &self.ids
    }

    /// The id manager (for minting ids and switching scenarios).
    pub fn ids_mut(&mut self) -> &mut IdManager {
        &mut self.ids
    }

    /// The acting user, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Change the acting user for subsequent field access.
    pub fn set_user(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    /// A user service for the acting user.
    pub fn user_service(&self) -> users::UserService {
        users::UserService::new(self.user_id.clone())
    }

    /// Whether scenario initialization should wipe all state rather than
    /// only the children-scoped rows.
    pub fn reset_state_on_start(&self) -> bool {
        self.reset_state_on_start
    }

    /// Build a field accessor for an explicit set of scope ids.
    pub fn field_data(&self, scope_ids: ScopeIds) -> FieldData<'_> {
        FieldData::new(&self.conn, scope_ids)
    }

    /// Build a field accessor for a usage id, resolving its definition and
    /// block type through the id manager and attaching the acting user.
    ///
    /// The usage id is the external handle rendering and handler code
    /// receives; this is how it gets at the block's fields.
    pub fn field_data_for(&self, usage_id: &UsageId) -> Result<FieldData<'_>> {
        let def_id = self.ids.get_definition_id(usage_id)?.clone();
        let block_type = self.ids.get_block_type(&def_id)?.to_string();

        Ok(FieldData::new(
            &self.conn,
            ScopeIds {
                block_type,
                definition_id: def_id,
                usage_id: usage_id.clone(),
                user_id: self.user_id.clone(),
            },
        ))
    }

    /// Render a named view of a component placed at `usage_id`.
    pub fn render(
        &self,
        component: &dyn Component,
        usage_id: &UsageId,
        view: &str,
    ) -> Result<String> {
        let fields = self.field_data_for(usage_id)?;
        component.render(view, &fields)
    }

    /// Invoke a named handler of a component placed at `usage_id`.
    pub fn handle(
        &self,
        component: &dyn Component,
        usage_id: &UsageId,
        action: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let fields = self.field_data_for(usage_id)?;
        component.handle(action, payload, &fields)
    }

    /// Publish an analytics-style event for a usage.
    pub fn publish(&self, usage_id: &UsageId, event_type: &str, data: &serde_json::Value) {
        let block_type = self
            .ids
            .get_definition_id(usage_id)
            .ok()
            .and_then(|def_id| self.ids.get_block_type(def_id).ok())
            .unwrap_or("unknown");
        events::publish(usage_id, block_type, event_type, data);
    }

    /// Delete children-scoped state ahead of a scenario (re)load.
    pub fn prep_for_scenario_loading(&self) -> Result<()> {
        state::prep_for_scenario_loading(&self.conn)?;
        Ok(())
    }

    /// Full environment reset: wipe the store and the id tables.
    pub fn reset(&mut self) -> Result<()> {
        state::clear(&self.conn)?;
        self.ids.clear();
        Ok(())
    }
}
