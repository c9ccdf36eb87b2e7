//! The scenario-aware id manager.

use std::collections::HashMap;

use lectern_types::{AsideId, DefinitionId, UsageId};

use crate::{IdError, Result};

/// Mints and resolves definition, usage, and aside identifiers.
///
/// All tables live in process memory; ids created in one process are only
/// reproducible in another through the deterministic construction scheme,
/// never through shared state.
#[derive(Debug, Default)]
pub struct IdManager {
    /// Active scenario prefix for newly created definitions.
    scenario: String,
    /// Next definition sequence per composite prefix
    /// `{scenario}.{block_type}[.{slug}]`. Keying on the full prefix keeps
    /// slugged and unslugged definitions of one block type on separate
    /// counters.
    def_seqs: HashMap<String, u64>,
    /// Next usage sequence per definition id.
    usage_seqs: HashMap<DefinitionId, u64>,
    /// Definition id -> block type.
    definitions: HashMap<DefinitionId, String>,
    /// Usage id -> parent definition id.
    usages: HashMap<UsageId, DefinitionId>,
    /// Aside definition id -> (definition id, aside type).
    aside_defs: HashMap<AsideId, (DefinitionId, String)>,
    /// Aside usage id -> (usage id, aside type).
    aside_usages: HashMap<AsideId, (UsageId, String)>,
    /// Usage ids in creation order.
    usage_log: Vec<UsageId>,
}

impl IdManager {
    /// Create an empty manager with the default (empty) scenario.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace prefix for subsequently created definitions.
    ///
    /// Call this before loading a scenario so its ids are isolated from
    /// other scenarios; previously created ids are unaffected.
    pub fn set_scenario(&mut self, scenario: impl Into<String>) {
        self.scenario = scenario.into();
    }

    /// The active scenario prefix.
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Mint a definition id, storing its block type.
    ///
    /// Sequence numbers strictly increase per distinct
    /// `(scenario, block_type, slug)` prefix and are never reused within
    /// the process lifetime.
    pub fn create_definition(&mut self, block_type: &str, slug: Option<&str>) -> DefinitionId {
        let mut prefix = format!("{}.{}", self.scenario, block_type);
        if let Some(slug) = slug {
            prefix.push('.');
            prefix.push_str(slug);
        }

        let seq = self.def_seqs.entry(prefix.clone()).or_insert(0);
        let def_id = DefinitionId::new(format!("{prefix}.d{seq}"));
        *seq += 1;

        self.definitions
            .insert(def_id.clone(), block_type.to_string());
        tracing::debug!(def_id = %def_id, block_type, "created definition");

        def_id
    }

    /// Look up the block type of a definition.
    ///
    /// # Errors
    ///
    /// [`IdError::NoSuchDefinition`] if the id was never created here.
    pub fn get_block_type(&self, def_id: &DefinitionId) -> Result<&str> {
        self.definitions
            .get(def_id)
            .map(String::as_str)
            .ok_or_else(|| IdError::NoSuchDefinition(def_id.to_string()))
    }

    /// Mint a usage id for a definition, storing the mapping back to it.
    ///
    /// Usage numbering is local to the definition id.
    ///
    /// # Errors
    ///
    /// [`IdError::NoSuchDefinition`] if the definition was never created
    /// here.
    pub fn create_usage(&mut self, def_id: &DefinitionId) -> Result<UsageId> {
        if !self.definitions.contains_key(def_id) {
            return Err(IdError::NoSuchDefinition(def_id.to_string()));
        }

        let seq = self.usage_seqs.entry(def_id.clone()).or_insert(0);
        let usage_id = UsageId::new(format!("{def_id}.u{seq}"));
        *seq += 1;

        self.usages.insert(usage_id.clone(), def_id.clone());
        self.usage_log.push(usage_id.clone());
        tracing::debug!(usage_id = %usage_id, def_id = %def_id, "created usage");

        Ok(usage_id)
    }

    /// Look up the definition a usage was created from.
    ///
    /// # Errors
    ///
    /// [`IdError::NoSuchUsage`] if the id was never created here.
    pub fn get_definition_id(&self, usage_id: &UsageId) -> Result<&DefinitionId> {
        self.usages
            .get(usage_id)
            .ok_or_else(|| IdError::NoSuchUsage(usage_id.to_string()))
    }

    /// Derive and record the aside ids for a definition/usage pair.
    ///
    /// Pure string concatenation; calling again with the same arguments
    /// silently overwrites the previous entries.
    pub fn create_aside(
        &mut self,
        def_id: &DefinitionId,
        usage_id: &UsageId,
        aside_type: &str,
    ) -> (AsideId, AsideId) {
        let aside_def_id = AsideId::new(format!("{def_id}.{aside_type}"));
        let aside_usage_id = AsideId::new(format!("{usage_id}.{aside_type}"));

        self.aside_defs.insert(
            aside_def_id.clone(),
            (def_id.clone(), aside_type.to_string()),
        );
        self.aside_usages.insert(
            aside_usage_id.clone(),
            (usage_id.clone(), aside_type.to_string()),
        );

        (aside_def_id, aside_usage_id)
    }

    /// The aside type recorded for an aside definition id.
    ///
    /// # Errors
    ///
    /// [`IdError::NoSuchDefinition`] if the aside id is unknown.
    pub fn get_aside_type_from_definition(&self, aside_id: &AsideId) -> Result<&str> {
        self.aside_defs
            .get(aside_id)
            .map(|(_, aside_type)| aside_type.as_str())
            .ok_or_else(|| IdError::NoSuchDefinition(aside_id.to_string()))
    }

    /// The aside type recorded for an aside usage id.
    ///
    /// # Errors
    ///
    /// [`IdError::NoSuchUsage`] if the aside id is unknown.
    pub fn get_aside_type_from_usage(&self, aside_id: &AsideId) -> Result<&str> {
        self.aside_usages
            .get(aside_id)
            .map(|(_, aside_type)| aside_type.as_str())
            .ok_or_else(|| IdError::NoSuchUsage(aside_id.to_string()))
    }

    /// The definition id an aside definition id was derived from.
    ///
    /// # Errors
    ///
    /// [`IdError::NoSuchDefinition`] if the aside id is unknown.
    pub fn get_definition_id_from_aside(&self, aside_id: &AsideId) -> Result<&DefinitionId> {
        self.aside_defs
            .get(aside_id)
            .map(|(def_id, _)| def_id)
            .ok_or_else(|| IdError::NoSuchDefinition(aside_id.to_string()))
    }

    /// The usage id an aside usage id was derived from.
    ///
    /// # Errors
    ///
    /// [`IdError::NoSuchUsage`] if the aside id is unknown.
    pub fn get_usage_id_from_aside(&self, aside_id: &AsideId) -> Result<&UsageId> {
        self.aside_usages
            .get(aside_id)
            .map(|(usage_id, _)| usage_id)
            .ok_or_else(|| IdError::NoSuchUsage(aside_id.to_string()))
    }

    /// The most recently created usage id, if any.
    ///
    /// Tracked by an append log, so the answer is chronological even when
    /// sequence numbers cross a digit boundary and lexical order diverges
    /// from creation order.
    pub fn last_created_usage_id(&self) -> Option<&UsageId> {
        self.usage_log.last()
    }

    /// Remove every entry and reset the scenario to the initial state.
    pub fn clear(&mut self) {
        self.def_seqs.clear();
        self.usage_seqs.clear();
        self.definitions.clear();
        self.usages.clear();
        self.aside_defs.clear();
        self.aside_usages.clear();
        self.usage_log.clear();
        self.scenario.clear();
    }
}
