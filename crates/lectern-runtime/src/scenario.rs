//! Declarative scenario trees and the scenario catalog.
//!
//! A scenario is a named, independently-numbered tree of usages. Loading
//! one mints a definition and a usage per node and persists the tree shape
//! through the relational scopes: each child's `parent` field points at its
//! parent usage, and each parent's `children` field accumulates its child
//! usage ids in order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use lectern_types::UsageId;

use crate::{Result, Runtime, RuntimeError, Scope};

/// One node of a declarative scenario tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockSpec {
    pub block_type: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub children: Vec<BlockSpec>,
}

impl BlockSpec {
    pub fn new(block_type: impl Into<String>) -> Self {
        BlockSpec {
            block_type: block_type.into(),
            slug: None,
            children: Vec::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_child(mut self, child: BlockSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A loaded scenario: its description and the root usage to render.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub description: String,
    pub root_usage_id: UsageId,
}

/// Named collection of loaded scenarios.
#[derive(Debug, Default)]
pub struct ScenarioCatalog {
    scenarios: BTreeMap<String, Scenario>,
}

impl ScenarioCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset state ahead of (re)loading every scenario.
    ///
    /// Call once before the loading pass, not once per scenario. Honors the
    /// runtime's reset-on-start setting: either wipe the store entirely or
    /// drop only the append-only children rows.
    pub fn init(&mut self, rt: &mut Runtime) -> Result<()> {
        self.scenarios.clear();
        if rt.reset_state_on_start() {
            rt.reset()?;
        } else {
            rt.prep_for_scenario_loading()?;
        }
        Ok(())
    }

    /// Load a scenario tree and register it under `name`.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::DuplicateScenario`] if the name is already taken.
    pub fn add(
        &mut self,
        rt: &mut Runtime,
        name: &str,
        description: &str,
        root: &BlockSpec,
    ) -> Result<UsageId> {
        if self.scenarios.contains_key(name) {
            return Err(RuntimeError::DuplicateScenario(name.to_string()));
        }

        rt.ids_mut().set_scenario(slugify(description));
        let root_usage_id = load_tree(rt, root, None)?;

        tracing::info!(name, root = %root_usage_id, "loaded scenario");
        self.scenarios.insert(
            name.to_string(),
            Scenario {
                description: description.to_string(),
                root_usage_id: root_usage_id.clone(),
            },
        );
        Ok(root_usage_id)
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Scenario> {
        self.scenarios.remove(name)
    }

    /// Scenario names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Load one tree node and its descendants, linking parent and children.
fn load_tree(rt: &mut Runtime, spec: &BlockSpec, parent: Option<&UsageId>) -> Result<UsageId> {
    let def_id = rt
        .ids_mut()
        .create_definition(&spec.block_type, spec.slug.as_deref());
    let usage_id = rt.ids_mut().create_usage(&def_id)?;

    if let Some(parent_id) = parent {
        let fields = rt.field_data_for(&usage_id)?;
        fields.set(Scope::Parent, "parent", &json!(parent_id))?;
    }

    for child in &spec.children {
        let child_usage = load_tree(rt, child, Some(&usage_id))?;
        append_child(rt, &usage_id, &child_usage)?;
    }

    Ok(usage_id)
}

/// Append a child usage to a parent's children list.
fn append_child(rt: &Runtime, parent: &UsageId, child: &UsageId) -> Result<()> {
    let fields = rt.field_data_for(parent)?;
    let mut children: Vec<UsageId> = match fields.get(Scope::Children, "children") {
        Ok(value) => serde_json::from_value(value)
            .map_err(|e| RuntimeError::Serialization(e.to_string()))?,
        Err(RuntimeError::Db(lectern_db::DbError::NotFound(_))) => Vec::new(),
        Err(e) => return Err(e),
    };
    children.push(child.clone());
    fields.set_as(Scope::Children, "children", &children)
}

/// Lowercase a description into a scenario slug: alphanumerics kept, runs
/// of anything else collapsed to single hyphens.
pub fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    let mut pending_hyphen = false;
    for ch in description.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
