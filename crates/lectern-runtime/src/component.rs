//! The pluggable component capability.
//!
//! This is the boundary seam the excluded presentation and plugin-loading
//! layers plug into: a component declares typed fields, renders named
//! views, and handles named actions. What a view's markup looks like, or
//! how handlers are routed over HTTP, is entirely the caller's business.

use crate::fields::{FieldData, FieldSpec};
use crate::{Result, RuntimeError};

/// A pluggable content component.
pub trait Component {
    /// The block type name this component registers under.
    fn block_type(&self) -> &str;

    /// The fields this component declares.
    fn fields(&self) -> Vec<FieldSpec> {
        Vec::new()
    }

    /// Render a named view against the block's fields.
    ///
    /// The default implementation knows no views.
    fn render(&self, view: &str, fields: &FieldData<'_>) -> Result<String> {
        let _ = fields;
        Err(RuntimeError::NoSuchView(view.to_string()))
    }

    /// Handle a named action with a JSON payload.
    ///
    /// The default implementation knows no handlers.
    fn handle(
        &self,
        action: &str,
        payload: &serde_json::Value,
        fields: &FieldData<'_>,
    ) -> Result<serde_json::Value> {
        let _ = (payload, fields);
        Err(RuntimeError::NoSuchHandler(action.to_string()))
    }
}
