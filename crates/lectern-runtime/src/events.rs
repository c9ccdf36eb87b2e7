//! Analytics-style event publishing.
//!
//! The workbench has no event pipeline behind it; published events go to
//! structured logging so plugin authors can watch what their component
//! emits.

use lectern_types::UsageId;

/// Record a component event.
pub fn publish(usage_id: &UsageId, block_type: &str, event_type: &str, data: &serde_json::Value) {
    tracing::info!(
        usage_id = %usage_id,
        block_type,
        event_type,
        data = %data,
        "component event"
    );
}
