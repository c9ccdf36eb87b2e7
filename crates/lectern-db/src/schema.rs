//! SQL schema definitions.

/// Complete schema for the Lectern v1 state database.
///
/// `block_state` holds one row per individual field. The logical key is
/// (scope, scope_id, user_id, field), but it is deliberately not declared
/// UNIQUE: multiple worker processes racing to create the same key may each
/// insert a row, and readers pick the winner by `modified` (latest first).
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS block_state (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    -- Block scope bucket ("definition", "usage", "type", "all") or one of
    -- the relational scopes ("parent", "children").
    scope TEXT NOT NULL,
    -- The definition/usage id the field hangs off; NULL for the "all" bucket.
    scope_id TEXT,
    -- Acting user; NULL for values that are not user-specific.
    user_id TEXT,
    -- Scenario slug and block-type tag decomposed from scope_id, kept as
    -- columns for search and debugging.
    scenario TEXT,
    tag TEXT,
    field TEXT NOT NULL,
    -- JSON-serialized field value.
    value TEXT NOT NULL,
    created INTEGER NOT NULL,
    modified INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_block_state_key
    ON block_state(scope, scope_id, user_id, field);
CREATE INDEX IF NOT EXISTS idx_block_state_scope ON block_state(scope);
CREATE INDEX IF NOT EXISTS idx_block_state_scenario ON block_state(scenario);
CREATE INDEX IF NOT EXISTS idx_block_state_modified ON block_state(modified);
"#;
