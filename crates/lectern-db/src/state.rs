//! Scoped key-value store operations.
//!
//! Every function derives the row columns from [`ScopeKey::address`], so a
//! key resolves to the same record on create and on lookup.
//!
//! ## Duplicate rows
//!
//! Record creation is not guarded by a unique constraint, so two worker
//! processes racing to first-write the same key may both insert a row.
//! Single-row-per-key is therefore an eventually-converging expectation,
//! not an enforced invariant: every reader orders candidates by
//! `modified DESC, id DESC` and takes the first, and [`delete`] removes the
//! stale duplicates along with the winner so old values cannot resurface.

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension};

use lectern_types::ScopeKey;

use crate::{DbError, Result};

/// Get the value stored for a key.
///
/// # Errors
///
/// [`DbError::NotFound`] if the field was never set.
pub fn get(conn: &Connection, key: &ScopeKey) -> Result<serde_json::Value> {
    match latest_row(conn, key)? {
        Some((_, value)) => {
            serde_json::from_str(&value).map_err(|e| DbError::Serialization(e.to_string()))
        }
        None => Err(DbError::NotFound(describe(key))),
    }
}

/// Set the value for a key, creating the backing row on first write.
///
/// Last-write-wins at field granularity: an existing winning row is updated
/// in place with a fresh `modified` timestamp.
pub fn set(conn: &Connection, key: &ScopeKey, value: &serde_json::Value) -> Result<()> {
    let serialized =
        serde_json::to_string(value).map_err(|e| DbError::Serialization(e.to_string()))?;
    let now = now_millis();

    match latest_row(conn, key)? {
        Some((row_id, _)) => {
            conn.execute(
                "UPDATE block_state SET value = ?1, modified = ?2 WHERE id = ?3",
                rusqlite::params![serialized, now, row_id],
            )?;
        }
        None => {
            let addr = key.address()?;
            conn.execute(
                "INSERT INTO block_state
                     (scope, scope_id, user_id, scenario, tag, field, value, created, modified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                rusqlite::params![
                    addr.block_scope_name,
                    key.block_scope_id,
                    key.user_id,
                    addr.scenario,
                    addr.tag,
                    key.field_name,
                    serialized,
                    now,
                ],
            )?;
        }
    }

    tracing::trace!(
        scope = %key.scope,
        scope_id = key.block_scope_id.as_deref(),
        field = %key.field_name,
        "set field value"
    );
    Ok(())
}

/// Delete the value stored for a key.
///
/// Removes every row for the logical key, duplicates included.
///
/// # Errors
///
/// [`DbError::NotFound`] if the field was never set.
pub fn delete(conn: &Connection, key: &ScopeKey) -> Result<()> {
    if latest_row(conn, key)?.is_none() {
        return Err(DbError::NotFound(describe(key)));
    }

    let addr = key.address()?;
    conn.execute(
        "DELETE FROM block_state
         WHERE scope = ?1 AND scope_id IS ?2 AND user_id IS ?3 AND field = ?4",
        rusqlite::params![
            addr.block_scope_name,
            key.block_scope_id,
            key.user_id,
            key.field_name,
        ],
    )?;
    Ok(())
}

/// Whether a value exists for a key. Never errors on absence.
pub fn has(conn: &Connection, key: &ScopeKey) -> Result<bool> {
    Ok(latest_row(conn, key)?.is_some())
}

/// Delete every stored row (full environment reset).
pub fn clear(conn: &Connection) -> Result<()> {
    let removed = conn.execute("DELETE FROM block_state", [])?;
    tracing::info!(removed, "cleared block state");
    Ok(())
}

/// Reset state that must not survive a scenario reload.
///
/// Scenario loads overwrite most entries naturally, but child lists are
/// appended to, so stale `children`-scoped rows would accumulate across
/// reloads. Call once before loading scenarios, not once per scenario.
pub fn prep_for_scenario_loading(conn: &Connection) -> Result<()> {
    let removed = conn.execute("DELETE FROM block_state WHERE scope = 'children'", [])?;
    tracing::debug!(removed, "dropped children-scoped state before scenario load");
    Ok(())
}

/// A raw state row, for debugging and admin-style listings.
#[derive(Debug)]
pub struct StateRow {
    pub id: i64,
    pub scope: String,
    pub scope_id: Option<String>,
    pub user_id: Option<String>,
    pub scenario: Option<String>,
    pub tag: Option<String>,
    pub field: String,
    pub value: String,
    pub created: i64,
    pub modified: i64,
}

/// List every row, ordered for display: `(scope_id, scope, user_id)` with
/// the most recently modified first within each key.
pub fn list(conn: &Connection) -> Result<Vec<StateRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, scope, scope_id, user_id, scenario, tag, field, value, created, modified
         FROM block_state
         ORDER BY scope_id, scope, user_id, modified DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(StateRow {
                id: row.get(0)?,
                scope: row.get(1)?,
                scope_id: row.get(2)?,
                user_id: row.get(3)?,
                scenario: row.get(4)?,
                tag: row.get(5)?,
                field: row.get(6)?,
                value: row.get(7)?,
                created: row.get(8)?,
                modified: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// The winning row for a logical key: latest `modified`, then highest `id`.
///
/// Returns the row id and serialized value, or `None` if no row exists.
fn latest_row(conn: &Connection, key: &ScopeKey) -> Result<Option<(i64, String)>> {
    let addr = key.address()?;
    let row = conn
        .query_row(
            "SELECT id, value FROM block_state
             WHERE scope = ?1 AND scope_id IS ?2 AND user_id IS ?3 AND field = ?4
             ORDER BY modified DESC, id DESC
             LIMIT 1",
            rusqlite::params![
                addr.block_scope_name,
                key.block_scope_id,
                key.user_id,
                key.field_name,
            ],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    Ok(row)
}

/// Human-readable key description for error messages.
fn describe(key: &ScopeKey) -> String {
    format!(
        "field {:?} (scope {}, scope_id {:?}, user {:?})",
        key.field_name, key.scope, key.block_scope_id, key.user_id
    )
}

/// Current time as Unix epoch milliseconds.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_types::Scope;
    use serde_json::json;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn user_state_key(field: &str) -> ScopeKey {
        ScopeKey::new(
            Scope::UserState,
            Some("demo.html.d0.u0"),
            Some("bob"),
            field,
        )
    }

    #[test]
    fn test_round_trip() {
        let conn = test_db();
        let key = user_state_key("votes");

        assert!(!has(&conn, &key).expect("has before set"));
        assert!(matches!(get(&conn, &key), Err(DbError::NotFound(_))));

        set(&conn, &key, &json!(7)).expect("set");
        assert!(has(&conn, &key).expect("has after set"));
        assert_eq!(get(&conn, &key).expect("get"), json!(7));

        delete(&conn, &key).expect("delete");
        assert!(!has(&conn, &key).expect("has after delete"));
        assert!(matches!(get(&conn, &key), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_delete_missing_field() {
        let conn = test_db();
        let result = delete(&conn, &user_state_key("never_set"));
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_set_is_idempotent() {
        let conn = test_db();
        let key = user_state_key("votes");

        set(&conn, &key, &json!(7)).expect("first set");
        set(&conn, &key, &json!(7)).expect("second set");

        assert_eq!(get(&conn, &key).expect("get"), json!(7));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM block_state", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_overwrite_updates_in_place() {
        let conn = test_db();
        let key = user_state_key("votes");

        set(&conn, &key, &json!(1)).expect("set 1");
        set(&conn, &key, &json!({"up": 3, "down": 1})).expect("set 2");
        assert_eq!(get(&conn, &key).expect("get"), json!({"up": 3, "down": 1}));
    }

    #[test]
    fn test_fields_are_independent() {
        let conn = test_db();
        set(&conn, &user_state_key("a"), &json!("one")).expect("set a");
        set(&conn, &user_state_key("b"), &json!("two")).expect("set b");

        delete(&conn, &user_state_key("a")).expect("delete a");
        assert!(!has(&conn, &user_state_key("a")).expect("has a"));
        assert_eq!(get(&conn, &user_state_key("b")).expect("get b"), json!("two"));
    }

    #[test]
    fn test_users_are_independent() {
        let conn = test_db();
        let bob = user_state_key("votes");
        let eve = ScopeKey::new(
            Scope::UserState,
            Some("demo.html.d0.u0"),
            Some("eve"),
            "votes",
        );

        set(&conn, &bob, &json!(1)).expect("set bob");
        set(&conn, &eve, &json!(2)).expect("set eve");
        assert_eq!(get(&conn, &bob).expect("get bob"), json!(1));
        assert_eq!(get(&conn, &eve).expect("get eve"), json!(2));
    }

    #[test]
    fn test_type_bucket_key() {
        // Preferences are global to the block type, keyed on the type name
        // verbatim rather than a dotted id.
        let conn = test_db();
        let key = ScopeKey::new(Scope::Preferences, Some("html"), Some("bob"), "theme");
        set(&conn, &key, &json!("dark")).expect("set");
        assert_eq!(get(&conn, &key).expect("get"), json!("dark"));

        let row = &list(&conn).expect("list")[0];
        assert_eq!(row.scope, "type");
        assert_eq!(row.scenario, None);
        assert_eq!(row.tag.as_deref(), Some("html"));
    }

    #[test]
    fn test_all_bucket_key() {
        let conn = test_db();
        let key = ScopeKey::new(Scope::UserInfo, None::<&str>, Some("bob"), "timezone");
        set(&conn, &key, &json!("UTC")).expect("set");
        assert_eq!(get(&conn, &key).expect("get"), json!("UTC"));

        let row = &list(&conn).expect("list")[0];
        assert_eq!(row.scope, "all");
        assert_eq!(row.scope_id, None);
    }

    #[test]
    fn test_malformed_scope_id() {
        let conn = test_db();
        let key = ScopeKey::new(Scope::UserState, Some("not-dotted"), Some("bob"), "x");
        assert!(matches!(set(&conn, &key, &json!(1)), Err(DbError::Key(_))));
        assert!(matches!(get(&conn, &key), Err(DbError::Key(_))));
    }

    #[test]
    fn test_duplicate_rows_resolve_to_latest() {
        // Simulate the get-or-create race: two rows for one logical key.
        let conn = test_db();
        let key = user_state_key("votes");

        conn.execute(
            "INSERT INTO block_state
                 (scope, scope_id, user_id, scenario, tag, field, value, created, modified)
             VALUES ('usage', 'demo.html.d0.u0', 'bob', 'demo', 'html', 'votes', '1', 100, 100)",
            [],
        )
        .expect("first insert");
        conn.execute(
            "INSERT INTO block_state
                 (scope, scope_id, user_id, scenario, tag, field, value, created, modified)
             VALUES ('usage', 'demo.html.d0.u0', 'bob', 'demo', 'html', 'votes', '2', 200, 200)",
            [],
        )
        .expect("second insert");
        let second_id = conn.last_insert_rowid();

        let (winner_id, value) = latest_row(&conn, &key)
            .expect("latest row")
            .expect("row exists");
        assert_eq!(winner_id, second_id);
        assert_eq!(value, "2");
        assert_eq!(get(&conn, &key).expect("get"), json!(2));

        // Writes repair onto the winning row.
        set(&conn, &key, &json!(3)).expect("set");
        assert_eq!(get(&conn, &key).expect("get"), json!(3));

        // Delete removes the garbage duplicate too.
        delete(&conn, &key).expect("delete");
        assert!(!has(&conn, &key).expect("has"));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM block_state", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_duplicate_rows_same_timestamp_tie_break() {
        // When modified timestamps tie, the higher row id (later insert) wins.
        let conn = test_db();
        let key = user_state_key("votes");

        for value in ["\"old\"", "\"new\""] {
            conn.execute(
                "INSERT INTO block_state
                     (scope, scope_id, user_id, scenario, tag, field, value, created, modified)
                 VALUES ('usage', 'demo.html.d0.u0', 'bob', 'demo', 'html', 'votes', ?1, 100, 100)",
                [value],
            )
            .expect("insert");
        }

        assert_eq!(get(&conn, &key).expect("get"), json!("new"));
    }

    #[test]
    fn test_clear() {
        let conn = test_db();
        set(&conn, &user_state_key("a"), &json!(1)).expect("set a");
        set(&conn, &user_state_key("b"), &json!(2)).expect("set b");

        clear(&conn).expect("clear");
        assert!(!has(&conn, &user_state_key("a")).expect("has a"));
        assert!(!has(&conn, &user_state_key("b")).expect("has b"));
    }

    #[test]
    fn test_prep_for_scenario_loading_removes_only_children() {
        let conn = test_db();
        let children = ScopeKey::new(
            Scope::Children,
            Some("demo.seq.d0.u0"),
            None::<&str>,
            "children",
        );
        let parent = ScopeKey::new(
            Scope::Parent,
            Some("demo.html.d0.u0"),
            None::<&str>,
            "parent",
        );
        let settings = ScopeKey::new(
            Scope::Settings,
            Some("demo.html.d0.u0"),
            None::<&str>,
            "title",
        );

        set(&conn, &children, &json!(["demo.html.d0.u0"])).expect("set children");
        set(&conn, &parent, &json!("demo.seq.d0.u0")).expect("set parent");
        set(&conn, &settings, &json!("Hello")).expect("set settings");

        prep_for_scenario_loading(&conn).expect("prep");

        assert!(!has(&conn, &children).expect("children gone"));
        assert!(has(&conn, &parent).expect("parent kept"));
        assert!(has(&conn, &settings).expect("settings kept"));
    }

    #[test]
    fn test_list_ordering() {
        let conn = test_db();
        set(&conn, &user_state_key("votes"), &json!(1)).expect("set");
        let settings = ScopeKey::new(
            Scope::Settings,
            Some("demo.html.d0.u0"),
            None::<&str>,
            "title",
        );
        set(&conn, &settings, &json!("Hello")).expect("set settings");

        let rows = list(&conn).expect("list");
        assert_eq!(rows.len(), 2);
        // Same scope_id and scope bucket; NULL user_id sorts first.
        assert_eq!(rows[0].user_id, None);
        assert_eq!(rows[1].user_id.as_deref(), Some("bob"));
    }
}
