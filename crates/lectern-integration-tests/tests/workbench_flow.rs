//! Integration test: full workbench lifecycle.
//!
//! Exercises the complete scenario -> identity -> field-state pipeline:
//! 1. Open a runtime from configuration
//! 2. Load a scenario tree through the catalog
//! 3. Render and handle a component against its fields, per user
//! 4. Reload scenarios without accumulating children
//! 5. Reset the environment

use lectern_runtime::{
    BlockSpec, Component, FieldData, FieldSpec, Runtime, RuntimeConfig, RuntimeError,
    Scope, ScenarioCatalog, UsageId,
};
use serde_json::json;

/// A view-counting component in the spirit of the classic workbench demos.
struct ViewCounter;

const VIEWS_FIELD: &str = "views";

impl Component for ViewCounter {
    fn block_type(&self) -> &str {
        "view_counter"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FieldSpec::new(VIEWS_FIELD, Scope::UserStateSummary, json!(0))]
    }

    fn render(
        &self,
        view: &str,
        fields: &FieldData<'_>,
    ) -> Result<String, RuntimeError> {
        match view {
            "student_view" => {
                let spec = FieldSpec::new(VIEWS_FIELD, Scope::UserStateSummary, json!(0));
                let count = fields.get_or_default(&spec)?.as_i64().unwrap_or(0) + 1;
                fields.set(Scope::UserStateSummary, VIEWS_FIELD, &json!(count))?;
                Ok(format!("<span>{count} views</span>"))
            }
            other => Err(RuntimeError::NoSuchView(other.to_string())),
        }
    }
}

fn demo_tree() -> BlockSpec {
    BlockSpec::new("vertical")
        .with_child(BlockSpec::new("view_counter"))
        .with_child(BlockSpec::new("html").with_slug("intro"))
}

#[test]
fn full_workbench_lifecycle() {
    lectern_integration_tests::init_tracing();

    let config = RuntimeConfig::from_toml(
        r#"
        [workbench]
        default_user_id = "bob"
        reset_state_on_start = false
        "#,
    )
    .expect("config");
    let mut rt = Runtime::open(&config).expect("open runtime");
    assert_eq!(rt.user_id(), Some("bob"));
    assert_eq!(
        rt.user_service().current_user().full_name,
        "Lectern User (bob)"
    );

    // Step 1: load the demo scenario.
    let mut catalog = ScenarioCatalog::new();
    catalog.init(&mut rt).expect("init catalog");
    let root = catalog
        .add(&mut rt, "demo.0", "Demo Vertical", &demo_tree())
        .expect("load scenario");
    assert_eq!(root.as_str(), "demo-vertical.vertical.d0.u0");

    // Step 2: the tree shape is persisted through the relational scopes.
    let root_fields = rt.field_data_for(&root).expect("root fields");
    let children: Vec<UsageId> = root_fields
        .get_as(Scope::Children, "children")
        .expect("children");
    assert_eq!(
        children,
        vec![
            UsageId::new("demo-vertical.view_counter.d0.u0"),
            UsageId::new("demo-vertical.html.intro.d0.u0"),
        ]
    );

    // Step 3: render the counter twice; aggregate state is shared across
    // users, so switching the acting user still sees the same count.
    let counter_usage = &children[0];
    let counter = ViewCounter;
    assert_eq!(
        rt.render(&counter, counter_usage, "student_view")
            .expect("first render"),
        "<span>1 views</span>"
    );
    rt.set_user(Some("eve".to_string()));
    assert_eq!(
        rt.render(&counter, counter_usage, "student_view")
            .expect("second render"),
        "<span>2 views</span>"
    );

    rt.publish(counter_usage, "viewed", &json!({ "count": 2 }));

    // Step 4: reloading scenarios drops children rows but keeps other
    // state; the counter's aggregate survives a reload.
    catalog.init(&mut rt).expect("reinit");
    catalog
        .add(&mut rt, "demo.0", "Demo Vertical", &demo_tree())
        .expect("reload scenario");
    let reloaded = catalog.get("demo.0").expect("scenario").root_usage_id.clone();
    let reloaded_children: Vec<UsageId> = rt
        .field_data_for(&reloaded)
        .expect("fields")
        .get_as(Scope::Children, "children")
        .expect("children");
    assert_eq!(reloaded_children.len(), 2);

    let old_counter_fields = rt.field_data_for(counter_usage).expect("old fields");
    assert_eq!(
        old_counter_fields
            .get(Scope::UserStateSummary, VIEWS_FIELD)
            .expect("count survives reload"),
        json!(2)
    );

    // Step 5: full reset wipes everything.
    rt.reset().expect("reset");
    assert!(rt.ids().last_created_usage_id().is_none());
    let fields = rt.field_data(lectern_runtime::ScopeIds {
        block_type: "view_counter".to_string(),
        definition_id: lectern_runtime::DefinitionId::new("demo-vertical.view_counter.d0"),
        usage_id: UsageId::new("demo-vertical.view_counter.d0.u0"),
        user_id: None,
    });
    assert!(!fields
        .has(Scope::UserStateSummary, VIEWS_FIELD)
        .expect("has after reset"));
}

#[test]
fn per_user_state_is_isolated() {
    let mut rt = Runtime::open_in_memory().expect("open");
    rt.ids_mut().set_scenario("iso");
    let def_id = rt.ids_mut().create_definition("html", None);
    let usage_id = rt.ids_mut().create_usage(&def_id).expect("usage");

    rt.set_user(Some("bob".to_string()));
    rt.field_data_for(&usage_id)
        .expect("bob fields")
        .set(Scope::UserState, "bookmarked", &json!(true))
        .expect("set");

    rt.set_user(Some("eve".to_string()));
    assert!(!rt
        .field_data_for(&usage_id)
        .expect("eve fields")
        .has(Scope::UserState, "bookmarked")
        .expect("has"));

    // Preferences cross usages of one type but stay per-user.
    rt.field_data_for(&usage_id)
        .expect("eve fields")
        .set(Scope::Preferences, "font", &json!("serif"))
        .expect("set pref");
    let other_def = rt.ids_mut().create_definition("html", None);
    let other_usage = rt.ids_mut().create_usage(&other_def).expect("usage");
    assert_eq!(
        rt.field_data_for(&other_usage)
            .expect("fields")
            .get(Scope::Preferences, "font")
            .expect("pref crosses usages"),
        json!("serif")
    );
}
