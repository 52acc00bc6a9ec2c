mod common;

use common::{make_models, make_person, record, StubAdapter};
use std::sync::Arc;
use thinmodel_model::{
    Adapter, AdapterRef, AdapterRegistry, EntityId, FieldDecl, ModelError, Models, ModelsConfig,
    PropertySpec, Query, TypeTag, Value,
};

fn bind_stub(models: &Models, name: &str) -> Arc<StubAdapter> {
    let stub = StubAdapter::new(name);
    models.registry().register(name, stub.clone());
    stub
}

// ── Registry ─────────────────────────────────────────────────────

#[test]
fn register_and_lookup() {
    let registry = AdapterRegistry::new();
    assert!(registry.lookup("stub").is_none());
    registry.register("stub", StubAdapter::new("stub"));
    assert_eq!(registry.lookup("stub").unwrap().name(), "stub");
    assert_eq!(registry.names(), vec!["stub"]);
}

#[test]
fn register_replaces_existing_name() {
    let registry = AdapterRegistry::new();
    assert!(registry.register("db", StubAdapter::new("first")).is_none());
    let previous = registry.register("db", StubAdapter::new("second")).unwrap();
    assert_eq!(previous.name(), "first");
    assert_eq!(registry.lookup("db").unwrap().name(), "second");
}

#[test]
fn unregister_removes() {
    let registry = AdapterRegistry::new();
    registry.register("db", StubAdapter::new("db"));
    assert!(registry.unregister("db").is_some());
    assert!(registry.lookup("db").is_none());
}

#[test]
fn clones_share_state() {
    let registry = AdapterRegistry::new();
    let clone = registry.clone();
    clone.register("db", StubAdapter::new("db"));
    assert!(registry.lookup("db").is_some());
}

#[test]
fn resolve_rejects_empty_and_unknown_names() {
    let registry = AdapterRegistry::new();
    assert!(matches!(
        registry.resolve(AdapterRef::from("")),
        Err(ModelError::AdapterLookupFailed(_))
    ));
    assert!(matches!(
        registry.resolve(AdapterRef::from("missing")),
        Err(ModelError::AdapterLookupFailed(ref n)) if n == "missing"
    ));
}

#[test]
fn global_registry_functions() {
    thinmodel_model::register_adapter("adapter-tests-global", StubAdapter::new("g"));
    assert_eq!(
        thinmodel_model::lookup_adapter("adapter-tests-global").unwrap().name(),
        "g"
    );
    assert!(AdapterRegistry::global().lookup("adapter-tests-global").is_some());
}

// ── use_adapter ──────────────────────────────────────────────────

#[test]
fn use_adapter_by_name() {
    let models = make_models();
    bind_stub(&models, "stub");
    let person = make_person(&models);
    person.use_adapter("stub").unwrap();
    assert_eq!(person.adapter().unwrap().name(), "stub");
}

#[test]
fn use_adapter_by_instance() {
    let models = make_models();
    let person = make_person(&models);
    person.use_adapter(StubAdapter::new("direct")).unwrap();
    assert_eq!(person.own_adapter().unwrap().name(), "direct");
}

#[test]
fn use_unknown_adapter_leaves_binding_unchanged() {
    let models = make_models();
    bind_stub(&models, "stub");
    let person = make_person(&models);

    assert!(person.use_adapter("nonexistent").is_err());
    assert!(person.adapter().is_none());

    person.use_adapter("stub").unwrap();
    assert!(person.use_adapter("").is_err());
    assert_eq!(person.adapter().unwrap().name(), "stub");
}

#[test]
fn rebinding_is_last_write_wins() {
    let models = make_models();
    let person = make_person(&models);
    person.use_adapter(StubAdapter::new("a")).unwrap();
    person.use_adapter(StubAdapter::new("b")).unwrap();
    assert_eq!(person.adapter().unwrap().name(), "b");
}

#[test]
fn descendants_inherit_binding_unless_rebound() {
    let models = make_models();
    let person = make_person(&models);
    let employee = models.create("Employee", Vec::<(&str, FieldDecl)>::new(), Some(&person));
    let intern = models.create("Intern", Vec::<(&str, FieldDecl)>::new(), Some(&employee));

    person.use_adapter(StubAdapter::new("people")).unwrap();
    assert_eq!(intern.adapter().unwrap().name(), "people");
    assert!(intern.own_adapter().is_none());

    employee.use_adapter(StubAdapter::new("staff")).unwrap();
    assert_eq!(intern.adapter().unwrap().name(), "staff");
    assert_eq!(person.adapter().unwrap().name(), "people");
}

#[test]
fn default_adapter_from_config_binds_root() {
    let registry = AdapterRegistry::new();
    registry.register("stub", StubAdapter::new("stub"));
    let models = Models::with_config(
        registry,
        ModelsConfig {
            default_adapter: Some("stub".into()),
            ..Default::default()
        },
    );
    let person = make_person(&models);
    assert_eq!(person.adapter().unwrap().name(), "stub");
}

#[test]
fn unregistered_default_adapter_leaves_root_unbound() {
    let models = Models::with_config(
        AdapterRegistry::new(),
        ModelsConfig {
            default_adapter: Some("memory".into()),
            ..Default::default()
        },
    );
    assert!(models.root().adapter().is_none());
}

// ── put / get / del ──────────────────────────────────────────────

#[tokio::test]
async fn put_assigns_identity_and_cleans() {
    let models = make_models();
    let stub = bind_stub(&models, "stub");
    let person = make_person(&models);
    person.use_adapter("stub").unwrap();

    let mut arthur = person.build([("name", Value::from("Arthur"))]);
    arthur.put().await.unwrap();
    assert_eq!(arthur.id(), Some(&EntityId::Number(1)));
    assert!(!arthur.is_dirty());
    assert_eq!(stub.calls(), vec!["persist:Person"]);
}

#[tokio::test]
async fn put_without_adapter_is_not_ready() {
    let models = make_models();
    let person = make_person(&models);
    let mut e = person.build([("name", Value::from("A"))]);
    let err = e.put().await.unwrap_err();
    assert!(matches!(err, ModelError::AdapterNotReady { ref kind } if kind == "Person"));
    assert!(e.is_dirty());
}

#[tokio::test]
async fn put_with_unconfigured_adapter_is_not_ready() {
    let models = make_models();
    let stub = bind_stub(&models, "stub");
    stub.set_configured(false);
    let person = make_person(&models);
    person.use_adapter("stub").unwrap();

    let mut e = person.instantiate();
    assert!(matches!(e.put().await, Err(ModelError::AdapterNotReady { .. })));
    assert!(matches!(e.del().await, Err(ModelError::AdapterNotReady { .. })));
    assert!(matches!(e.get().await, Err(ModelError::AdapterNotReady { .. })));
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn put_requires_validation() {
    let models = make_models();
    let stub = bind_stub(&models, "stub");
    let account = models.create(
        "Account",
        [("email", FieldDecl::from(PropertySpec::new(TypeTag::text()).required()))],
        None,
    );
    account.use_adapter("stub").unwrap();

    let mut e = account.instantiate();
    let err = e.put().await.unwrap_err();
    assert!(matches!(err, ModelError::ValidationFailed { ref missing, .. } if missing == &["email"]));
    assert!(stub.calls().is_empty());
    assert!(e.id().is_none());
}

#[tokio::test]
async fn get_repopulates_fields() {
    let models = make_models();
    bind_stub(&models, "stub");
    let person = make_person(&models);
    person.use_adapter("stub").unwrap();

    let mut arthur = person.build([("name", Value::from("Arthur")), ("age", Value::from(42))]);
    arthur.put().await.unwrap();

    let mut loaded = person.instantiate();
    loaded.set_id(arthur.id().cloned().unwrap());
    loaded.get().await.unwrap();
    assert_eq!(loaded, arthur);
    assert!(!loaded.is_dirty());
}

#[tokio::test]
async fn del_then_get_is_not_found() {
    let models = make_models();
    bind_stub(&models, "stub");
    let person = make_person(&models);
    person.use_adapter("stub").unwrap();

    let mut arthur = person.build([("name", Value::from("Arthur"))]);
    arthur.put().await.unwrap();
    arthur.del().await.unwrap();

    let err = arthur.get().await.unwrap_err();
    assert!(err.is_not_found());
}

// ── find ─────────────────────────────────────────────────────────

#[tokio::test]
async fn find_converts_records_into_entities() {
    let models = make_models();
    let stub = bind_stub(&models, "stub");
    stub.records.lock().unwrap().extend([
        record("Person", 1, &[("name", Value::from("Arthur"))]),
        record("Person", 2, &[("name", Value::from("Molly"))]),
        record("Pet", 3, &[("name", Value::from("Scabbers"))]),
    ]);
    let person = make_person(&models);
    person.use_adapter("stub").unwrap();

    let found = person.find(Query::new().sort("name")).await.unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.records().is_empty());
    let entities = found.into_entities();
    assert_eq!(entities[0].text("name"), Some("Arthur"));
    assert_eq!(entities[1].id(), Some(&EntityId::Number(2)));
    assert!(entities.iter().all(|e| !e.is_dirty() && e.kind().ptr_eq(&person)));
    assert_eq!(stub.calls(), vec!["query:Person"]);
}

#[tokio::test]
async fn find_stamps_kind_over_caller_value() {
    let models = make_models();
    let stub = bind_stub(&models, "stub");
    let person = make_person(&models);
    person.use_adapter("stub").unwrap();

    let mut query = Query::new();
    query.kind = "Something Else".into();
    person.find(query).await.unwrap();
    assert_eq!(stub.calls(), vec!["query:Person"]);
}

#[tokio::test]
async fn find_with_select_returns_raw_records() {
    let models = make_models();
    let stub = bind_stub(&models, "stub");
    stub.records.lock().unwrap().push(record(
        "Person",
        1,
        &[("name", Value::from("Arthur")), ("age", Value::from(42))],
    ));
    let person = make_person(&models);
    person.use_adapter("stub").unwrap();

    let found = person.find(Query::new().select(["name"])).await.unwrap();
    assert!(found.entities().is_empty());
    assert_eq!(found.records().len(), 1);
    assert_eq!(found.records()[0].get("name"), Some(&Value::from("Arthur")));
    assert!(found.records()[0].get("age").is_none());
}

#[tokio::test]
async fn find_after_failed_use_adapter_never_queries() {
    let models = make_models();
    let person = make_person(&models);
    assert!(person.use_adapter("nonexistent").is_err());

    let err = person.find_all().await.unwrap_err();
    assert!(matches!(err, ModelError::AdapterNotReady { .. }));
}

#[tokio::test]
async fn default_to_model_skips_invalid_fields() {
    let models = make_models();
    let person = make_person(&models);
    let stub = StubAdapter::new("stub");
    let entity = stub.to_model(
        record("Person", 7, &[("name", Value::from(1)), ("age", Value::from(3))]),
        &person,
    );
    assert!(entity.value("name").is_none());
    assert_eq!(entity.number("age"), Some(3.0));
    assert_eq!(entity.id(), Some(&EntityId::Number(7)));
    assert!(!entity.is_dirty());
}
