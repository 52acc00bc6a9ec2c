//! The `Person` walkthrough shared by the demo binary and its tests.
//!
//! Each step returns the lines it would print, so the binary only has to
//! write them out.

use anyhow::{Context, Result};
use thinmodel_model::{Entity, FieldDecl, Filter, Kind, Models, Query, TypeTag, Value};
use tracing::info;

/// `Person { name: text, age: number, parent: Person, greet() }`.
pub fn define_person(models: &Models) -> Kind {
    let person = models.create(
        "Person",
        [
            ("name", FieldDecl::from(TypeTag::text())),
            ("age", TypeTag::number().into()),
            ("greet", FieldDecl::method(|e, _| Value::from(greeting(e)))),
        ],
        None,
    );
    // Self-reference needs the kind to exist first.
    person.define_property("parent", &person);
    person
}

fn greeting(e: &Entity) -> String {
    let name = e.text("name").unwrap_or("undefined");
    let age = e
        .number("age")
        .map_or_else(|| "undefined".to_string(), |n| n.to_string());
    format!("Hi, my name is {name} and I'm {age} years old.")
}

/// Calls `greet` on an entity, falling back to the error text.
pub fn greet(entity: &Entity) -> String {
    match entity.call("greet", &[]) {
        Ok(Value::Text(s)) => s,
        Ok(other) => format!("{other:?}"),
        Err(e) => e.to_string(),
    }
}

fn greet_parent(entity: &Entity) -> String {
    match entity.value("parent").and_then(Value::as_entity) {
        Some(parent) => greet(parent),
        None => "no parent".to_string(),
    }
}

/// In-memory part: typed writes, rejected writes, clearing with null and
/// construction-time values.
pub fn run_example(person: &Kind) -> Vec<String> {
    let mut out = Vec::new();

    let father = person
        .instantiate()
        .with("name", "Arthur")
        .with("age", 42);
    let mut son = person
        .instantiate()
        .with("name", "Ron")
        .with("age", 17)
        .with("parent", father.clone());

    out.push(format!("son.greet(): {}", greet(&son)));
    out.push(format!("father.greet(): {}", greet(&father)));
    out.push(format!("son.parent.greet(): {}", greet_parent(&son)));

    // Wrong types are rejected with a warning; previous values stay.
    let _ = son.set("name", 17);
    let _ = son.set("age", "Ron");
    out.push(format!("son.greet(): {}", greet(&son)));

    // Null clears.
    let _ = son.set("name", Value::Null);
    let _ = son.set("age", Value::Null);
    out.push(format!("son.greet(): {}", greet(&son)));

    let daughter = person.build([
        ("name", Value::from("Ginny")),
        ("age", Value::from(15)),
        ("parent", Value::from(father)),
    ]);
    out.push(format!("daughter.greet(): {}", greet(&daughter)));
    out.push(format!("daughter.parent.greet(): {}", greet_parent(&daughter)));

    out
}

/// Storage part: persists the family, queries it, reloads one member and
/// deletes another through whatever adapter `person` resolves to.
pub async fn run_storage(person: &Kind) -> Result<Vec<String>> {
    let mut out = Vec::new();

    let mut father = person.build([("name", Value::from("Arthur")), ("age", Value::from(42))]);
    father.put().await.context("Failed to store father")?;

    let mut ids = Vec::new();
    for (name, age) in [("Bill", 25), ("Percy", 19), ("Ron", 17), ("Ginny", 15)] {
        let mut child = person
            .instantiate()
            .with("name", name)
            .with("age", age)
            .with("parent", father.clone());
        child
            .put()
            .await
            .with_context(|| format!("Failed to store {name}"))?;
        if let Some(id) = child.id() {
            info!("Stored {} as {}", name, id);
            ids.push(id.clone());
        }
    }
    out.push(format!("stored {} people", ids.len() + 1));

    let found = person
        .find(Query::new().filter(Filter::gt("age", 18)).sort("age").limit(1))
        .await
        .context("Query failed")?;
    for adult in found.entities() {
        out.push(format!("youngest adult: {}", greet(adult)));
    }
    if let Some(cursor) = &found.cursor {
        out.push(format!("next page from {cursor}"));
    }

    if let Some(id) = ids.last() {
        let mut reloaded = person.instantiate();
        reloaded.set_id(id.clone());
        reloaded.get().await.context("Reload failed")?;
        out.push(format!("reloaded {id}: {}", greet(&reloaded)));
        out.push(format!("reloaded parent: {}", greet_parent(&reloaded)));

        reloaded.del().await.context("Delete failed")?;
        match reloaded.get().await {
            Err(e) if e.is_not_found() => out.push(format!("after delete: {e}")),
            Err(e) => return Err(e).context("Unexpected reload error"),
            Ok(()) => out.push("after delete: still present".to_string()),
        }
    }

    let remaining = person.find_all().await.context("Query failed")?;
    out.push(format!("remaining: {}", remaining.len()));
    Ok(out)
}
