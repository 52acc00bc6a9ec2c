use pretty_assertions::assert_eq;
use serde_json::json;
use thinmodel_model::{
    Comparator, Cursor, CursorRange, Direction, Filter, ModelError, Query, Sort, Value,
};

// ── Sort ─────────────────────────────────────────────────────────

#[test]
fn sort_parse_direction() {
    assert_eq!(Sort::parse("age"), Sort::ascending("age"));
    assert_eq!(Sort::parse("+age"), Sort::ascending("age"));
    assert_eq!(Sort::parse("-age").direction, Direction::Descending);
    assert_eq!(Sort::parse("-age").field, "age");
}

// ── Comparator ───────────────────────────────────────────────────

#[test]
fn comparator_names_roundtrip() {
    for op in [
        Comparator::Eq,
        Comparator::Ne,
        Comparator::Gt,
        Comparator::Gte,
        Comparator::Lt,
        Comparator::Lte,
        Comparator::In,
    ] {
        assert_eq!(Comparator::parse(op.as_str()), Some(op));
    }
    assert_eq!(Comparator::parse("like"), None);
}

// ── Builder ──────────────────────────────────────────────────────

#[test]
fn builder_sets_every_option() {
    let q = Query::new()
        .filter(Filter::gt("age", 18))
        .sort("-age")
        .limit(5)
        .offset(10)
        .select(["name", "age"])
        .group(["age"])
        .start_at(Cursor::new("offset:10"))
        .end_at(Cursor::new("offset:20"));

    assert_eq!(q.filters, vec![Filter::gt("age", 18)]);
    assert_eq!(q.sort, Some(Sort::descending("age")));
    assert_eq!(q.limit, Some(5));
    assert_eq!(q.offset, Some(10));
    assert_eq!(q.select, vec!["name", "age"]);
    assert_eq!(q.group, vec!["age"]);
    assert_eq!(
        q.cursor,
        Some(CursorRange {
            start: Some(Cursor::new("offset:10")),
            end: Some(Cursor::new("offset:20")),
        })
    );
    assert!(q.kind.is_empty());
}

#[test]
fn filter_constructors() {
    assert_eq!(Filter::eq("a", 1).op, Comparator::Eq);
    assert_eq!(Filter::ne("a", 1).op, Comparator::Ne);
    assert_eq!(Filter::gte("a", 1).op, Comparator::Gte);
    assert_eq!(Filter::lt("a", 1).op, Comparator::Lt);
    assert_eq!(Filter::lte("a", 1).op, Comparator::Lte);
    let f = Filter::is_in("a", vec![Value::from(1), Value::from(2)]);
    assert_eq!(f.op, Comparator::In);
    assert_eq!(f.value.as_collection().map(<[Value]>::len), Some(2));
}

// ── Wire shape ───────────────────────────────────────────────────

#[test]
fn from_json_full_shape() {
    let q = Query::from_json(&json!({
        "kind": "Person",
        "limit": 1,
        "offset": 2,
        "sort": "age",
        "select": "name",
        "group": ["age", "name"],
        "cursor": {"start": "offset:2", "end": 9},
        "filter": {"age": {"gt": 18}}
    }))
    .unwrap();

    assert_eq!(q.kind, "Person");
    assert_eq!(q.limit, Some(1));
    assert_eq!(q.offset, Some(2));
    assert_eq!(q.sort, Some(Sort::ascending("age")));
    assert_eq!(q.select, vec!["name"]);
    assert_eq!(q.group, vec!["age", "name"]);
    let cursor = q.cursor.unwrap();
    assert_eq!(cursor.start, Some(Cursor::new("offset:2")));
    assert_eq!(cursor.end, Some(Cursor::new("9")));
    assert_eq!(q.filters, vec![Filter::gt("age", 18)]);
}

#[test]
fn from_json_equality_and_list_filters() {
    let q = Query::from_json(&json!({
        "filter": [
            {"name": "Arthur"},
            {"age": {"gte": 18, "lt": 65}},
            {"meta": {"nested": true}}
        ]
    }))
    .unwrap();

    assert_eq!(q.filters.len(), 4);
    assert_eq!(q.filters[0], Filter::eq("name", "Arthur"));
    assert!(q.filters.contains(&Filter::gte("age", 18)));
    assert!(q.filters.contains(&Filter::lt("age", 65)));
    assert_eq!(q.filters[3].op, Comparator::Eq);
    assert_eq!(q.filters[3].field, "meta");
}

#[test]
fn from_json_in_operator() {
    let q = Query::from_json(&json!({"filter": {"age": {"in": [1, 2]}}})).unwrap();
    assert_eq!(q.filters, vec![Filter::is_in("age", vec![Value::from(1), Value::from(2)])]);
}

#[test]
fn from_json_empty_object_is_default() {
    assert_eq!(Query::from_json(&json!({})).unwrap(), Query::default());
}

#[test]
fn from_json_rejects_bad_shapes() {
    let cases = [
        json!([]),
        json!({"limit": -1}),
        json!({"limit": "ten"}),
        json!({"sort": 3}),
        json!({"select": [1]}),
        json!({"cursor": "offset:1"}),
        json!({"cursor": {"middle": 1}}),
        json!({"filter": 5}),
        json!({"bogus": true}),
    ];
    for case in cases {
        assert!(
            matches!(Query::from_json(&case), Err(ModelError::InvalidQuery(_))),
            "{case}"
        );
    }
}
