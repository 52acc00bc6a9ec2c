//! Query evaluation over in-memory records: filter predicates, ordering,
//! grouping and projection.

use std::cmp::Ordering;
use thinmodel_model::{Comparator, Direction, Filter, Record, Sort, Value};

/// Whether `record` satisfies every filter.
pub fn matches(record: &Record, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| test(record.get(&f.field), f.op, &f.value))
}

/// Applies one comparator. An absent field equals only `Value::Null` and
/// fails every ordering comparison; values of different types never order.
pub fn test(field: Option<&Value>, op: Comparator, operand: &Value) -> bool {
    match op {
        Comparator::Eq => equals(field, operand),
        Comparator::Ne => !equals(field, operand),
        Comparator::In => operand
            .as_collection()
            .is_some_and(|items| items.iter().any(|item| equals(field, item))),
        Comparator::Gt | Comparator::Gte | Comparator::Lt | Comparator::Lte => {
            let Some(ordering) = field.and_then(|v| v.partial_cmp(operand)) else {
                return false;
            };
            match op {
                Comparator::Gt => ordering == Ordering::Greater,
                Comparator::Gte => ordering != Ordering::Less,
                Comparator::Lt => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            }
        }
    }
}

fn equals(field: Option<&Value>, operand: &Value) -> bool {
    match field {
        Some(value) => value == operand,
        None => operand.is_null(),
    }
}

/// Type bucket used to make ordering total across mixed values.
fn rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(_)) => 0,
        Some(Value::Text(_)) => 1,
        Some(Value::Date(_)) => 2,
        Some(Value::Bool(_)) => 3,
        Some(_) => 4,
        None => 5,
    }
}

/// Total order on optional field values: values group by type, absent
/// values come last in either direction, and within a type the
/// direction applies.
pub fn compare(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
    rank(a).cmp(&rank(b)).then_with(|| {
        let ordering = match (a, b) {
            (Some(Value::Number(x)), Some(Value::Number(y))) => x.total_cmp(y),
            (Some(x), Some(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        };
        match direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    })
}

/// Stable sort on a single field.
pub fn sort(records: &mut [Record], sort: &Sort) {
    records.sort_by(|a, b| compare(a.get(&sort.field), b.get(&sort.field), sort.direction));
}

/// Keeps the first record of each distinct combination of `group` values.
///
/// `Value` is not hashable, so seen keys are kept in a list and each record
/// scans it: quadratic in the number of distinct groups.
pub fn distinct_on(records: Vec<Record>, group: &[String]) -> Vec<Record> {
    let mut seen: Vec<Vec<Option<Value>>> = Vec::new();
    records
        .into_iter()
        .filter(|record| {
            let key: Vec<Option<Value>> = group.iter().map(|f| record.get(f).cloned()).collect();
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        })
        .collect()
}

/// Restricts a record to the selected fields.
pub fn project(mut record: Record, select: &[String]) -> Record {
    record.fields.retain(|name, _| select.contains(name));
    record
}
