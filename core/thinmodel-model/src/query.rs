//! Backend-agnostic query specification.
//!
//! A [`Query`] is a passive descriptor: the model layer stamps its `kind`,
//! adapters read it and never mutate it.

use crate::error::{ModelError, ModelResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;

/// Opaque continuation token returned by a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Start and/or end tokens bounding the result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Cursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Cursor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-field ordering. Parsed from `"field"` (ascending) or `"-field"`
/// (descending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(field) => Self::descending(field),
            None => Self::ascending(spec.strip_prefix('+').unwrap_or(spec)),
        }
    }
}

impl From<&str> for Sort {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Field value equals one of the members of a collection operand.
    In,
}

impl Comparator {
    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "in" => Self::In,
            _ => return None,
        })
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
        }
    }
}

/// One predicate over a field. A query's filters are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Comparator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: Comparator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparator::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparator::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparator::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparator::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparator::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparator::Lte, value)
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, Comparator::In, Value::Collection(values))
    }
}

/// Filtering, ordering, pagination and projection for one kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Kind name; populated by `Kind::find`.
    pub kind: String,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<Sort>,
    /// Projection. Non-empty means raw records are returned.
    pub select: Vec<String>,
    pub group: Vec<String>,
    pub cursor: Option<CursorRange>,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: impl Into<Sort>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn group<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn start_at(mut self, cursor: Cursor) -> Self {
        self.cursor.get_or_insert_with(CursorRange::default).start = Some(cursor);
        self
    }

    #[must_use]
    pub fn end_at(mut self, cursor: Cursor) -> Self {
        self.cursor.get_or_insert_with(CursorRange::default).end = Some(cursor);
        self
    }

    /// Parses the structural wire shape:
    ///
    /// ```text
    /// { kind?, limit?, offset?, sort?, select?: s|[s], group?: s|[s],
    ///   cursor?: {start?, end?}, filter?: {..}|[{..}] }
    /// ```
    ///
    /// A filter member `{field: value}` is an equality test;
    /// `{field: {op: value, ..}}` with ops `eq ne gt gte lt lte in` adds one
    /// predicate per op.
    pub fn from_json(json: &Json) -> ModelResult<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| invalid("query must be a JSON object"))?;
        let mut query = Query::new();
        for (key, value) in obj {
            match key.as_str() {
                "kind" => {
                    query.kind = value
                        .as_str()
                        .ok_or_else(|| invalid("kind must be a string"))?
                        .to_string();
                }
                "limit" => query.limit = Some(parse_count(key, value)?),
                "offset" => query.offset = Some(parse_count(key, value)?),
                "sort" => {
                    let spec = value.as_str().ok_or_else(|| invalid("sort must be a string"))?;
                    query.sort = Some(Sort::parse(spec));
                }
                "select" => query.select = parse_names(key, value)?,
                "group" => query.group = parse_names(key, value)?,
                "cursor" => query.cursor = Some(parse_cursor(value)?),
                "filter" => match value {
                    Json::Array(items) => {
                        for item in items {
                            parse_filter_object(item, &mut query.filters)?;
                        }
                    }
                    other => parse_filter_object(other, &mut query.filters)?,
                },
                other => return Err(invalid(format!("unknown query option {other:?}"))),
            }
        }
        Ok(query)
    }
}

fn invalid(msg: impl Into<String>) -> ModelError {
    ModelError::InvalidQuery(msg.into())
}

fn parse_count(key: &str, value: &Json) -> ModelResult<usize> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(format!("{key} must be a non-negative integer")))
}

fn parse_names(key: &str, value: &Json) -> ModelResult<Vec<String>> {
    match value {
        Json::String(s) => Ok(vec![s.clone()]),
        Json::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(format!("{key} entries must be strings")))
            })
            .collect(),
        _ => Err(invalid(format!("{key} must be a string or list of strings"))),
    }
}

fn parse_token(value: &Json) -> ModelResult<Cursor> {
    match value {
        Json::String(s) => Ok(Cursor::new(s.clone())),
        Json::Number(n) => Ok(Cursor::new(n.to_string())),
        _ => Err(invalid("cursor tokens must be strings or numbers")),
    }
}

fn parse_cursor(value: &Json) -> ModelResult<CursorRange> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid("cursor must be an object"))?;
    let mut range = CursorRange::default();
    for (key, token) in obj {
        match key.as_str() {
            "start" => range.start = Some(parse_token(token)?),
            "end" => range.end = Some(parse_token(token)?),
            other => return Err(invalid(format!("unknown cursor option {other:?}"))),
        }
    }
    Ok(range)
}

fn parse_filter_object(value: &Json, out: &mut Vec<Filter>) -> ModelResult<()> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid("filter must be an object or list of objects"))?;
    for (field, condition) in obj {
        let ops = condition.as_object().filter(|ops| {
            !ops.is_empty() && ops.keys().all(|k| Comparator::parse(k).is_some())
        });
        match ops {
            Some(ops) => {
                for (op, operand) in ops {
                    let op = Comparator::parse(op)
                        .ok_or_else(|| invalid(format!("unknown comparator {op:?}")))?;
                    out.push(Filter::new(field.clone(), op, Value::from(operand.clone())));
                }
            }
            None => out.push(Filter::eq(field.clone(), Value::from(condition.clone()))),
        }
    }
    Ok(())
}
