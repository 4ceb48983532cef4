use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listing_query_core::{
    ast::{CompareOperator, Expr, Value},
    Error, FilterExpression, Result, SortDir, SortSpec,
};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value as JsonValue};
use tracing::{trace, warn};

use super::{DocumentStore, FindQuery};
use crate::pipeline::Stage;
use crate::record::lookup_path;

/// In-memory collection of JSON documents with document-store query
/// semantics: array fields match if any element matches, `$ne` matches
/// missing fields, and sorting orders mixed types by type before value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Vec<JsonValue>,
    collections: HashMap<String, Vec<JsonValue>>,
    round_trips: AtomicU64,
}

impl MemoryStore {
    pub fn new(rows: Vec<JsonValue>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Register a foreign collection for `$lookup` stages.
    pub fn with_collection(mut self, name: impl Into<String>, rows: Vec<JsonValue>) -> Self {
        self.collections.insert(name.into(), rows);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Calls served so far; `find_with_count` counts once.
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(AtomicOrdering::Relaxed)
    }

    pub fn reset_round_trips(&self) {
        self.round_trips.store(0, AtomicOrdering::Relaxed);
    }

    fn hit(&self) {
        self.round_trips.fetch_add(1, AtomicOrdering::Relaxed);
    }

    fn matching(&self, filter: &FilterExpression) -> Vec<JsonValue> {
        let matcher = Matcher::compile(filter);
        self.rows
            .iter()
            .filter(|row| {
                let matched = matcher.matches(row);
                trace!(matched, "evaluated row");
                matched
            })
            .cloned()
            .collect()
    }

    fn select(&self, query: &FindQuery) -> Vec<JsonValue> {
        let mut rows = self.matching(&query.filter);
        sort_rows(&mut rows, &query.sort);
        let window = rows.into_iter().skip(to_usize(query.skip));
        match query.limit {
            Some(limit) => window.take(to_usize(limit)).collect(),
            None => window.collect(),
        }
    }

    fn run_stages(&self, mut rows: Vec<JsonValue>, stages: &[Stage]) -> Result<Vec<JsonValue>> {
        for stage in stages {
            rows = match stage {
                Stage::Match(filter) => {
                    let matcher = Matcher::compile(filter);
                    rows.into_iter().filter(|r| matcher.matches(r)).collect()
                }
                Stage::Lookup(spec) => {
                    let foreign = self
                        .collections
                        .get(&spec.collection)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    rows.into_iter()
                        .map(|mut row| {
                            let local = lookup_path(&row, &spec.local_field)
                                .cloned()
                                .unwrap_or(JsonValue::Null);
                            let joined = foreign
                                .iter()
                                .filter(|f| {
                                    lookup_path(f, &spec.foreign_field)
                                        .map_or(local.is_null(), |v| *v == local)
                                })
                                .cloned()
                                .collect();
                            set_path(&mut row, &spec.as_field, JsonValue::Array(joined));
                            row
                        })
                        .collect()
                }
                Stage::AddFields(fields) => rows
                    .into_iter()
                    .map(|mut row| {
                        for (name, expr) in fields {
                            let value = eval_field_expr(&row, expr)?;
                            set_path(&mut row, name, value);
                        }
                        Ok(row)
                    })
                    .collect::<Result<Vec<_>>>()?,
                Stage::Sort(sort) => {
                    sort_rows(&mut rows, sort);
                    rows
                }
                Stage::Skip(n) => rows.into_iter().skip(to_usize(*n)).collect(),
                Stage::Limit(n) => rows.into_iter().take(to_usize(*n)).collect(),
                // Like a real document store, counting an empty stream yields no document.
                Stage::Count(_) if rows.is_empty() => Vec::new(),
                Stage::Count(name) => {
                    let mut doc = Map::new();
                    doc.insert(name.clone(), JsonValue::from(rows.len() as u64));
                    vec![JsonValue::Object(doc)]
                }
                Stage::Facet(branches) => {
                    let mut out = Map::new();
                    for (name, sub) in branches {
                        let branch = self.run_stages(rows.clone(), sub)?;
                        out.insert(name.clone(), JsonValue::Array(branch));
                    }
                    vec![JsonValue::Object(out)]
                }
            };
        }
        Ok(rows)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    type Row = JsonValue;

    async fn find(&self, query: &FindQuery) -> Result<Vec<JsonValue>> {
        self.hit();
        Ok(self.select(query))
    }

    async fn count(&self, filter: &FilterExpression) -> Result<u64> {
        self.hit();
        Ok(self.matching(filter).len() as u64)
    }

    async fn find_with_count(&self, query: &FindQuery) -> Result<(Vec<JsonValue>, u64)> {
        self.hit();
        let total = self.matching(&query.filter).len() as u64;
        Ok((self.select(query), total))
    }

    async fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<JsonValue>> {
        self.hit();
        self.run_stages(self.rows.clone(), pipeline)
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// `"$path"` copies a field, plain JSON is a literal; operator expressions
/// are not evaluated here.
fn eval_field_expr(row: &JsonValue, expr: &JsonValue) -> Result<JsonValue> {
    match expr {
        JsonValue::String(s) if s.starts_with('$') => {
            Ok(lookup_path(row, &s[1..]).cloned().unwrap_or(JsonValue::Null))
        }
        JsonValue::Object(map) => match map.keys().find(|k| k.starts_with('$')) {
            Some(op) => Err(Error::Store(format!(
                "expression operator {op} is not supported by the in-memory store"
            ))),
            None => Ok(expr.clone()),
        },
        other => Ok(other.clone()),
    }
}

fn set_path(row: &mut JsonValue, path: &str, value: JsonValue) {
    let mut segments = path.split('.').peekable();
    let mut cur = row;
    while let Some(seg) = segments.next() {
        let JsonValue::Object(map) = cur else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(seg.to_string(), value);
            return;
        }
        cur = map
            .entry(seg.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
    }
}

/// Filter compiled once per query; regex patterns are built up front.
enum Matcher {
    All(Vec<Matcher>),
    Any(Vec<Matcher>),
    Compare(String, CompareOperator, Value),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    /// `None` when the pattern failed to compile: matches nothing.
    Regex(String, Option<Regex>),
    Exists(String, bool),
    Range(String, Option<Value>, Option<Value>),
}

impl Matcher {
    fn compile(filter: &FilterExpression) -> Self {
        Matcher::All(filter.clauses().iter().map(Matcher::from_expr).collect())
    }

    fn from_expr(expr: &Expr) -> Self {
        match expr {
            Expr::And(items) => Matcher::All(items.iter().map(Matcher::from_expr).collect()),
            Expr::Or(items) => Matcher::Any(items.iter().map(Matcher::from_expr).collect()),
            Expr::Compare(f, op, v) => Matcher::Compare(f.clone(), *op, v.clone()),
            Expr::In(f, vs) => Matcher::In(f.clone(), vs.clone()),
            Expr::NotIn(f, vs) => Matcher::NotIn(f.clone(), vs.clone()),
            Expr::Regex(f, pattern) => {
                let compiled = RegexBuilder::new(&pattern.source)
                    .case_insensitive(pattern.case_insensitive)
                    .build();
                match compiled {
                    Ok(re) => Matcher::Regex(f.clone(), Some(re)),
                    Err(e) => {
                        warn!(field = %f, pattern = %pattern.source, error = %e, "invalid regex pattern, clause matches nothing");
                        Matcher::Regex(f.clone(), None)
                    }
                }
            }
            Expr::Exists(f, present) => Matcher::Exists(f.clone(), *present),
            Expr::Range(f, bounds) => Matcher::Range(f.clone(), bounds.lower.clone(), bounds.upper.clone()),
        }
    }

    fn matches(&self, row: &JsonValue) -> bool {
        match self {
            Matcher::All(items) => items.iter().all(|m| m.matches(row)),
            Matcher::Any(items) => items.iter().any(|m| m.matches(row)),
            Matcher::Compare(field, op, value) => compare_field(row, field, *op, value),
            Matcher::In(field, values) => values
                .iter()
                .any(|v| compare_field(row, field, CompareOperator::Eq, v)),
            Matcher::NotIn(field, values) => !values
                .iter()
                .any(|v| compare_field(row, field, CompareOperator::Eq, v)),
            Matcher::Regex(field, re) => match (lookup_path(row, field), re) {
                (Some(found), Some(re)) => {
                    candidates(found).any(|c| c.as_str().is_some_and(|s| re.is_match(s)))
                }
                _ => false,
            },
            Matcher::Exists(field, present) => lookup_path(row, field).is_some() == *present,
            Matcher::Range(field, lower, upper) => {
                lower
                    .as_ref()
                    .is_none_or(|l| compare_field(row, field, CompareOperator::Ge, l))
                    && upper
                        .as_ref()
                        .is_none_or(|u| compare_field(row, field, CompareOperator::Le, u))
            }
        }
    }
}

/// The value itself and, for arrays, each element.
fn candidates(found: &JsonValue) -> Box<dyn Iterator<Item = &JsonValue> + '_> {
    match found {
        JsonValue::Array(items) => Box::new(std::iter::once(found).chain(items.iter())),
        other => Box::new(std::iter::once(other)),
    }
}

fn compare_field(row: &JsonValue, field: &str, op: CompareOperator, value: &Value) -> bool {
    if op == CompareOperator::Ne {
        return !compare_field(row, field, CompareOperator::Eq, value);
    }
    match lookup_path(row, field) {
        // A missing field only equals null.
        None => op == CompareOperator::Eq && matches!(value, Value::Null),
        Some(found) => candidates(found).any(|c| {
            compare_json(c, value).is_some_and(|ord| match op {
                CompareOperator::Eq => ord == Ordering::Equal,
                CompareOperator::Gt => ord == Ordering::Greater,
                CompareOperator::Ge => ord != Ordering::Less,
                CompareOperator::Lt => ord == Ordering::Less,
                CompareOperator::Le => ord != Ordering::Greater,
                CompareOperator::Ne => ord != Ordering::Equal,
            })
        }),
    }
}

/// Order a stored value against a literal; `None` when the types are not comparable.
fn compare_json(doc: &JsonValue, value: &Value) -> Option<Ordering> {
    match (doc, value) {
        (JsonValue::Null, Value::Null) => Some(Ordering::Equal),
        (JsonValue::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (JsonValue::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(b),
        (JsonValue::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (doc, Value::DateTime(b)) => stored_date(doc).map(|a| a.cmp(b)),
        (JsonValue::Array(a), Value::Array(b)) => {
            let equal = a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| compare_json(x, y) == Some(Ordering::Equal));
            equal.then_some(Ordering::Equal)
        }
        _ => None,
    }
}

/// Dates are stored as RFC 3339 strings or extended-JSON `{"$date": ...}`.
fn stored_date(doc: &JsonValue) -> Option<DateTime<Utc>> {
    let text = match doc {
        JsonValue::String(s) => s.as_str(),
        JsonValue::Object(map) => map.get("$date")?.as_str()?,
        _ => return None,
    };
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn type_rank(v: Option<&JsonValue>) -> u8 {
    match v {
        None | Some(JsonValue::Null) => 0,
        Some(JsonValue::Number(_)) => 1,
        Some(JsonValue::String(_)) => 2,
        Some(JsonValue::Object(_)) => 3,
        Some(JsonValue::Array(_)) => 4,
        Some(JsonValue::Bool(_)) => 5,
    }
}

fn cmp_stored(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    })
}

fn sort_rows(rows: &mut [JsonValue], sort: &SortSpec) {
    if sort.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        sort.keys()
            .iter()
            .map(|key| {
                let ord = cmp_stored(lookup_path(a, &key.field), lookup_path(b, &key.field));
                match key.dir {
                    SortDir::Asc => ord,
                    SortDir::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}
