//! Rendering of filters, sorts and pipeline stages as Mongo-style JSON
//! documents, the form a document-store driver consumes.

use chrono::SecondsFormat;
use listing_query_core::{
    ast::{CompareOperator, Expr, Value},
    FilterExpression, SortSpec,
};
use serde_json::{json, Map, Number, Value as JsonValue};

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub trait ToDocument {
    fn to_document(&self) -> JsonValue;
}

impl ToDocument for Value {
    fn to_document(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => number_document(*n),
            Value::DateTime(dt) => json!({ "$date": dt.to_rfc3339_opts(SecondsFormat::Millis, true) }),
            Value::InvalidDate => json!({ "$date": "Invalid Date" }),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(items) => JsonValue::Array(items.iter().map(ToDocument::to_document).collect()),
        }
    }
}

fn number_document(n: f64) -> JsonValue {
    if n.is_nan() {
        return json!({ "$numberDouble": "NaN" });
    }
    if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        return json!({ "$numberDouble": text });
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return JsonValue::from(n as i64);
    }
    Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
}

fn operator_key(op: CompareOperator) -> &'static str {
    match op {
        CompareOperator::Eq => "$eq",
        CompareOperator::Ne => "$ne",
        CompareOperator::Gt => "$gt",
        CompareOperator::Ge => "$gte",
        CompareOperator::Lt => "$lt",
        CompareOperator::Le => "$lte",
    }
}

fn field_document(field: &str, condition: JsonValue) -> JsonValue {
    let mut doc = Map::new();
    doc.insert(field.to_string(), condition);
    JsonValue::Object(doc)
}

impl ToDocument for Expr {
    fn to_document(&self) -> JsonValue {
        match self {
            Expr::And(items) => json!({ "$and": items.iter().map(ToDocument::to_document).collect::<Vec<_>>() }),
            Expr::Or(items) => json!({ "$or": items.iter().map(ToDocument::to_document).collect::<Vec<_>>() }),
            // Equality is the bare-value shorthand.
            Expr::Compare(field, CompareOperator::Eq, value) => field_document(field, value.to_document()),
            Expr::Compare(field, op, value) => {
                field_document(field, json!({ operator_key(*op): value.to_document() }))
            }
            Expr::In(field, values) => field_document(
                field,
                json!({ "$in": values.iter().map(ToDocument::to_document).collect::<Vec<_>>() }),
            ),
            Expr::NotIn(field, values) => field_document(
                field,
                json!({ "$nin": values.iter().map(ToDocument::to_document).collect::<Vec<_>>() }),
            ),
            Expr::Regex(field, pattern) => {
                let mut cond = Map::new();
                cond.insert("$regex".into(), JsonValue::String(pattern.source.clone()));
                if pattern.case_insensitive {
                    cond.insert("$options".into(), JsonValue::String("i".into()));
                }
                field_document(field, JsonValue::Object(cond))
            }
            Expr::Exists(field, present) => field_document(field, json!({ "$exists": present })),
            Expr::Range(field, bounds) => {
                let mut cond = Map::new();
                if let Some(lower) = &bounds.lower {
                    cond.insert("$gte".into(), lower.to_document());
                }
                if let Some(upper) = &bounds.upper {
                    cond.insert("$lte".into(), upper.to_document());
                }
                field_document(field, JsonValue::Object(cond))
            }
        }
    }
}

impl ToDocument for FilterExpression {
    /// Clauses merge into one flat document while their keys are distinct;
    /// a repeated key (two clauses on one field, or two `$or`s) falls back
    /// to an explicit `$and` so no clause is lost.
    fn to_document(&self) -> JsonValue {
        let docs: Vec<JsonValue> = self.clauses().iter().map(ToDocument::to_document).collect();
        let mut merged = Map::new();
        for doc in &docs {
            if let JsonValue::Object(map) = doc {
                for (k, v) in map {
                    if merged.insert(k.clone(), v.clone()).is_some() {
                        return json!({ "$and": docs });
                    }
                }
            }
        }
        JsonValue::Object(merged)
    }
}

impl ToDocument for SortSpec {
    fn to_document(&self) -> JsonValue {
        let mut doc = Map::new();
        for key in self.keys() {
            doc.insert(key.field.clone(), JsonValue::from(key.dir.as_i32()));
        }
        JsonValue::Object(doc)
    }
}
