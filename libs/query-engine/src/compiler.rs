//! Query parameters + field options → `FilterExpression` / `SortSpec`.
//!
//! Stages run in a fixed order (search, filters, dates, ranges, booleans).
//! Each stage contributes only when its parameters are present and the
//! contributions are conjoined. Compilation is pure and never fails.

use listing_query_core::{
    ast::{Bounds, CompareOperator, Expr, Value},
    FieldOptions, FieldRule, FilterExpression, FilterOperator, QueryParams, SortDir, SortSpec,
    ValueType,
};
use tracing::debug;

use crate::coerce::{coerce, parse_date, parse_number};

/// Parameter carrying the free-text search term.
pub const SEARCH_PARAM: &str = "search";
pub const SORT_BY_PARAM: &str = "sortBy";
pub const SORT_ORDER_PARAM: &str = "sortOrder";

/// Compile query parameters into a filter expression.
///
/// Empty parameters always yield [`FilterExpression::match_all`].
pub fn compile(params: &QueryParams, options: &FieldOptions) -> FilterExpression {
    let mut filter = FilterExpression::match_all();

    if let Some(expr) = search_stage(params, options) {
        filter.push(expr);
    }

    for rule in options.rules() {
        if let FieldRule::Filter {
            field,
            value_type,
            operator,
        } = rule
        {
            if let Some(expr) = filter_stage(params, field, *value_type, *operator) {
                filter.push(expr);
            }
        }
    }

    for rule in options.rules() {
        if let FieldRule::Date { name, field } = rule {
            if let Some(bounds) = bounds_stage(params, name, "_from", "_to", parse_date) {
                filter.push(Expr::Range(field.clone(), bounds));
            }
        }
    }

    for rule in options.rules() {
        if let FieldRule::Range { name, field } = rule {
            if let Some(bounds) = bounds_stage(params, name, "_min", "_max", parse_number) {
                filter.push(Expr::Range(field.clone(), bounds));
            }
        }
    }

    for rule in options.rules() {
        if let FieldRule::Boolean { field } = rule {
            if let Some(raw) = params.get_str(field) {
                filter.push(Expr::eq(field.as_str(), Value::Bool(raw == "true")));
            }
        }
    }

    debug!(clauses = filter.len(), "compiled listing filter");
    filter
}

fn search_stage(params: &QueryParams, options: &FieldOptions) -> Option<Expr> {
    let term = params.get_non_empty(SEARCH_PARAM)?;
    let branches: Vec<Expr> = options
        .search_fields()
        .map(|field| Expr::regex_ci(field, term))
        .collect();
    if branches.is_empty() {
        return None;
    }
    Some(Expr::Or(branches))
}

fn filter_stage(
    params: &QueryParams,
    field: &str,
    value_type: ValueType,
    operator: FilterOperator,
) -> Option<Expr> {
    let raw = params.get(field)?;
    if raw.values().iter().all(|v| v.is_empty()) {
        return None;
    }
    let value = coerce(raw, value_type);
    Some(apply_operator(field, operator, value))
}

/// Build the predicate for one declared operator.
pub fn apply_operator(field: &str, operator: FilterOperator, value: Value) -> Expr {
    let field = field.to_string();
    match operator {
        FilterOperator::Eq => Expr::Compare(field, CompareOperator::Eq, value),
        FilterOperator::Ne => Expr::Compare(field, CompareOperator::Ne, value),
        FilterOperator::Gt => Expr::Compare(field, CompareOperator::Gt, value),
        FilterOperator::Gte => Expr::Compare(field, CompareOperator::Ge, value),
        FilterOperator::Lt => Expr::Compare(field, CompareOperator::Lt, value),
        FilterOperator::Lte => Expr::Compare(field, CompareOperator::Le, value),
        FilterOperator::In => Expr::In(field, into_list(value)),
        FilterOperator::Nin => Expr::NotIn(field, into_list(value)),
        FilterOperator::Regex => Expr::regex_ci(field, pattern_source(&value)),
        FilterOperator::Exists => Expr::Exists(field, truthy(&value)),
    }
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn pattern_source(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::DateTime(dt) => dt.to_rfc3339(),
        Value::Array(items) => items.iter().map(pattern_source).collect::<Vec<_>>().join(","),
        Value::Null | Value::InvalidDate => String::new(),
    }
}

/// Document-store truthiness: `false`, `0`, NaN, null and the strings
/// `"false"` / `"0"` / `""` are false.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !matches!(s.as_str(), "" | "false" | "0"),
        Value::Null | Value::InvalidDate => false,
        Value::DateTime(_) | Value::Array(_) => true,
    }
}

fn bounds_stage(
    params: &QueryParams,
    name: &str,
    lower_suffix: &str,
    upper_suffix: &str,
    parse: fn(&str) -> Value,
) -> Option<Bounds> {
    let lower = params
        .get_non_empty(&format!("{name}{lower_suffix}"))
        .map(parse);
    let upper = params
        .get_non_empty(&format!("{name}{upper_suffix}"))
        .map(parse);
    let bounds = Bounds { lower, upper };
    (!bounds.is_empty()).then_some(bounds)
}

/// Sort from `sortBy` / `sortOrder`. Absent `sortBy` yields an empty spec;
/// `sortOrder` defaults to descending and any value but `desc` is ascending.
pub fn build_sort(params: &QueryParams) -> SortSpec {
    match params.get_non_empty(SORT_BY_PARAM) {
        Some(field) => {
            let dir = params
                .get_str(SORT_ORDER_PARAM)
                .map(SortDir::from_param)
                .unwrap_or(SortDir::Desc);
            SortSpec::by(field, dir)
        }
        None => SortSpec::empty(),
    }
}
