//! Transport-agnostic types shared by the listing query compiler and the
//! pagination engine: the filter AST, field options, query parameters,
//! sort specs and response envelopes.

pub mod ast {
    use chrono::{DateTime, Utc};

    /// A single predicate (or boolean combination of predicates) on document fields.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Expr {
        And(Vec<Expr>),
        Or(Vec<Expr>),
        Compare(String, CompareOperator, Value),
        In(String, Vec<Value>),
        NotIn(String, Vec<Value>),
        Regex(String, Pattern),
        Exists(String, bool),
        /// Inclusive bounds on one field; an absent bound is omitted, never defaulted.
        Range(String, Bounds),
    }

    impl Expr {
        pub fn compare(field: impl Into<String>, op: CompareOperator, value: Value) -> Self {
            Expr::Compare(field.into(), op, value)
        }

        pub fn eq(field: impl Into<String>, value: Value) -> Self {
            Self::compare(field, CompareOperator::Eq, value)
        }

        /// Case-insensitive pattern match.
        pub fn regex_ci(field: impl Into<String>, source: impl Into<String>) -> Self {
            Expr::Regex(
                field.into(),
                Pattern {
                    source: source.into(),
                    case_insensitive: true,
                },
            )
        }

        /// Field this predicate constrains, `None` for boolean combinators.
        pub fn field(&self) -> Option<&str> {
            match self {
                Expr::And(_) | Expr::Or(_) => None,
                Expr::Compare(f, _, _)
                | Expr::In(f, _)
                | Expr::NotIn(f, _)
                | Expr::Regex(f, _)
                | Expr::Exists(f, _)
                | Expr::Range(f, _) => Some(f),
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum CompareOperator {
        Eq,
        Ne,
        Gt,
        Ge,
        Lt,
        Le,
    }

    impl CompareOperator {
        /// Operator with its operands swapped (`a < b` ⇔ `b > a`).
        pub fn flipped(self) -> Self {
            match self {
                CompareOperator::Eq => CompareOperator::Eq,
                CompareOperator::Ne => CompareOperator::Ne,
                CompareOperator::Gt => CompareOperator::Lt,
                CompareOperator::Ge => CompareOperator::Le,
                CompareOperator::Lt => CompareOperator::Gt,
                CompareOperator::Le => CompareOperator::Ge,
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Pattern {
        pub source: String,
        pub case_insensitive: bool,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Bounds {
        pub lower: Option<Value>,
        pub upper: Option<Value>,
    }

    impl Bounds {
        pub fn is_empty(&self) -> bool {
            self.lower.is_none() && self.upper.is_none()
        }
    }

    /// Literal operand. Unparseable input degrades to `Number(NaN)` or
    /// `InvalidDate` instead of failing the compile.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Value {
        Null,
        Bool(bool),
        Number(f64),
        DateTime(DateTime<Utc>),
        InvalidDate,
        String(String),
        Array(Vec<Value>),
    }

    impl Value {
        pub fn is_invalid(&self) -> bool {
            match self {
                Value::Number(n) => n.is_nan(),
                Value::InvalidDate => true,
                _ => false,
            }
        }
    }

    impl From<&str> for Value {
        fn from(s: &str) -> Self {
            Value::String(s.to_string())
        }
    }

    impl From<String> for Value {
        fn from(s: String) -> Self {
            Value::String(s)
        }
    }

    impl From<f64> for Value {
        fn from(n: f64) -> Self {
            Value::Number(n)
        }
    }

    impl From<bool> for Value {
        fn from(b: bool) -> Self {
            Value::Bool(b)
        }
    }
}

mod options;
mod page;
mod params;
mod sort;

pub use options::{FieldOptions, FieldRule, FilterOperator, LookupSpec, ValueType};
pub use page::{
    AggregatePage, AggregatePageInfo, CursorPage, CursorPageInfo, OffsetPage, Page, PaginationInfo,
    PaginationLinks, PaginationMetadata, PaginationValidation, ScrollPage, ValidationIssue,
};
pub use params::{ParamValue, QueryParams};
pub use sort::{SortDir, SortKey, SortSpec};

use thiserror::Error;

/// Compiled filter: a conjunction of predicates. No clauses means "match every record".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterExpression(Vec<ast::Expr>);

impl FilterExpression {
    pub fn match_all() -> Self {
        Self(Vec::new())
    }

    /// Conjoin another predicate. Nested conjunctions are flattened.
    pub fn and(mut self, expr: ast::Expr) -> Self {
        self.push(expr);
        self
    }

    pub fn push(&mut self, expr: ast::Expr) {
        match expr {
            ast::Expr::And(inner) => {
                for e in inner {
                    self.push(e);
                }
            }
            other => self.0.push(other),
        }
    }

    pub fn clauses(&self) -> &[ast::Expr] {
        &self.0
    }

    pub fn into_clauses(self) -> Vec<ast::Expr> {
        self.0
    }

    pub fn is_match_all(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Clauses that constrain `field` directly.
    pub fn clauses_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ast::Expr> + 'a {
        self.0.iter().filter(move |e| e.field() == Some(field))
    }
}

impl From<Vec<ast::Expr>> for FilterExpression {
    fn from(clauses: Vec<ast::Expr>) -> Self {
        let mut f = FilterExpression::match_all();
        for c in clauses {
            f.push(c);
        }
        f
    }
}

impl From<ast::Expr> for FilterExpression {
    fn from(expr: ast::Expr) -> Self {
        FilterExpression::match_all().and(expr)
    }
}

/// Unified error type for the listing query library surface.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid field options: {0}")]
    InvalidFieldOptions(String),

    #[error("invalid pagination parameters: {}", join_issues(.0))]
    InvalidPagination(Vec<ValidationIssue>),

    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    #[error("store error: {0}")]
    Store(String),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
