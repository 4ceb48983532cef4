use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::Error;

/// How a raw query-string value is coerced before it reaches an operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Array,
}

/// Operator applied by a `filter` rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Regex,
    Exists,
}

/// One declarative field rule. The `kind` tag selects the compile stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRule {
    /// Field searched by the free-text `search` parameter.
    Search { field: String },
    /// Parameter `<field>` coerced by `type` and applied with `operator`.
    Filter {
        field: String,
        #[serde(rename = "type", default)]
        value_type: ValueType,
        #[serde(default)]
        operator: FilterOperator,
    },
    /// Numeric range read from `<name>_min` / `<name>_max`.
    Range { name: String, field: String },
    /// Date range read from `<name>_from` / `<name>_to`.
    Date { name: String, field: String },
    /// Parameter `<field>` compared against the literal `"true"`.
    Boolean { field: String },
}

impl FieldRule {
    fn kind(&self) -> &'static str {
        match self {
            FieldRule::Search { .. } => "search",
            FieldRule::Filter { .. } => "filter",
            FieldRule::Range { .. } => "range",
            FieldRule::Date { .. } => "date",
            FieldRule::Boolean { .. } => "boolean",
        }
    }

    /// Name the rule is keyed by: the logical name for ranges, the field otherwise.
    fn key(&self) -> &str {
        match self {
            FieldRule::Search { field }
            | FieldRule::Filter { field, .. }
            | FieldRule::Boolean { field } => field,
            FieldRule::Range { name, .. } | FieldRule::Date { name, .. } => name,
        }
    }

    fn target(&self) -> &str {
        match self {
            FieldRule::Search { field }
            | FieldRule::Filter { field, .. }
            | FieldRule::Boolean { field }
            | FieldRule::Range { field, .. }
            | FieldRule::Date { field, .. } => field,
        }
    }
}

/// Per-route descriptor of which parameters compile into which predicates.
/// Immutable once built; rule order within a kind is preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldOptions {
    rules: Vec<FieldRule>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<FieldRule>) -> Result<Self, Error> {
        let opts = Self { rules };
        opts.validate()?;
        Ok(opts)
    }

    pub fn search(mut self, field: impl Into<String>) -> Self {
        self.rules.push(FieldRule::Search {
            field: field.into(),
        });
        self
    }

    pub fn filter(
        mut self,
        field: impl Into<String>,
        value_type: ValueType,
        operator: FilterOperator,
    ) -> Self {
        self.rules.push(FieldRule::Filter {
            field: field.into(),
            value_type,
            operator,
        });
        self
    }

    pub fn range(mut self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.rules.push(FieldRule::Range {
            name: name.into(),
            field: field.into(),
        });
        self
    }

    pub fn date(mut self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.rules.push(FieldRule::Date {
            name: name.into(),
            field: field.into(),
        });
        self
    }

    pub fn boolean(mut self, field: impl Into<String>) -> Self {
        self.rules.push(FieldRule::Boolean {
            field: field.into(),
        });
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn search_fields(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().filter_map(|r| match r {
            FieldRule::Search { field } => Some(field.as_str()),
            _ => None,
        })
    }

    /// Rejects empty names and a rule declared twice for the same kind and key.
    pub fn validate(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.key().trim().is_empty() || rule.target().trim().is_empty() {
                return Err(Error::InvalidFieldOptions(format!(
                    "{} rule with empty field name",
                    rule.kind()
                )));
            }
            if !seen.insert((rule.kind(), rule.key())) {
                return Err(Error::InvalidFieldOptions(format!(
                    "duplicate {} rule for '{}'",
                    rule.kind(),
                    rule.key()
                )));
            }
        }
        Ok(())
    }
}

/// Join stage descriptor for the aggregation pipeline (`$lookup`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupSpec {
    /// Foreign collection.
    pub collection: String,
    pub local_field: String,
    pub foreign_field: String,
    #[serde(rename = "as")]
    pub as_field: String,
}
