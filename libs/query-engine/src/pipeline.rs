//! Aggregation pipeline composition: match, lookups, computed fields, sort,
//! and a facet stage returning one page of rows plus the total count.

use listing_query_core::{FieldOptions, FilterExpression, LookupSpec, QueryParams, SortSpec};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use crate::compiler::{build_sort, compile};
use crate::document::ToDocument;
use crate::pagination::Paginator;

/// Facet branch holding the page of rows.
pub const FACET_DATA_FIELD: &str = "data";
/// Facet branch holding `[{ count: n }]`.
pub const FACET_TOTAL_FIELD: &str = "totalCount";
pub const FACET_COUNT_FIELD: &str = "count";

#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    Match(FilterExpression),
    Lookup(LookupSpec),
    /// Caller-supplied expressions, passed through verbatim.
    AddFields(Map<String, JsonValue>),
    Sort(SortSpec),
    Skip(u64),
    Limit(u64),
    /// Replace the stream with a single `{ <name>: n }` document.
    Count(String),
    /// Named sub-pipelines evaluated over the same input.
    Facet(Vec<(String, Vec<Stage>)>),
}

/// Extras for [`build_aggregation_pipeline`] beyond the field options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOptions {
    pub populate: Vec<LookupSpec>,
    pub computed_fields: Option<Map<String, JsonValue>>,
}

/// Compose the full pipeline for a listing request.
///
/// Stage order is fixed: `$match` (only when the filter is non-empty), one
/// `$lookup` per populate entry, `$addFields`, `$sort` (only when `sortBy`
/// is present), then a `$facet` with the page of rows and the total count.
pub fn build_aggregation_pipeline(
    params: &QueryParams,
    options: &FieldOptions,
    extras: &PipelineOptions,
    paginator: &Paginator,
) -> Vec<Stage> {
    let mut stages = Vec::new();

    let filter = compile(params, options);
    if !filter.is_match_all() {
        stages.push(Stage::Match(filter));
    }

    stages.extend(extras.populate.iter().cloned().map(Stage::Lookup));

    if let Some(fields) = &extras.computed_fields {
        stages.push(Stage::AddFields(fields.clone()));
    }

    let sort = build_sort(params);
    if !sort.is_empty() {
        stages.push(Stage::Sort(sort));
    }

    let pagination = paginator.build_pagination(params);
    stages.push(Stage::Facet(vec![
        (
            FACET_DATA_FIELD.to_string(),
            vec![Stage::Skip(pagination.skip), Stage::Limit(pagination.limit)],
        ),
        (
            FACET_TOTAL_FIELD.to_string(),
            vec![Stage::Count(FACET_COUNT_FIELD.to_string())],
        ),
    ]));

    stages
}

impl ToDocument for Stage {
    fn to_document(&self) -> JsonValue {
        match self {
            Stage::Match(filter) => json!({ "$match": filter.to_document() }),
            Stage::Lookup(spec) => json!({
                "$lookup": {
                    "from": spec.collection,
                    "localField": spec.local_field,
                    "foreignField": spec.foreign_field,
                    "as": spec.as_field,
                }
            }),
            Stage::AddFields(fields) => json!({ "$addFields": fields }),
            Stage::Sort(sort) => json!({ "$sort": sort.to_document() }),
            Stage::Skip(n) => json!({ "$skip": n }),
            Stage::Limit(n) => json!({ "$limit": n }),
            Stage::Count(name) => json!({ "$count": name }),
            Stage::Facet(branches) => {
                let facet: Map<String, JsonValue> = branches
                    .iter()
                    .map(|(name, stages)| (name.clone(), stages.to_document()))
                    .collect();
                json!({ "$facet": facet })
            }
        }
    }
}

impl ToDocument for [Stage] {
    fn to_document(&self) -> JsonValue {
        JsonValue::Array(self.iter().map(ToDocument::to_document).collect())
    }
}

impl ToDocument for Vec<Stage> {
    fn to_document(&self) -> JsonValue {
        self.as_slice().to_document()
    }
}
