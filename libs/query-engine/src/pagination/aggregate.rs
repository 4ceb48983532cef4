use listing_query_core::{AggregatePage, AggregatePageInfo, OffsetPage, QueryParams};
use serde_json::Value as JsonValue;

use super::fetch::OneExtra;
use super::offset::OffsetPagination;
use super::Paginator;
use crate::pipeline::{Stage, FACET_COUNT_FIELD, FACET_DATA_FIELD, FACET_TOTAL_FIELD};

impl Paginator {
    /// Count-free paging stages: `$skip`, then `$limit` of one extra row.
    /// The total count is a separate query merged in by
    /// [`Paginator::process_aggregation_results`].
    pub fn build_aggregation_pagination(&self, params: &QueryParams) -> Vec<Stage> {
        let pagination = self.build_pagination(params);
        vec![
            Stage::Skip(pagination.skip),
            Stage::Limit(OneExtra::new(pagination.limit).fetch_limit()),
        ]
    }

    pub fn process_aggregation_results<T>(
        &self,
        rows: Vec<T>,
        pagination: &OffsetPagination,
        total_count: u64,
    ) -> AggregatePage<T> {
        let (data, has_more) = OneExtra::new(pagination.limit).trim(rows);
        AggregatePage::new(
            data,
            AggregatePageInfo {
                info: pagination.info(total_count),
                has_more,
            },
        )
    }
}

/// Output of a facet stage: one page of rows and the total in one round trip.
#[derive(Clone, Debug, PartialEq)]
pub struct FacetResult<T> {
    pub data: Vec<T>,
    pub total_count: u64,
}

impl FacetResult<JsonValue> {
    /// Read raw facet output: `results[0].data` and
    /// `results[0].totalCount[0].count`, defaulting to no rows and zero.
    pub fn from_documents(results: Vec<JsonValue>) -> Self {
        let Some(JsonValue::Object(mut first)) = results.into_iter().next() else {
            return Self {
                data: Vec::new(),
                total_count: 0,
            };
        };
        let total_count = first
            .get(FACET_TOTAL_FIELD)
            .and_then(|t| t.get(0))
            .and_then(|c| c.get(FACET_COUNT_FIELD))
            .and_then(JsonValue::as_u64)
            .unwrap_or(0);
        let data = match first.remove(FACET_DATA_FIELD) {
            Some(JsonValue::Array(rows)) => rows,
            _ => Vec::new(),
        };
        Self { data, total_count }
    }
}

/// Shape a facet result into the offset envelope.
pub fn process_facet_results<T>(facet: FacetResult<T>, pagination: &OffsetPagination) -> OffsetPage<T> {
    OffsetPage::new(facet.data, pagination.info(facet.total_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PaginationConfig;
    use serde_json::json;

    fn paginator() -> Paginator {
        Paginator::new(PaginationConfig::default())
    }

    #[test]
    fn aggregation_stages_fetch_one_extra() {
        let stages = paginator().build_aggregation_pagination(&QueryParams::parse("page=2&limit=10"));
        assert_eq!(stages, vec![Stage::Skip(10), Stage::Limit(11)]);
    }

    #[test]
    fn aggregation_results_trim_and_merge_count() {
        let pagination = OffsetPagination::new(2, 3);
        let page = paginator().process_aggregation_results(vec![1, 2, 3, 4], &pagination, 10);
        assert_eq!(page.data, vec![1, 2, 3]);
        assert!(page.pagination.has_more);
        assert_eq!(page.pagination.info.total_pages, 4);
        assert!(page.pagination.info.has_prev);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"]["hasMore"], true);
        assert_eq!(json["pagination"]["totalCount"], 10);
    }

    #[test]
    fn facet_documents_are_read_with_defaults() {
        let raw = vec![json!({
            "data": [{"title": "A"}, {"title": "B"}],
            "totalCount": [{"count": 42}]
        })];
        let facet = FacetResult::from_documents(raw);
        assert_eq!(facet.total_count, 42);
        assert_eq!(facet.data.len(), 2);

        let empty = FacetResult::from_documents(vec![json!({"data": [], "totalCount": []})]);
        assert_eq!(empty.total_count, 0);
        assert!(empty.data.is_empty());

        let nothing = FacetResult::from_documents(vec![]);
        assert_eq!(nothing.total_count, 0);
    }

    #[test]
    fn facet_envelope_for_empty_collection() {
        let page = process_facet_results(
            FacetResult::<JsonValue>::from_documents(vec![]),
            &OffsetPagination::new(1, 20),
        );
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_pages, 0);
        assert!(!page.pagination.has_next);
        assert!(!page.pagination.has_prev);
    }
}
