use listing_query_core::{
    ast::{CompareOperator, Expr, Value},
    FilterExpression, QueryParams, ScrollPage, SortDir, SortSpec,
};
use serde::{Deserialize, Serialize};

use super::fetch::OneExtra;
use super::limits::limit_from;
use super::{Paginator, LAST_ID_PARAM};
use crate::record::Record;

/// Infinite-scroll state: primary key descending, resumed after `last_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollParams {
    pub last_id: Option<String>,
    pub limit: u64,
}

impl ScrollParams {
    /// `id_field < last_id` when resuming, otherwise match-all. No other clauses.
    pub fn build_scroll_query(&self, id_field: &str) -> FilterExpression {
        match &self.last_id {
            Some(id) => FilterExpression::from(Expr::Compare(
                id_field.to_string(),
                CompareOperator::Lt,
                Value::String(id.clone()),
            )),
            None => FilterExpression::match_all(),
        }
    }

    pub fn sort(&self, id_field: &str) -> SortSpec {
        SortSpec::by(id_field, SortDir::Desc)
    }

    pub fn one_extra(&self) -> OneExtra {
        OneExtra::new(self.limit)
    }

    pub fn process_scroll_results<T: Record>(&self, rows: Vec<T>, id_field: &str) -> ScrollPage<T> {
        let (data, has_more) = self.one_extra().trim(rows);
        let next_cursor = data.last().and_then(|r| r.field_value(id_field));
        ScrollPage {
            data,
            has_more,
            next_cursor,
        }
    }
}

impl Paginator {
    /// Infinite-scroll parameters from `lastId` / `limit`.
    pub fn build_scroll_pagination(&self, params: &QueryParams) -> ScrollParams {
        ScrollParams {
            last_id: params.get_non_empty(LAST_ID_PARAM).map(str::to_string),
            limit: limit_from(params, &self.cfg),
        }
    }
}
