use listing_query_core::{
    ast::{CompareOperator, Expr, Value},
    CursorPage, CursorPageInfo, FilterExpression, ParamValue, QueryParams, SortDir, SortSpec,
    ValueType,
};
use serde::{Deserialize, Serialize};

use super::fetch::OneExtra;
use super::limits::limit_from;
use super::{Paginator, CURSOR_PARAM, DIRECTION_PARAM};
use crate::coerce::coerce;
use crate::record::Record;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
    #[default]
    Next,
    Prev,
}

impl CursorDirection {
    /// `"prev"` pages backwards; anything else (or nothing) pages forwards.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("prev") => CursorDirection::Prev,
            _ => CursorDirection::Next,
        }
    }
}

/// Cursor paging state. The cursor is opaque: the raw sort-field value of
/// a boundary record, carried verbatim from the query string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorParams {
    pub limit: u64,
    pub cursor: Option<String>,
    pub direction: CursorDirection,
    pub sort_field: String,
    pub sort_order: SortDir,
    /// Type the cursor is coerced to before comparison; matches the sort field.
    pub cursor_type: ValueType,
}

impl CursorParams {
    pub fn with_cursor_type(mut self, cursor_type: ValueType) -> Self {
        self.cursor_type = cursor_type;
        self
    }

    pub fn cursor_value(&self) -> Option<Value> {
        self.cursor
            .as_ref()
            .map(|c| coerce(&ParamValue::Single(c.clone()), self.cursor_type))
    }

    /// Strict comparator placing rows after the cursor in the requested direction.
    pub fn comparator(&self) -> CompareOperator {
        let forward = match self.sort_order {
            SortDir::Desc => CompareOperator::Lt,
            SortDir::Asc => CompareOperator::Gt,
        };
        match self.direction {
            CursorDirection::Next => forward,
            CursorDirection::Prev => forward.flipped(),
        }
    }

    /// Base filter plus the cursor inequality; unchanged when no cursor was supplied.
    pub fn build_cursor_query(&self, base: FilterExpression) -> FilterExpression {
        match self.cursor_value() {
            Some(v) => base.and(Expr::Compare(self.sort_field.clone(), self.comparator(), v)),
            None => base,
        }
    }

    pub fn sort(&self) -> SortSpec {
        SortSpec::by(self.sort_field.clone(), self.sort_order)
    }

    /// Fetch plan: the store is asked for `limit + 1` rows.
    pub fn one_extra(&self) -> OneExtra {
        OneExtra::new(self.limit)
    }

    /// Trim the over-fetched row and derive navigation cursors from the
    /// sort field of the last/first remaining record.
    pub fn process_cursor_results<T: Record>(&self, rows: Vec<T>) -> CursorPage<T> {
        let (data, has_next) = self.one_extra().trim(rows);
        let next_cursor = data.last().and_then(|r| r.field_value(&self.sort_field));
        let prev_cursor = data.first().and_then(|r| r.field_value(&self.sort_field));

        CursorPage::new(
            data,
            CursorPageInfo {
                has_next,
                has_prev: self.cursor.is_some(),
                next_cursor,
                prev_cursor,
                limit: self.limit,
            },
        )
    }
}

impl Paginator {
    /// Cursor paging parameters from `limit`, `cursor` and `direction`.
    pub fn build_cursor_pagination(
        &self,
        params: &QueryParams,
        sort_field: &str,
        sort_order: SortDir,
    ) -> CursorParams {
        CursorParams {
            limit: limit_from(params, &self.cfg),
            cursor: params.get_non_empty(CURSOR_PARAM).map(str::to_string),
            direction: CursorDirection::from_param(params.get_str(DIRECTION_PARAM)),
            sort_field: sort_field.to_string(),
            sort_order,
            cursor_type: ValueType::String,
        }
    }
}
