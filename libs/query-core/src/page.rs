use serde::{Deserialize, Serialize};

use crate::Error;

/// Response envelope: one page of records plus navigation metadata.
#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T, P> {
    pub data: Vec<T>,
    pub pagination: P,
}

impl<T, P> Page<T, P> {
    pub fn new(data: Vec<T>, pagination: P) -> Self {
        Self { data, pagination }
    }

    /// Map records while keeping the pagination metadata (store row -> DTO).
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U, P> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Offset paging metadata.
#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub limit: u64,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_page: Option<u64>,
    pub prev_page: Option<u64>,
    pub start_index: u64,
    pub end_index: u64,
}

#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub first: String,
    pub last: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next: Option<String>,
}

#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    #[serde(flatten)]
    pub info: PaginationInfo,
    pub links: PaginationLinks,
}

/// Cursor paging metadata. Cursors are the raw sort-field values of the
/// last/first returned record.
#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPageInfo {
    pub has_next: bool,
    pub has_prev: bool,
    pub next_cursor: Option<serde_json::Value>,
    pub prev_cursor: Option<serde_json::Value>,
    pub limit: u64,
}

/// Offset metadata for the count-free aggregation strategy, plus the
/// over-fetch result.
#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatePageInfo {
    #[serde(flatten)]
    pub info: PaginationInfo,
    pub has_more: bool,
}

pub type OffsetPage<T> = Page<T, PaginationInfo>;
pub type CursorPage<T> = Page<T, CursorPageInfo>;
pub type AggregatePage<T> = Page<T, AggregatePageInfo>;

/// Infinite-scroll page (primary key descending).
#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollPage<T> {
    pub data: Vec<T>,
    pub has_more: bool,
    pub next_cursor: Option<serde_json::Value>,
}

/// One rejected pagination parameter.
#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Offending parameter name (`page` / `limit`).
    pub field: String,
    pub message: String,
}

/// Accumulated outcome of pagination validation; never fails fast.
#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationValidation {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl PaginationValidation {
    pub fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn into_result(self) -> Result<(), Error> {
        if self.is_valid {
            Ok(())
        } else {
            Err(Error::InvalidPagination(self.errors))
        }
    }
}
