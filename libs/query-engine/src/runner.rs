//! Strategy runners: compile the request, fetch through a [`DocumentStore`]
//! and shape the envelope. Round trips per strategy:
//!
//! | strategy     | store calls                      |
//! |--------------|----------------------------------|
//! | offset       | `find_with_count`                |
//! | cursor       | `find`                           |
//! | scroll       | `find`                           |
//! | aggregation  | `aggregate` + separate `count`   |
//! | facet        | `aggregate` (rows + total)       |

use listing_query_core::{
    AggregatePage, CursorPage, FieldOptions, OffsetPage, QueryParams, Result, ScrollPage,
};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::compiler::{build_sort, compile};
use crate::pagination::{process_facet_results, CursorParams, FacetResult, Paginator, ScrollParams};
use crate::pipeline::{build_aggregation_pipeline, PipelineOptions, Stage};
use crate::store::{DocumentStore, FindQuery};

pub async fn fetch_offset_page<S: DocumentStore>(
    store: &S,
    params: &QueryParams,
    options: &FieldOptions,
    paginator: &Paginator,
) -> Result<OffsetPage<S::Row>> {
    let pagination = paginator.build_pagination(params);
    let query = FindQuery::new(compile(params, options))
        .sorted(build_sort(params))
        .window(pagination.skip, pagination.limit);

    let (rows, total) = store.find_with_count(&query).await?;
    debug!(page = pagination.page, rows = rows.len(), total, "offset page fetched");
    Ok(OffsetPage::new(rows, pagination.info(total)))
}

/// Cursor page over the compiled filter; the cursor clause is conjoined
/// to it and the store is asked for one row beyond `limit`.
pub async fn fetch_cursor_page<S: DocumentStore>(
    store: &S,
    params: &QueryParams,
    options: &FieldOptions,
    cursor: &CursorParams,
) -> Result<CursorPage<S::Row>> {
    let filter = cursor.build_cursor_query(compile(params, options));
    let query = FindQuery::new(filter)
        .sorted(cursor.sort())
        .window(0, cursor.one_extra().fetch_limit());

    let rows = store.find(&query).await?;
    debug!(rows = rows.len(), limit = cursor.limit, "cursor page fetched");
    Ok(cursor.process_cursor_results(rows))
}

/// Infinite-scroll page. Only the primary-key clause applies.
pub async fn fetch_scroll_page<S: DocumentStore>(
    store: &S,
    scroll: &ScrollParams,
    id_field: &str,
) -> Result<ScrollPage<S::Row>> {
    let query = FindQuery::new(scroll.build_scroll_query(id_field))
        .sorted(scroll.sort(id_field))
        .window(0, scroll.one_extra().fetch_limit());

    let rows = store.find(&query).await?;
    debug!(rows = rows.len(), limit = scroll.limit, "scroll page fetched");
    Ok(scroll.process_scroll_results(rows, id_field))
}

/// Count-free aggregation page followed by an independent total count.
pub async fn fetch_aggregation_page<S: DocumentStore>(
    store: &S,
    params: &QueryParams,
    options: &FieldOptions,
    paginator: &Paginator,
) -> Result<AggregatePage<JsonValue>> {
    let filter = compile(params, options);
    let sort = build_sort(params);

    let mut pipeline = Vec::new();
    if !filter.is_match_all() {
        pipeline.push(Stage::Match(filter.clone()));
    }
    if !sort.is_empty() {
        pipeline.push(Stage::Sort(sort));
    }
    pipeline.extend(paginator.build_aggregation_pagination(params));

    let rows = store.aggregate(&pipeline).await?;
    let total = store.count(&filter).await?;

    let pagination = paginator.build_pagination(params);
    debug!(page = pagination.page, rows = rows.len(), total, "aggregation page fetched");
    Ok(paginator.process_aggregation_results(rows, &pagination, total))
}

/// Rows and total in one combined pipeline.
pub async fn fetch_facet_page<S: DocumentStore>(
    store: &S,
    params: &QueryParams,
    options: &FieldOptions,
    extras: &PipelineOptions,
    paginator: &Paginator,
) -> Result<OffsetPage<JsonValue>> {
    let pipeline = build_aggregation_pipeline(params, options, extras, paginator);
    let raw = store.aggregate(&pipeline).await?;

    let pagination = paginator.build_pagination(params);
    let facet = FacetResult::from_documents(raw);
    debug!(page = pagination.page, rows = facet.data.len(), total = facet.total_count, "facet page fetched");
    Ok(process_facet_results(facet, &pagination))
}
