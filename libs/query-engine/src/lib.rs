//! Listing query engine: compiles query parameters into filter expressions,
//! paginates with offset, cursor, infinite-scroll, aggregation and facet
//! strategies, and renders everything as document-store JSON.

pub mod coerce;
pub mod compiler;
pub mod document;
pub mod pagination;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod store;

pub use compiler::{apply_operator, build_sort, compile};
pub use document::ToDocument;
pub use pagination::{
    clamp_limit, clamp_page, process_facet_results, CursorDirection, CursorParams, FacetResult,
    OffsetPagination, OneExtra, PaginationConfig, Paginator, ScrollParams,
};
pub use pipeline::{build_aggregation_pipeline, PipelineOptions, Stage};
pub use record::Record;
pub use runner::{
    fetch_aggregation_page, fetch_cursor_page, fetch_facet_page, fetch_offset_page,
    fetch_scroll_page,
};
pub use store::{DocumentStore, FindQuery, MemoryStore};
