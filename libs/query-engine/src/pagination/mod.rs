//! Pagination engine: offset, cursor, infinite-scroll and aggregation
//! strategies over one shared `page`/`limit` clamping rule.

mod aggregate;
mod cursor;
mod fetch;
mod limits;
mod offset;
mod scroll;
mod validate;

pub use aggregate::{process_facet_results, FacetResult};
pub use cursor::{CursorDirection, CursorParams};
pub use fetch::OneExtra;
pub use limits::{clamp_limit, clamp_page};
pub use offset::OffsetPagination;
pub use scroll::ScrollParams;

use serde::{Deserialize, Serialize};

pub const PAGE_PARAM: &str = "page";
pub const LIMIT_PARAM: &str = "limit";
pub const CURSOR_PARAM: &str = "cursor";
pub const DIRECTION_PARAM: &str = "direction";
pub const LAST_ID_PARAM: &str = "lastId";

/// Clamping constants shared by every strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
    pub default_page: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            default_page: 1,
        }
    }
}

impl PaginationConfig {
    /// Repair a hand-written config so the clamping invariants hold:
    /// `max_limit >= 1`, `default_limit` within `[1, max_limit]`, `default_page >= 1`.
    pub fn normalized(self) -> Self {
        let max_limit = self.max_limit.max(1);
        Self {
            max_limit,
            default_limit: self.default_limit.clamp(1, max_limit),
            default_page: self.default_page.max(1),
        }
    }
}

/// Entry point to the pagination strategies for one route configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Paginator {
    cfg: PaginationConfig,
}

impl Paginator {
    pub fn new(cfg: PaginationConfig) -> Self {
        Self {
            cfg: cfg.normalized(),
        }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.cfg
    }

    pub fn max_limit(&self) -> u64 {
        self.cfg.max_limit
    }
}
