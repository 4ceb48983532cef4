use listing_query_core::{
    ParamValue, PaginationInfo, PaginationLinks, PaginationMetadata, QueryParams,
};
use serde::{Deserialize, Serialize};

use super::limits::{limit_from, page_from};
use super::{Paginator, PAGE_PARAM};

/// Offset paging state. `skip == (page - 1) * limit` always.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPagination {
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

impl OffsetPagination {
    /// Build from already-clamped values.
    pub fn new(page: u64, limit: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            skip: (page - 1).saturating_mul(limit),
        }
    }

    /// Alias of `skip` for SQL-flavoured callers.
    pub fn offset(&self) -> u64 {
        self.skip
    }

    /// Navigation metadata for a result set of `total_count` records.
    pub fn info(&self, total_count: u64) -> PaginationInfo {
        let total_pages = total_count.div_ceil(self.limit);
        let has_next = self.page < total_pages;
        let has_prev = self.page > 1;
        PaginationInfo {
            current_page: self.page,
            total_pages,
            total_count,
            limit: self.limit,
            has_next,
            has_prev,
            next_page: has_next.then(|| self.page + 1),
            prev_page: has_prev.then(|| self.page - 1),
            start_index: self.skip.saturating_add(1),
            end_index: self.skip.saturating_add(self.limit).min(total_count),
        }
    }
}

impl Paginator {
    /// Offset paging parameters from `page` / `limit`.
    pub fn build_pagination(&self, params: &QueryParams) -> OffsetPagination {
        OffsetPagination::new(page_from(params, &self.cfg), limit_from(params, &self.cfg))
    }

    pub fn build_pagination_info(
        &self,
        pagination: &OffsetPagination,
        total_count: u64,
    ) -> PaginationInfo {
        pagination.info(total_count)
    }

    /// Navigation links built by substituting `page` into `base_url` plus
    /// `params`. An existing `page` key is replaced in place. `prev`/`next`
    /// are omitted when not applicable; `last` never points below page 1.
    pub fn build_pagination_links(
        &self,
        info: &PaginationInfo,
        base_url: &str,
        params: &QueryParams,
    ) -> PaginationLinks {
        let url_for = |page: u64| {
            let mut q = params.clone();
            q.set(PAGE_PARAM, ParamValue::Single(page.to_string()));
            format!("{}?{}", base_url, q.to_query_string())
        };

        PaginationLinks {
            self_link: url_for(info.current_page),
            first: url_for(1),
            last: url_for(info.total_pages.max(1)),
            prev: info.prev_page.map(url_for),
            next: info.next_page.map(url_for),
        }
    }

    pub fn build_pagination_metadata(
        &self,
        info: PaginationInfo,
        base_url: &str,
        params: &QueryParams,
    ) -> PaginationMetadata {
        let links = self.build_pagination_links(&info, base_url, params);
        PaginationMetadata { info, links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PaginationConfig;

    fn paginator() -> Paginator {
        Paginator::new(PaginationConfig::default())
    }

    #[test]
    fn skip_follows_page_and_limit() {
        let p = paginator().build_pagination(&QueryParams::parse("page=3&limit=25"));
        assert_eq!(p, OffsetPagination { page: 3, limit: 25, skip: 50 });
        assert_eq!(p.offset(), 50);

        let p = paginator().build_pagination(&QueryParams::new());
        assert_eq!(p, OffsetPagination { page: 1, limit: 20, skip: 0 });

        let p = paginator().build_pagination(&QueryParams::parse("page=-2&limit=500"));
        assert_eq!(p, OffsetPagination { page: 1, limit: 100, skip: 0 });
    }

    #[test]
    fn last_page_of_ninety_five() {
        let state = OffsetPagination::new(5, 20);
        let info = paginator().build_pagination_info(&state, 95);
        assert_eq!(info.total_pages, 5);
        assert!(!info.has_next);
        assert!(info.has_prev);
        assert_eq!(info.start_index, 81);
        assert_eq!(info.end_index, 95);
        assert_eq!(info.next_page, None);
        assert_eq!(info.prev_page, Some(4));
    }

    #[test]
    fn first_page_has_no_prev() {
        let info = OffsetPagination::new(1, 20).info(95);
        assert!(info.has_next);
        assert!(!info.has_prev);
        assert_eq!(info.next_page, Some(2));
        assert_eq!(info.end_index, 20);
    }

    #[test]
    fn empty_result_set_is_well_formed() {
        let info = OffsetPagination::new(1, 20).info(0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
        assert!(!info.has_prev);
        assert_eq!(info.end_index, 0);
    }

    #[test]
    fn links_substitute_page() {
        let params = QueryParams::parse("country=India&page=2&limit=20");
        let info = OffsetPagination::new(2, 20).info(95);
        let links =
            paginator().build_pagination_links(&info, "https://stays.test/listings", &params);

        assert_eq!(
            links.self_link,
            "https://stays.test/listings?country=India&page=2&limit=20"
        );
        assert_eq!(
            links.first,
            "https://stays.test/listings?country=India&page=1&limit=20"
        );
        assert_eq!(
            links.last,
            "https://stays.test/listings?country=India&page=5&limit=20"
        );
        assert_eq!(
            links.prev.as_deref(),
            Some("https://stays.test/listings?country=India&page=1&limit=20")
        );
        assert_eq!(
            links.next.as_deref(),
            Some("https://stays.test/listings?country=India&page=3&limit=20")
        );
    }

    #[test]
    fn links_omit_prev_and_next_on_single_page() {
        let info = OffsetPagination::new(1, 20).info(5);
        let links = paginator().build_pagination_links(&info, "/listings", &QueryParams::new());
        assert_eq!(links.self_link, "/listings?page=1");
        assert!(links.prev.is_none());
        assert!(links.next.is_none());

        let json = serde_json::to_value(&links).unwrap();
        assert!(json.get("prev").is_none());
        assert!(json.get("next").is_none());
        assert_eq!(json["self"], "/listings?page=1");
    }

    #[test]
    fn metadata_flattens_info_next_to_links() {
        let info = OffsetPagination::new(1, 10).info(30);
        let meta = paginator().build_pagination_metadata(info, "/l", &QueryParams::new());
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["links"]["next"], "/l?page=2");
    }
}
