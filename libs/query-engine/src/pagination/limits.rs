use listing_query_core::QueryParams;

use super::{PaginationConfig, LIMIT_PARAM, PAGE_PARAM};
use crate::coerce::parse_int_prefix;

/// `limit` clamped to `[1, max_limit]`; default when absent or non-numeric.
pub fn clamp_limit(raw: Option<&str>, cfg: &PaginationConfig) -> u64 {
    let max = cfg.max_limit.clamp(1, i64::MAX as u64) as i64;
    match raw.and_then(parse_int_prefix) {
        Some(n) => n.clamp(1, max) as u64,
        None => cfg.default_limit,
    }
}

/// `page` clamped to `>= 1`; default when absent or non-numeric.
pub fn clamp_page(raw: Option<&str>, cfg: &PaginationConfig) -> u64 {
    match raw.and_then(parse_int_prefix) {
        Some(n) => n.max(1) as u64,
        None => cfg.default_page,
    }
}

pub(crate) fn limit_from(params: &QueryParams, cfg: &PaginationConfig) -> u64 {
    clamp_limit(params.get_str(LIMIT_PARAM), cfg)
}

pub(crate) fn page_from(params: &QueryParams, cfg: &PaginationConfig) -> u64 {
    clamp_page(params.get_str(PAGE_PARAM), cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> PaginationConfig {
        PaginationConfig {
            default_limit: 20,
            max_limit: 100,
            default_page: 1,
        }
    }

    #[test]
    fn limit_clamps_to_nearest_boundary() {
        assert_eq!(clamp_limit(Some("0"), &cfg()), 1);
        assert_eq!(clamp_limit(Some("-7"), &cfg()), 1);
        assert_eq!(clamp_limit(Some("500"), &cfg()), 100);
        assert_eq!(clamp_limit(Some("100"), &cfg()), 100);
        assert_eq!(clamp_limit(Some("1"), &cfg()), 1);
        assert_eq!(clamp_limit(Some("35"), &cfg()), 35);
    }

    #[test]
    fn limit_defaults_when_missing_or_garbage() {
        assert_eq!(clamp_limit(None, &cfg()), 20);
        assert_eq!(clamp_limit(Some("ten"), &cfg()), 20);
        assert_eq!(clamp_limit(Some(""), &cfg()), 20);
        assert_eq!(clamp_limit(Some("15items"), &cfg()), 15);
    }

    #[test]
    fn page_clamps_to_one() {
        assert_eq!(clamp_page(Some("0"), &cfg()), 1);
        assert_eq!(clamp_page(Some("-3"), &cfg()), 1);
        assert_eq!(clamp_page(Some("4"), &cfg()), 4);
        assert_eq!(clamp_page(None, &cfg()), 1);
        assert_eq!(clamp_page(Some("x"), &cfg()), 1);
    }
}
