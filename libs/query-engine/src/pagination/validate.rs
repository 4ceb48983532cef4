use listing_query_core::{PaginationValidation, QueryParams, ValidationIssue};

use super::{Paginator, LIMIT_PARAM, PAGE_PARAM};
use crate::coerce::parse_int_strict;

impl Paginator {
    /// Check `page` / `limit` without clamping. Absent or empty parameters
    /// are fine; violations accumulate rather than failing fast.
    pub fn validate_pagination(&self, params: &QueryParams) -> PaginationValidation {
        let mut errors = Vec::new();

        if let Some(raw) = params.get_non_empty(PAGE_PARAM) {
            if !matches!(parse_int_strict(raw), Some(n) if n >= 1) {
                errors.push(ValidationIssue {
                    field: PAGE_PARAM.to_string(),
                    message: "Page must be a positive integer".to_string(),
                });
            }
        }

        if let Some(raw) = params.get_non_empty(LIMIT_PARAM) {
            let max = self.cfg.max_limit;
            let in_range = matches!(parse_int_strict(raw), Some(n) if n >= 1 && (n as u64) <= max);
            if !in_range {
                errors.push(ValidationIssue {
                    field: LIMIT_PARAM.to_string(),
                    message: format!("Limit must be between 1 and {max}"),
                });
            }
        }

        PaginationValidation::from_issues(errors)
    }
}
