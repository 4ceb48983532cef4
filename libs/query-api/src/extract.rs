use std::ops::Deref;

use axum::extract::FromRequestParts;
use http::request::Parts;
use listing_query_core::{PaginationInfo, PaginationMetadata, QueryParams};
use listing_query_engine::{OffsetPagination, Paginator};

use crate::error::query_error_to_problem;
use crate::problem::ProblemResponse;

/// Listing query parameters with validated pagination.
///
/// The route's [`Paginator`] is read from request extensions (install it
/// with `Extension(Paginator::new(cfg))`); without one the default clamp
/// applies. Invalid `page`/`limit` values are rejected with a 422 problem.
///
/// ```ignore
/// async fn list(q: ListingQuery) -> Json<OffsetPage<Listing>> { /* ... */ }
/// ```
#[derive(Debug, Clone)]
pub struct ListingQuery {
    params: QueryParams,
    paginator: Paginator,
    path: String,
}

impl ListingQuery {
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn pagination(&self) -> OffsetPagination {
        self.paginator.build_pagination(&self.params)
    }

    /// Offset info plus `self`/`first`/`last`/`prev`/`next` links relative
    /// to the request path.
    pub fn metadata(&self, info: PaginationInfo) -> PaginationMetadata {
        self.paginator
            .build_pagination_metadata(info, &self.path, &self.params)
    }

    pub fn into_params(self) -> QueryParams {
        self.params
    }
}

impl Deref for ListingQuery {
    type Target = QueryParams;
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

impl<S> FromRequestParts<S> for ListingQuery
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl core::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let path = parts.uri.path().to_string();
            let params = QueryParams::parse(parts.uri.query().unwrap_or_default());
            let paginator = parts
                .extensions
                .get::<Paginator>()
                .copied()
                .unwrap_or_default();

            paginator
                .validate_pagination(&params)
                .into_result()
                .map_err(|e| query_error_to_problem(&e, &path))?;

            Ok(ListingQuery {
                params,
                paginator,
                path,
            })
        }
    }
}
