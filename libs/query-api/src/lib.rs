//! axum integration for listing queries: a validating extractor and
//! RFC 9457 problem responses.

pub mod error;
pub mod extract;
pub mod problem;

pub use error::query_error_to_problem;
pub use extract::ListingQuery;
pub use problem::{
    Problem, ProblemCode, ProblemResponse, ValidationError, APPLICATION_PROBLEM_JSON,
};
