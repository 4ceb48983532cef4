use listing_query_core::{Error, ValidationIssue};
use tracing::error;

use crate::problem::{Problem, ProblemCode, ProblemResponse, ValidationError};

/// Map a listing query error to an RFC 9457 response.
pub fn query_error_to_problem(e: &Error, instance: &str) -> ProblemResponse {
    let problem = match e {
        Error::InvalidPagination(issues) => Problem::for_code(
            ProblemCode::InvalidPagination,
            "One or more pagination parameters are invalid",
        )
        .with_errors(issues.iter().map(issue_to_error).collect()),
        Error::InvalidQuery(msg) => {
            Problem::for_code(ProblemCode::InvalidQuery, format!("invalid query string: {msg}"))
        }
        // Route misconfiguration, not the caller's fault.
        Error::InvalidFieldOptions(msg) => {
            error!(instance, error = %msg, "route declares invalid field options");
            Problem::for_code(
                ProblemCode::InvalidFieldOptions,
                "The listing route is misconfigured",
            )
        }
        Error::Store(msg) => {
            error!(instance, error = %msg, "document store failure");
            Problem::for_code(ProblemCode::StoreError, "The listing could not be fetched")
        }
    };
    problem.at(instance).into()
}

fn issue_to_error(issue: &ValidationIssue) -> ValidationError {
    ValidationError {
        detail: issue.message.clone(),
        pointer: format!("/{}", issue.field),
    }
}
