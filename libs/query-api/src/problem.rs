use axum::response::{IntoResponse, Response};
use http::{header, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// RFC 9457 content type.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Failure classes a listing endpoint reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemCode {
    InvalidPagination,
    InvalidQuery,
    InvalidFieldOptions,
    StoreError,
}

impl ProblemCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidPagination => "INVALID_PAGINATION",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::InvalidFieldOptions => "INVALID_FIELD_OPTIONS",
            Self::StoreError => "STORE_ERROR",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidPagination => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidQuery => StatusCode::BAD_REQUEST,
            Self::InvalidFieldOptions | Self::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::InvalidPagination => "Invalid Pagination",
            Self::InvalidQuery => "Invalid Query",
            Self::InvalidFieldOptions => "Invalid Field Options",
            Self::StoreError => "Store Error",
        }
    }
}

/// RFC 9457 Problem Details body returned for rejected listing requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(title = "Problem")]
pub struct Problem {
    /// Always `about:blank`; `code` carries the machine-readable class.
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    /// Request path of the rejected listing call.
    pub instance: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub errors: Option<Vec<ValidationError>>,
}

/// One offending query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationError {
    pub detail: String,
    /// JSON Pointer naming the parameter (`/page`, `/limit`).
    pub pointer: String,
}

impl Problem {
    pub fn for_code(code: ProblemCode, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_string(),
            title: code.title().to_string(),
            status: code.status().as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code: code.as_str().to_string(),
            errors: None,
        }
    }

    pub fn at(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn with_errors(mut self, errors: Vec<ValidationError>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Renders a [`Problem`] with its status and the problem content type.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut resp = (status, axum::Json(self.0)).into_response();
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}
