//! axum integration for `resty-query`: the `ListQuery` extractor, RFC 9457
//! problem mapping for query errors, and the `ListResponse` body.

pub mod error;
pub mod extract;
pub mod problem;
pub mod response;

pub use error::{fetch_error_to_problem, query_error_to_problem};
pub use extract::ListQuery;
pub use problem::{bad_request, internal_error, Problem, ProblemResponse, ValidationError};
pub use response::ListResponse;
