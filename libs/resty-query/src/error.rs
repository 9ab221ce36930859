use thiserror::Error;

use crate::value::FieldKind;

/// Client-input failures. All of them are raised while preparing a query,
/// before the collection is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown filter field: {0}")]
    UnknownFilterField(String),

    #[error("invalid value for filter[{param}]: {reason}")]
    InvalidFilterValue { param: String, reason: String },

    #[error("unsupported sort field: {0}")]
    InvalidSortField(String),

    #[error("invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),

    #[error("only one of page[cursor], page[after] and page[before] may be given")]
    ConflictingPaginationParameters,

    #[error("page size {requested} exceeds the maximum of {max}")]
    PageSizeExceeded { requested: u64, max: u64 },

    #[error("invalid page[{param}]: {reason}")]
    InvalidPageParameter { param: String, reason: String },
}

impl Error {
    /// Query parameter the error points at, when there is a single one.
    pub fn param(&self) -> Option<String> {
        match self {
            Error::UnknownFilterField(p) | Error::InvalidFilterValue { param: p, .. } => {
                Some(format!("filter[{p}]"))
            }
            Error::InvalidSortField(_) => Some("sort".to_string()),
            Error::InvalidPageParameter { param, .. } => Some(format!("page[{param}]")),
            Error::PageSizeExceeded { .. } => None,
            Error::InvalidCursor(_) | Error::ConflictingPaginationParameters => None,
        }
    }
}

/// Why a cursor token was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CursorError {
    #[error("invalid base64url encoding")]
    InvalidBase64,

    #[error("malformed JSON payload")]
    InvalidJson,

    #[error("unsupported cursor version")]
    InvalidVersion,

    #[error("expected {expected} keys, got {got}")]
    KeyCountMismatch { expected: usize, got: usize },

    #[error("key {index} is not a {expected:?} value")]
    KindMismatch { index: usize, expected: FieldKind },
}

/// Invalid view configuration, detected when a `QueryBuilder` is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("page size default {default} must be between 1 and the maximum {max}")]
    InvalidPageSize { default: u64, max: u64 },

    #[error("tie-break field '{0}' is not a known field")]
    UnknownTiebreaker(String),

    #[error("invalid default sort: {0}")]
    DefaultSort(#[source] Error),
}

/// Failure of a full fetch: either the request was invalid or the collection
/// failed while executing. Collection errors are passed through untouched.
#[derive(Debug, Error)]
pub enum FetchError<E> {
    #[error(transparent)]
    Query(#[from] Error),

    #[error("collection error: {0}")]
    Collection(E),
}
