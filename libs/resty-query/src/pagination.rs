//! Pagination strategies and the window plan each produces from `page[...]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Error};
use crate::sort::{SortDir, SortKey};
use crate::value::Value;

/// Page-size bounds: `default` when the client sends nothing, `max` as the
/// hard ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitCfg {
    pub default: u64,
    pub max: u64,
}

impl Default for LimitCfg {
    fn default() -> Self {
        Self {
            default: 25,
            max: 100,
        }
    }
}

impl LimitCfg {
    pub fn new(default: u64, max: u64) -> Self {
        Self { default, max }
    }

    /// Like `new`, but rejects bounds that break `1 <= default <= max`.
    pub fn try_new(default: u64, max: u64) -> Result<Self, ConfigError> {
        let cfg = Self::new(default, max);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default == 0 || self.default > self.max {
            return Err(ConfigError::InvalidPageSize {
                default: self.default,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Resolve the page size sent under `page[<param>]`.
    pub fn resolve(&self, param: &str, raw: Option<&str>) -> Result<u64, Error> {
        let Some(raw) = raw else {
            // unvalidated bounds still never yield 0 or more than max
            return Ok(self.default.min(self.max).max(1));
        };
        let requested = parse_count(param, raw)?;
        if requested == 0 {
            return Err(Error::InvalidPageParameter {
                param: param.to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }
        if requested > self.max {
            debug!(requested, max = self.max, "page size over limit");
            return Err(Error::PageSizeExceeded {
                requested,
                max: self.max,
            });
        }
        Ok(requested)
    }
}

fn parse_count(param: &str, raw: &str) -> Result<u64, Error> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| Error::InvalidPageParameter {
            param: param.to_string(),
            reason: format!("'{raw}' is not a non-negative integer"),
        })
}

fn page_param<'a>(page: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    page.get(name).map(String::as_str)
}

/// Where a cursor-mode page starts.
#[derive(Clone, Debug, PartialEq)]
pub enum CursorPosition {
    First,
    After(String),
    Before(String),
}

/// Bounded window requested by the client, before cursor tokens are decoded.
#[derive(Clone, Debug, PartialEq)]
pub enum PageRequest {
    Unbounded,
    Offset { offset: u64, limit: u64 },
    Cursor { limit: u64, position: CursorPosition },
}

/// `page[limit]` + `page[offset]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LimitOffsetPagination {
    pub limit: LimitCfg,
}

impl LimitOffsetPagination {
    pub fn new(limit: LimitCfg) -> Self {
        Self { limit }
    }

    pub fn parse(&self, page: &BTreeMap<String, String>) -> Result<PageRequest, Error> {
        let limit = self.limit.resolve("limit", page_param(page, "limit"))?;
        let offset = match page_param(page, "offset") {
            Some(raw) => parse_count("offset", raw)?,
            None => 0,
        };
        Ok(PageRequest::Offset { offset, limit })
    }
}

/// `page[size]` + 1-based `page[number]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PagePagination {
    pub size: LimitCfg,
}

impl PagePagination {
    pub fn new(size: LimitCfg) -> Self {
        Self { size }
    }

    pub fn parse(&self, page: &BTreeMap<String, String>) -> Result<PageRequest, Error> {
        let size = self.size.resolve("size", page_param(page, "size"))?;
        let number = match page_param(page, "number") {
            Some(raw) => parse_count("number", raw)?,
            None => 1,
        };
        if number == 0 {
            return Err(Error::InvalidPageParameter {
                param: "number".to_string(),
                reason: "page numbers start at 1".to_string(),
            });
        }
        let offset = (number - 1)
            .checked_mul(size)
            .ok_or_else(|| Error::InvalidPageParameter {
                param: "number".to_string(),
                reason: "page number is out of range".to_string(),
            })?;
        Ok(PageRequest::Offset {
            offset,
            limit: size,
        })
    }
}

/// Keyset pagination: `page[limit]` with at most one of `page[cursor]`,
/// `page[after]` (forward) or `page[before]` (backward).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayCursorPagination {
    pub limit: LimitCfg,
    pub tiebreaker: SortKey,
}

impl Default for RelayCursorPagination {
    fn default() -> Self {
        Self {
            limit: LimitCfg::default(),
            tiebreaker: SortKey::asc("id"),
        }
    }
}

impl RelayCursorPagination {
    pub fn new(limit: LimitCfg) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Tie-break key appended to every cursor-mode order. Must be unique per record.
    pub fn with_tiebreaker(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.tiebreaker = SortKey {
            field: field.into(),
            dir,
        };
        self
    }

    pub fn parse(&self, page: &BTreeMap<String, String>) -> Result<PageRequest, Error> {
        let limit = self.limit.resolve("limit", page_param(page, "limit"))?;

        let given: Vec<(&str, &str)> = ["cursor", "after", "before"]
            .into_iter()
            .filter_map(|name| page_param(page, name).map(|token| (name, token)))
            .collect();

        let position = match given.as_slice() {
            [] => CursorPosition::First,
            [("before", token)] => CursorPosition::Before((*token).to_string()),
            [(_, token)] => CursorPosition::After((*token).to_string()),
            _ => return Err(Error::ConflictingPaginationParameters),
        };
        Ok(PageRequest::Cursor { limit, position })
    }
}

/// Pagination choice of one view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Pagination {
    #[default]
    None,
    LimitOffset(LimitOffsetPagination),
    Page(PagePagination),
    RelayCursor(RelayCursorPagination),
}

impl Pagination {
    /// Page-size bounds of the chosen strategy, if it has any.
    pub fn limits(&self) -> Option<&LimitCfg> {
        match self {
            Pagination::None => None,
            Pagination::LimitOffset(p) => Some(&p.limit),
            Pagination::Page(p) => Some(&p.size),
            Pagination::RelayCursor(p) => Some(&p.limit),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits().map_or(Ok(()), LimitCfg::validate)
    }

    pub fn parse(&self, page: &BTreeMap<String, String>) -> Result<PageRequest, Error> {
        match self {
            Pagination::None => Ok(PageRequest::Unbounded),
            Pagination::LimitOffset(p) => p.parse(page),
            Pagination::Page(p) => p.parse(page),
            Pagination::RelayCursor(p) => p.parse(page),
        }
    }
}

impl From<LimitOffsetPagination> for Pagination {
    fn from(p: LimitOffsetPagination) -> Self {
        Pagination::LimitOffset(p)
    }
}

impl From<PagePagination> for Pagination {
    fn from(p: PagePagination) -> Self {
        Pagination::Page(p)
    }
}

impl From<RelayCursorPagination> for Pagination {
    fn from(p: RelayCursorPagination) -> Self {
        Pagination::RelayCursor(p)
    }
}

/// Decoded window ready for execution.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PagePlan {
    Unbounded,
    Offset { offset: u64, limit: u64 },
    Cursor { limit: u64, position: KeysetPosition },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum KeysetPosition {
    First,
    After(Vec<Value>),
    Before(Vec<Value>),
}

/// Serde form of `Pagination`, read from the view configuration.
///
/// ```yaml
/// pagination:
///   kind: relay_cursor
///   default_limit: 20
///   max_limit: 100
///   tiebreaker: id
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaginationConfig {
    #[default]
    None,
    Page {
        #[serde(default = "default_limit")]
        default_size: u64,
        #[serde(default = "max_limit")]
        max_size: u64,
    },
    LimitOffset {
        #[serde(default = "default_limit")]
        default_limit: u64,
        #[serde(default = "max_limit")]
        max_limit: u64,
    },
    RelayCursor {
        #[serde(default = "default_limit")]
        default_limit: u64,
        #[serde(default = "max_limit")]
        max_limit: u64,
        #[serde(default = "default_tiebreaker")]
        tiebreaker: String,
        #[serde(default)]
        tiebreaker_dir: SortDir,
    },
}

fn default_limit() -> u64 {
    LimitCfg::default().default
}

fn max_limit() -> u64 {
    LimitCfg::default().max
}

fn default_tiebreaker() -> String {
    "id".to_string()
}

impl From<PaginationConfig> for Pagination {
    fn from(cfg: PaginationConfig) -> Self {
        match cfg {
            PaginationConfig::None => Pagination::None,
            PaginationConfig::Page {
                default_size,
                max_size,
            } => Pagination::Page(PagePagination::new(LimitCfg::new(default_size, max_size))),
            PaginationConfig::LimitOffset {
                default_limit,
                max_limit,
            } => Pagination::LimitOffset(LimitOffsetPagination::new(LimitCfg::new(
                default_limit,
                max_limit,
            ))),
            PaginationConfig::RelayCursor {
                default_limit,
                max_limit,
                tiebreaker,
                tiebreaker_dir,
            } => Pagination::RelayCursor(
                RelayCursorPagination::new(LimitCfg::new(default_limit, max_limit))
                    .with_tiebreaker(tiebreaker, tiebreaker_dir),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn page_number_to_offset() {
        let p = PagePagination::new(LimitCfg::new(2, 10));
        assert_eq!(
            p.parse(&page(&[("number", "3")])).unwrap(),
            PageRequest::Offset {
                offset: 4,
                limit: 2
            }
        );
        assert_eq!(
            p.parse(&page(&[])).unwrap(),
            PageRequest::Offset {
                offset: 0,
                limit: 2
            }
        );
    }

    #[test]
    fn page_number_zero_or_garbage() {
        let p = PagePagination::default();
        assert!(matches!(
            p.parse(&page(&[("number", "0")])),
            Err(Error::InvalidPageParameter { param, .. }) if param == "number"
        ));
        assert!(matches!(
            p.parse(&page(&[("number", "two")])),
            Err(Error::InvalidPageParameter { .. })
        ));
    }

    #[test]
    fn size_limits() {
        let p = PagePagination::new(LimitCfg::new(10, 50));
        assert!(matches!(
            p.parse(&page(&[("size", "51")])),
            Err(Error::PageSizeExceeded {
                requested: 51,
                max: 50
            })
        ));
        assert!(matches!(
            p.parse(&page(&[("size", "0")])),
            Err(Error::InvalidPageParameter { param, .. }) if param == "size"
        ));
        assert!(matches!(
            p.parse(&page(&[("size", "-1")])),
            Err(Error::InvalidPageParameter { .. })
        ));
    }

    #[test]
    fn limit_bounds_are_validated() {
        assert!(LimitCfg::try_new(1, 1).is_ok());
        assert_eq!(
            LimitCfg::try_new(0, 10),
            Err(ConfigError::InvalidPageSize { default: 0, max: 10 })
        );
        assert_eq!(
            LimitCfg::try_new(200, 50),
            Err(ConfigError::InvalidPageSize {
                default: 200,
                max: 50
            })
        );
        assert!(Pagination::None.validate().is_ok());
        assert!(Pagination::from(PaginationConfig::Page {
            default_size: 500,
            max_size: 10
        })
        .validate()
        .is_err());
    }

    #[test]
    fn unvalidated_default_stays_within_bounds() {
        assert_eq!(LimitCfg::new(0, 10).resolve("limit", None), Ok(1));
        assert_eq!(LimitCfg::new(200, 50).resolve("limit", None), Ok(50));
    }

    #[test]
    fn limit_offset() {
        let p = LimitOffsetPagination::new(LimitCfg::new(5, 20));
        assert_eq!(
            p.parse(&page(&[("offset", "7"), ("limit", "3")])).unwrap(),
            PageRequest::Offset {
                offset: 7,
                limit: 3
            }
        );
    }

    #[test]
    fn cursor_positions() {
        let p = RelayCursorPagination::default();
        assert_eq!(
            p.parse(&page(&[])).unwrap(),
            PageRequest::Cursor {
                limit: 25,
                position: CursorPosition::First
            }
        );
        assert_eq!(
            p.parse(&page(&[("cursor", "abc")])).unwrap(),
            PageRequest::Cursor {
                limit: 25,
                position: CursorPosition::After("abc".to_string())
            }
        );
        assert_eq!(
            p.parse(&page(&[("after", "abc")])).unwrap(),
            PageRequest::Cursor {
                limit: 25,
                position: CursorPosition::After("abc".to_string())
            }
        );
        assert_eq!(
            p.parse(&page(&[("before", "abc"), ("limit", "2")])).unwrap(),
            PageRequest::Cursor {
                limit: 2,
                position: CursorPosition::Before("abc".to_string())
            }
        );
    }

    #[test]
    fn conflicting_cursor_params() {
        let p = RelayCursorPagination::default();
        assert!(matches!(
            p.parse(&page(&[("after", "a"), ("before", "b")])),
            Err(Error::ConflictingPaginationParameters)
        ));
        assert!(matches!(
            p.parse(&page(&[("cursor", "a"), ("after", "a")])),
            Err(Error::ConflictingPaginationParameters)
        ));
    }

    #[test]
    fn config_from_yaml() {
        let cfg: PaginationConfig = serde_yaml::from_str(
            "kind: relay_cursor\nmax_limit: 50\ntiebreaker: uid\ntiebreaker_dir: desc\n",
        )
        .unwrap();
        let pagination = Pagination::from(cfg);
        assert_eq!(
            pagination,
            Pagination::RelayCursor(
                RelayCursorPagination::new(LimitCfg::new(25, 50))
                    .with_tiebreaker("uid", SortDir::Desc)
            )
        );

        let cfg: PaginationConfig = serde_yaml::from_str("kind: none").unwrap();
        assert_eq!(Pagination::from(cfg), Pagination::None);
    }
}
