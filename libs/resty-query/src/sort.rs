use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::Record;
use crate::error::Error;
use crate::value::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    /// Apply this direction to a natural ordering.
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Desc,
        }
    }
}

/// Ordered list of sort keys; the first entry is the primary key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortOrder(pub Vec<SortKey>);

impl SortOrder {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|k| k.field == field)
    }

    /// Parse `"field,-field2"`: leading `-` is descending, a leading `+` or
    /// no sign is ascending. Empty segments are skipped, a lone sign is rejected.
    pub fn from_signed_tokens(signed: &str) -> Result<Self, Error> {
        let mut keys = Vec::new();
        for seg in signed.split(',') {
            let seg = seg.trim();
            if seg.is_empty() {
                continue;
            }
            let (dir, name) = match seg.as_bytes()[0] {
                b'-' => (SortDir::Desc, &seg[1..]),
                b'+' => (SortDir::Asc, &seg[1..]),
                _ => (SortDir::Asc, seg),
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::InvalidSortField(seg.to_string()));
            }
            keys.push(SortKey {
                field: name.to_string(),
                dir,
            });
        }
        if keys.is_empty() {
            return Err(Error::InvalidSortField(signed.trim().to_string()));
        }
        Ok(SortOrder(keys))
    }

    /// Inverse of `from_signed_tokens`, in the query-string form (no `+`).
    pub fn to_signed_tokens(&self) -> String {
        self.0
            .iter()
            .map(|k| match k.dir {
                SortDir::Asc => k.field.clone(),
                SortDir::Desc => format!("-{}", k.field),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Append the tiebreaker key unless the field is already present; an
    /// explicit occurrence keeps its own direction.
    pub fn ensure_tiebreaker(mut self, tiebreaker: &str, dir: SortDir) -> Self {
        if !self.contains(tiebreaker) {
            self.0.push(SortKey {
                field: tiebreaker.to_string(),
                dir,
            });
        }
        self
    }

    /// Same keys with every direction flipped.
    pub fn reversed(&self) -> Self {
        SortOrder(
            self.0
                .iter()
                .map(|k| SortKey {
                    field: k.field.clone(),
                    dir: k.dir.reverse(),
                })
                .collect(),
        )
    }

    /// Keep only the first occurrence of each field.
    pub fn dedup(self) -> Self {
        let mut out: Vec<SortKey> = Vec::with_capacity(self.0.len());
        for key in self.0 {
            if !out.iter().any(|k| k.field == key.field) {
                out.push(key);
            }
        }
        SortOrder(out)
    }

    pub fn compare(&self, a: &dyn Record, b: &dyn Record) -> Ordering {
        for key in &self.0 {
            let left = a.field(&key.field).unwrap_or(Value::Null);
            let right = b.field(&key.field).unwrap_or(Value::Null);
            let ord = key.dir.apply(left.cmp(&right));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Sort-key tuple of a record, in key order.
    pub fn values_of(&self, record: &dyn Record) -> Vec<Value> {
        self.0
            .iter()
            .map(|k| record.field(&k.field).unwrap_or(Value::Null))
            .collect()
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(none)");
        }
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|k| {
                let dir = match k.dir {
                    SortDir::Asc => "asc",
                    SortDir::Desc => "desc",
                };
                format!("{} {}", k.field, dir)
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Per-view sort configuration: the allow-list of sortable fields and the
/// order used when the client does not send `sort`.
#[derive(Clone, Debug, Default)]
pub struct Sorting {
    allowed: Vec<String>,
    default: SortOrder,
}

impl Sorting {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            default: SortOrder::empty(),
        }
    }

    pub fn with_default(mut self, order: SortOrder) -> Self {
        self.default = order;
        self
    }

    pub fn is_allowed(&self, field: &str) -> bool {
        self.allowed.iter().any(|f| f == field)
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn default_order(&self) -> &SortOrder {
        &self.default
    }

    /// Parse the `sort` parameter against the allow-list. Absent or blank →
    /// the default order.
    pub fn parse(&self, raw: Option<&str>) -> Result<SortOrder, Error> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(self.default.clone()),
            Some(raw) => raw,
        };

        let order = SortOrder::from_signed_tokens(raw)?;
        if let Some(key) = order.0.iter().find(|k| !self.is_allowed(&k.field)) {
            tracing::debug!(field = %key.field, "rejecting sort field outside allow-list");
            return Err(Error::InvalidSortField(key.field.clone()));
        }
        Ok(order.dedup())
    }
}
