use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::collection::Record;
use crate::error::Error;
use crate::operator::Operator;
use crate::predicate::{FilterFn, Predicate};
use crate::schema::FieldMap;
use crate::value::{FieldKind, Value};

/// A client-facing filter over one record attribute.
///
/// The raw value is split on `,`; each piece is parsed and compared with the
/// operator, and the pieces are ORed.
#[derive(Clone, Debug)]
pub struct FilterField {
    target: String,
    op: Operator,
    kind: Option<FieldKind>,
}

impl FilterField {
    pub fn new(target: impl Into<String>, op: Operator) -> Self {
        Self {
            target: target.into(),
            op,
            kind: None,
        }
    }

    pub fn eq(target: impl Into<String>) -> Self {
        Self::new(target, Operator::Eq)
    }

    /// Parse values with this kind instead of the one registered for the target.
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn build(&self, param: &str, raw: &str, fields: &FieldMap) -> Result<Predicate, Error> {
        let kind = self
            .kind
            .or_else(|| fields.get(&self.target))
            .unwrap_or(FieldKind::Text);

        let mut branches = raw
            .split(',')
            .map(|piece| {
                let value = kind.parse(piece).map_err(|reason| Error::InvalidFilterValue {
                    param: param.to_string(),
                    reason,
                })?;
                Ok(Predicate::Compare {
                    field: self.target.clone(),
                    op: self.op.clone(),
                    value,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(if branches.len() == 1 {
            branches.remove(0)
        } else {
            Predicate::Any(branches)
        })
    }
}

/// Filter evaluated against the whole record with its own value parser.
/// The raw value is parsed once, without comma splitting.
#[derive(Clone)]
pub struct CustomFilter {
    kind: FieldKind,
    func: FilterFn,
}

impl CustomFilter {
    pub fn new<F>(kind: FieldKind, f: F) -> Self
    where
        F: Fn(&dyn Record, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            kind,
            func: Arc::new(f),
        }
    }

    fn build(&self, param: &str, raw: &str) -> Result<Predicate, Error> {
        let value = self
            .kind
            .parse(raw)
            .map_err(|reason| Error::InvalidFilterValue {
                param: param.to_string(),
                reason,
            })?;
        Ok(Predicate::Custom {
            name: param.to_string(),
            func: self.func.clone(),
            value,
        })
    }
}

impl std::fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomFilter")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
enum FilterEntry {
    Field(FilterField),
    Custom(CustomFilter),
}

/// Named filters of one view.
///
/// Registration names use `_`; request names may use `-` in their place, so
/// `filter[size-min]` reaches `size_min`.
#[derive(Clone, Debug, Default)]
pub struct Filtering {
    entries: BTreeMap<String, FilterEntry>,
}

fn normalize(name: &str) -> String {
    name.trim().replace('-', "_")
}

impl Filtering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, param: &str, filter: FilterField) -> Self {
        self.entries
            .insert(normalize(param), FilterEntry::Field(filter));
        self
    }

    /// Equality filter on the field of the same name.
    pub fn eq(self, name: &str) -> Self {
        let filter = FilterField::eq(name);
        self.field(name, filter)
    }

    pub fn custom(mut self, param: &str, filter: CustomFilter) -> Self {
        self.entries
            .insert(normalize(param), FilterEntry::Custom(filter));
        self
    }

    pub fn contains(&self, param: &str) -> bool {
        self.entries.contains_key(&normalize(param))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// AND of one predicate per `filter[...]` parameter.
    pub fn build_predicate(
        &self,
        filters: &BTreeMap<String, String>,
        fields: &FieldMap,
    ) -> Result<Predicate, Error> {
        let mut parts = Vec::with_capacity(filters.len());
        for (param, raw) in filters {
            let entry = match self.entries.get(&normalize(param)) {
                Some(entry) => entry,
                None => {
                    debug!(param = %param, "rejecting unknown filter");
                    return Err(Error::UnknownFilterField(param.clone()));
                }
            };
            let predicate = match entry {
                FilterEntry::Field(f) => f.build(param, raw, fields)?,
                FilterEntry::Custom(c) => c.build(param, raw)?,
            };
            parts.push(predicate);
        }
        Ok(Predicate::All(parts))
    }
}
