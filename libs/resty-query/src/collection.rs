//! The collection seam: what the query layer needs from a data source.
//!
//! A backend only has to narrow (`filter`), order (`order_by`) and read a
//! bounded window (`fetch`). `MemoryCollection` implements it over a slice.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::convert::Infallible;

use crate::predicate::Predicate;
use crate::sort::SortOrder;
use crate::value::Value;

/// Read access to a record's fields by API name.
pub trait Record {
    fn field(&self, name: &str) -> Option<Value>;
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

impl Record for HashMap<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Where a fetch window begins.
#[derive(Clone, Debug, PartialEq)]
pub enum Start {
    Offset(u64),
    Keyset(Keyset),
}

/// Keyset bound: admits records whose sort tuple is strictly after `values`
/// under `order`.
///
/// For keys `(k1, k2, ..., kn)` this is the chain
/// `k1 > v1 OR (k1 = v1 AND k2 > v2) OR ...`, with `>` flipped to `<` for
/// descending keys.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyset {
    pub order: SortOrder,
    pub values: Vec<Value>,
}

impl Keyset {
    pub fn new(order: SortOrder, values: Vec<Value>) -> Self {
        Self { order, values }
    }

    pub fn admits(&self, record: &dyn Record) -> bool {
        for (key, bound) in self.order.keys().iter().zip(&self.values) {
            let actual = record.field(&key.field).unwrap_or(Value::Null);
            match key.dir.apply(actual.cmp(bound)) {
                Ordering::Greater => return true,
                Ordering::Less => return false,
                Ordering::Equal => continue,
            }
        }
        false
    }
}

/// Filterable, orderable, boundable data source.
///
/// A collection is a query description rather than the data itself; cursor
/// pages clone it to look for records beyond the page edge.
pub trait Collection: Sized + Clone {
    type Item: Record;
    type Error;

    fn filter(self, predicate: Predicate) -> Self;

    fn order_by(self, order: &SortOrder) -> Self;

    /// Read at most `limit` items from `start` in the current order.
    fn fetch(self, start: Start, limit: Option<u64>) -> Result<Vec<Self::Item>, Self::Error>;
}

/// In-memory collection over borrowed records.
#[derive(Debug)]
pub struct MemoryCollection<'a, R> {
    records: Vec<&'a R>,
}

// No `R: Clone` bound, unlike the derive.
impl<R> Clone for MemoryCollection<'_, R> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<'a, R: Record> MemoryCollection<'a, R> {
    pub fn new(records: &'a [R]) -> Self {
        Self {
            records: records.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a, R: Record> Collection for MemoryCollection<'a, R> {
    type Item = &'a R;
    type Error = Infallible;

    fn filter(mut self, predicate: Predicate) -> Self {
        if !predicate.is_always() {
            self.records.retain(|r| predicate.matches(*r));
        }
        self
    }

    fn order_by(mut self, order: &SortOrder) -> Self {
        if !order.is_empty() {
            self.records.sort_by(|a, b| order.compare(*a, *b));
        }
        self
    }

    fn fetch(self, start: Start, limit: Option<u64>) -> Result<Vec<Self::Item>, Self::Error> {
        let records = self.records.into_iter();
        let mut window: Vec<&'a R> = match start {
            Start::Offset(n) => records
                .skip(usize::try_from(n).unwrap_or(usize::MAX))
                .collect(),
            Start::Keyset(keyset) => records.filter(|r| keyset.admits(*r)).collect(),
        };
        if let Some(n) = limit {
            window.truncate(usize::try_from(n).unwrap_or(usize::MAX));
        }
        Ok(window)
    }
}
