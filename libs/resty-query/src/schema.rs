use std::collections::HashMap;

use crate::value::{FieldKind, Value};

/// API field name → kind. Acts as the view's schema: every filter target,
/// sort key and cursor slot is parsed through it.
#[derive(Clone, Debug, Default)]
pub struct FieldMap {
    map: HashMap<String, FieldKind>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(mut self, api_name: impl Into<String>, kind: FieldKind) -> Self {
        self.map.insert(api_name.into(), kind);
        self
    }

    pub fn get(&self, name: &str) -> Option<FieldKind> {
        self.map.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Parse a raw value for a named field. Unregistered fields are kept as text.
    pub fn parse(&self, name: &str, raw: &str) -> Result<Value, String> {
        self.get(name).unwrap_or(FieldKind::Text).parse(raw)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
