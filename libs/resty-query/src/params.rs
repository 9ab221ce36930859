//! Query-string grammar: `filter[<name>]`, `sort` and `page[<name>]`.

use std::collections::BTreeMap;

/// Raw list-query parameters split by family. Values are URL-decoded but
/// otherwise untouched. Repeated keys keep the last value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub filters: BTreeMap<String, String>,
    pub sort: Option<String>,
    pub page: BTreeMap<String, String>,
    pub other: BTreeMap<String, String>,
}

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        Self::from_pairs(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.into();
            if let Some(name) = bracketed(key, "filter") {
                params.filters.insert(name.to_string(), value);
            } else if let Some(name) = bracketed(key, "page") {
                params.page.insert(name.to_string(), value);
            } else if key == "sort" {
                params.sort = Some(value);
            } else {
                params.other.insert(key.to_string(), value);
            }
        }
        params
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_page(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.page.insert(name.into(), value.into());
        self
    }
}

/// `family[name]` → `name`.
fn bracketed<'a>(key: &'a str, family: &str) -> Option<&'a str> {
    key.strip_prefix(family)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|name| !name.is_empty())
}
