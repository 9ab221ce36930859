use serde::{Deserialize, Serialize};

/// Pagination metadata. Offset modes only fill `has_next_page`; cursor mode
/// fills the rest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub has_next_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_prev_page: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
    /// One cursor per item, in item order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursors: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> QueryResult<T> {
    pub fn new(items: Vec<T>, meta: PageMeta) -> Self {
        Self { items, meta }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            meta: PageMeta::default(),
        }
    }

    /// Map items while preserving meta (record → DTO convenience)
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> QueryResult<U> {
        QueryResult {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_meta_serializes_only_has_next_page() {
        let meta = PageMeta {
            has_next_page: true,
            ..PageMeta::default()
        };
        assert_eq!(
            serde_json::to_value(&meta).unwrap(),
            serde_json::json!({"has_next_page": true})
        );
    }

    #[test]
    fn map_items_keeps_meta() {
        let result = QueryResult::new(
            vec![1, 2],
            PageMeta {
                has_next_page: true,
                ..PageMeta::default()
            },
        )
        .map_items(|n| n * 10);
        assert_eq!(result.items, vec![10, 20]);
        assert!(result.meta.has_next_page);
    }
}
