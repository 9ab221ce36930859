use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::pagination::PaginationConfig;
use crate::sort::Sorting;

/// Per-view query settings, typically read from the `views.<name>` section of
/// the application config.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub pagination: PaginationConfig,
    pub sort: SortConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SortConfig {
    /// Sortable field names.
    pub allowed: Vec<String>,
    /// Order used when the request has no `sort`, in `sort` syntax (`color,-id`).
    pub default: Option<String>,
}

impl SortConfig {
    pub fn to_sorting(&self) -> Result<Sorting, Error> {
        let sorting = Sorting::new(self.allowed.iter().cloned());
        match self.default.as_deref().map(str::trim) {
            None | Some("") => Ok(sorting),
            Some(raw) => {
                let order = sorting.parse(Some(raw))?;
                Ok(sorting.with_default(order))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Pagination;
    use crate::sort::{SortKey, SortOrder};

    #[test]
    fn view_config_from_yaml() {
        let yaml = r#"
pagination:
  kind: page
  default_size: 10
  max_size: 50
sort:
  allowed: [color, size, id]
  default: "-size"
"#;
        let cfg: ViewConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(Pagination::from(cfg.pagination.clone()), Pagination::Page(p) if p.size.max == 50));

        let sorting = cfg.sort.to_sorting().unwrap();
        assert_eq!(
            sorting.default_order(),
            &SortOrder(vec![SortKey::desc("size")])
        );
    }

    #[test]
    fn default_sort_must_be_allowed() {
        let cfg = SortConfig {
            allowed: vec!["color".into()],
            default: Some("size".into()),
        };
        assert!(matches!(cfg.to_sorting(), Err(Error::InvalidSortField(f)) if f == "size"));
    }

    #[test]
    fn empty_view_config() {
        let cfg: ViewConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg, ViewConfig::default());
    }
}
