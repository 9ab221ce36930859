//! Declarative list-query translation for REST views.
//!
//! Client query parameters (`filter[...]`, `sort`, `page[...]`) are parsed
//! into a typed predicate, a sort order and a page window, then applied to
//! any [`Collection`]. All validation happens in [`QueryBuilder::prepare`];
//! execution only runs `filter` → `order_by` → `fetch` and builds the
//! pagination metadata.
//!
//! # Example
//! ```rust
//! use resty_query::{
//!     FieldKind, FieldMap, Filtering, MemoryCollection, PagePagination, LimitCfg,
//!     QueryBuilder, QueryParams, Record, Sorting, Value,
//! };
//!
//! struct Widget { id: i64, color: &'static str }
//!
//! impl Record for Widget {
//!     fn field(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "id" => Some(self.id.into()),
//!             "color" => Some(self.color.into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let builder = QueryBuilder::new(
//!     FieldMap::new().insert("id", FieldKind::Int).insert("color", FieldKind::Text),
//! )
//! .with_filtering(Filtering::new().eq("color"))
//! .with_sorting(Sorting::new(["id"]))
//! .with_pagination(PagePagination::new(LimitCfg::new(10, 100)));
//!
//! let widgets = [Widget { id: 1, color: "red" }, Widget { id: 2, color: "blue" }];
//! let params = QueryParams::parse("filter[color]=red&sort=-id");
//! let page = builder.fetch(&params, MemoryCollection::new(&widgets)).unwrap();
//! assert_eq!(page.items.len(), 1);
//! assert!(!page.meta.has_next_page);
//! ```

pub mod builder;
pub mod collection;
pub mod config;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod operator;
pub mod page;
pub mod pagination;
pub mod params;
pub mod predicate;
pub mod schema;
pub mod sort;
pub mod testing;
pub mod value;

pub use builder::{PreparedQuery, QueryBuilder};
pub use collection::{Collection, Keyset, MemoryCollection, Record, Start};
pub use config::{SortConfig, ViewConfig};
pub use cursor::{base64_url, Cursor};
pub use error::{ConfigError, CursorError, Error, FetchError};
pub use filter::{CustomFilter, FilterField, Filtering};
pub use operator::{CompareFn, Operator};
pub use page::{PageMeta, QueryResult};
pub use pagination::{
    CursorPosition, LimitCfg, LimitOffsetPagination, PagePagination, PageRequest, Pagination,
    PaginationConfig, RelayCursorPagination,
};
pub use params::QueryParams;
pub use predicate::{FilterFn, Predicate};
pub use schema::FieldMap;
pub use sort::{SortDir, SortKey, SortOrder, Sorting};
pub use value::{FieldKind, Value};
