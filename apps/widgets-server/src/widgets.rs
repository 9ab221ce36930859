use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use resty_http::{fetch_error_to_problem, ListQuery, ListResponse, ProblemResponse};
use resty_query::{
    ConfigError, CustomFilter, FieldKind, FieldMap, FilterField, Filtering, MemoryCollection, Operator,
    PaginationConfig, QueryBuilder, Record, SortConfig, SortDir, Value, ViewConfig,
};
use serde::Serialize;

/// View name under `views.<name>` in the application config.
pub const VIEW_NAME: &str = "widgets";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Widget {
    pub id: i64,
    pub color: String,
    pub size: i64,
}

impl Widget {
    pub fn new(id: i64, color: &str, size: i64) -> Self {
        Self {
            id,
            color: color.to_string(),
            size,
        }
    }
}

impl Record for Widget {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Int(self.id)),
            "color" => Some(Value::from(self.color.as_str())),
            "size" => Some(Value::Int(self.size)),
            _ => None,
        }
    }
}

pub fn seed() -> Vec<Widget> {
    vec![
        Widget::new(1, "red", 1),
        Widget::new(2, "green", 2),
        Widget::new(3, "blue", 3),
        Widget::new(4, "red", 6),
    ]
}

pub fn fields() -> FieldMap {
    FieldMap::new()
        .insert("id", FieldKind::Int)
        .insert("color", FieldKind::Text)
        .insert("size", FieldKind::Int)
}

/// `color`, `size_min` (`size >= n`), `size_divides` (`n` divides `size`)
/// and `size_is_odd`.
pub fn filtering() -> Filtering {
    let divides = Operator::custom(|size, value| match (size.as_i64(), value.as_i64()) {
        (Some(size), Some(d)) if d != 0 => size.wrapping_rem(d) == 0,
        _ => false,
    });

    Filtering::new()
        .eq("color")
        .field("size_min", FilterField::new("size", Operator::Ge))
        .field("size_divides", FilterField::new("size", divides))
        .custom(
            "size_is_odd",
            CustomFilter::new(FieldKind::Bool, |record, value| {
                let size = record.field("size").and_then(|v| v.as_i64()).unwrap_or(0);
                Some(size % 2 != 0) == value.as_bool()
            }),
        )
}

/// Used when the config has no `views.widgets` section.
pub fn default_view_config() -> ViewConfig {
    ViewConfig {
        pagination: PaginationConfig::RelayCursor {
            default_limit: 2,
            max_limit: 10,
            tiebreaker: "id".to_string(),
            tiebreaker_dir: SortDir::Asc,
        },
        sort: SortConfig {
            allowed: vec!["id".into(), "color".into(), "size".into()],
            default: None,
        },
    }
}

pub struct WidgetsState {
    pub builder: QueryBuilder,
    pub widgets: Vec<Widget>,
}

impl WidgetsState {
    pub fn new(view: &ViewConfig, widgets: Vec<Widget>) -> Result<Self, ConfigError> {
        Ok(Self {
            builder: QueryBuilder::from_config(fields(), filtering(), view)?,
            widgets,
        })
    }
}

async fn list_widgets(
    State(state): State<Arc<WidgetsState>>,
    query: ListQuery,
) -> Result<ListResponse<Widget>, ProblemResponse> {
    let page = state
        .builder
        .fetch(&query, MemoryCollection::new(&state.widgets))
        .map_err(|e| fetch_error_to_problem(&e, query.instance()))?;
    tracing::debug!(count = page.items.len(), "listed widgets");
    Ok(page.map_items(Widget::clone).into())
}

pub fn router(state: Arc<WidgetsState>) -> Router {
    Router::new()
        .route("/api/widgets", get(list_widgets))
        .with_state(state)
}
