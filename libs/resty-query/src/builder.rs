use tracing::{debug, instrument, trace};

use crate::collection::{Collection, Keyset, Start};
use crate::config::ViewConfig;
use crate::cursor::Cursor;
use crate::error::{ConfigError, Error, FetchError};
use crate::filter::Filtering;
use crate::page::{PageMeta, QueryResult};
use crate::pagination::{CursorPosition, KeysetPosition, PagePlan, PageRequest, Pagination};
use crate::params::QueryParams;
use crate::predicate::Predicate;
use crate::schema::FieldMap;
use crate::sort::{SortOrder, Sorting};
use crate::value::{FieldKind, Value};

/// Query configuration of one list view.
///
/// Built once at startup and shared across requests; holds no per-request state.
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    fields: FieldMap,
    filtering: Filtering,
    sorting: Sorting,
    pagination: Pagination,
}

impl QueryBuilder {
    pub fn new(fields: FieldMap) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Seed sorting and pagination from a view config; filters stay code-defined.
    pub fn from_config(
        fields: FieldMap,
        filtering: Filtering,
        cfg: &ViewConfig,
    ) -> Result<Self, ConfigError> {
        let sorting = cfg.sort.to_sorting().map_err(ConfigError::DefaultSort)?;
        let pagination = Pagination::from(cfg.pagination.clone());
        pagination.validate()?;
        if let Pagination::RelayCursor(relay) = &pagination {
            if !fields.contains(&relay.tiebreaker.field) {
                return Err(ConfigError::UnknownTiebreaker(relay.tiebreaker.field.clone()));
            }
        }
        Ok(Self {
            fields,
            filtering,
            sorting,
            pagination,
        })
    }

    pub fn with_filtering(mut self, filtering: Filtering) -> Self {
        self.filtering = filtering;
        self
    }

    pub fn with_sorting(mut self, sorting: Sorting) -> Self {
        self.sorting = sorting;
        self
    }

    pub fn with_pagination(mut self, pagination: impl Into<Pagination>) -> Self {
        self.pagination = pagination.into();
        self
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Validate every parameter and build the executable query. The
    /// collection is not touched, so every client error surfaces here.
    #[instrument(name = "resty.query.prepare", skip(self, params), level = "debug")]
    pub fn prepare(&self, params: &QueryParams) -> Result<PreparedQuery, Error> {
        let predicate = self.filtering.build_predicate(&params.filters, &self.fields)?;
        let order = self.sorting.parse(params.sort.as_deref())?;

        let (order, plan) = match self.pagination.parse(&params.page)? {
            PageRequest::Unbounded => (order, PagePlan::Unbounded),
            PageRequest::Offset { offset, limit } => (order, PagePlan::Offset { offset, limit }),
            PageRequest::Cursor { limit, position } => {
                let order = match &self.pagination {
                    Pagination::RelayCursor(relay) => {
                        order.ensure_tiebreaker(&relay.tiebreaker.field, relay.tiebreaker.dir)
                    }
                    _ => order,
                };
                let position = self.decode_position(&order, position)?;
                (order, PagePlan::Cursor { limit, position })
            }
        };

        debug!(order = %order, plan = ?plan, "prepared list query");
        Ok(PreparedQuery {
            predicate,
            order,
            plan,
        })
    }

    /// Prepare and execute in one go.
    pub fn fetch<C: Collection>(
        &self,
        params: &QueryParams,
        collection: C,
    ) -> Result<QueryResult<C::Item>, FetchError<C::Error>> {
        let prepared = self.prepare(params)?;
        prepared.execute(collection).map_err(FetchError::Collection)
    }

    fn decode_position(
        &self,
        order: &SortOrder,
        position: CursorPosition,
    ) -> Result<KeysetPosition, Error> {
        let token = match &position {
            CursorPosition::First => return Ok(KeysetPosition::First),
            CursorPosition::After(t) | CursorPosition::Before(t) => t,
        };

        let kinds = order
            .keys()
            .iter()
            .map(|k| {
                self.fields
                    .get(&k.field)
                    .ok_or_else(|| Error::InvalidSortField(k.field.clone()))
            })
            .collect::<Result<Vec<FieldKind>, Error>>()?;

        let cursor = Cursor::decode(token, &kinds).map_err(|e| {
            debug!(error = %e, "rejecting cursor");
            Error::InvalidCursor(e)
        })?;

        Ok(match position {
            CursorPosition::Before(_) => KeysetPosition::Before(cursor.keys),
            _ => KeysetPosition::After(cursor.keys),
        })
    }
}

/// Validated query: predicate, effective order and page window.
#[derive(Clone, Debug)]
pub struct PreparedQuery {
    predicate: Predicate,
    order: SortOrder,
    plan: PagePlan,
}

impl PreparedQuery {
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Effective order, tie-break included in cursor mode.
    pub fn order(&self) -> &SortOrder {
        &self.order
    }

    pub fn limit(&self) -> Option<u64> {
        match self.plan {
            PagePlan::Unbounded => None,
            PagePlan::Offset { limit, .. } | PagePlan::Cursor { limit, .. } => Some(limit),
        }
    }

    /// filter → order → fetch `limit + 1` → trim.
    #[instrument(name = "resty.query.execute", skip_all, level = "debug")]
    pub fn execute<C: Collection>(self, collection: C) -> Result<QueryResult<C::Item>, C::Error> {
        let PreparedQuery {
            predicate,
            order,
            plan,
        } = self;
        let collection = collection.filter(predicate);

        match plan {
            PagePlan::Unbounded => {
                let items = collection.order_by(&order).fetch(Start::Offset(0), None)?;
                trace!(count = items.len(), "fetched unbounded list");
                Ok(QueryResult::new(items, PageMeta::default()))
            }
            PagePlan::Offset { offset, limit } => {
                let mut items = collection
                    .order_by(&order)
                    .fetch(Start::Offset(offset), Some(limit.saturating_add(1)))?;
                let has_next_page = trim(&mut items, limit);
                trace!(count = items.len(), has_next_page, "fetched offset page");
                Ok(QueryResult::new(
                    items,
                    PageMeta {
                        has_next_page,
                        ..PageMeta::default()
                    },
                ))
            }
            PagePlan::Cursor { limit, position } => {
                execute_keyset(collection, &order, limit, position)
            }
        }
    }
}

/// Cursor-mode page. The overfetched row decides the flag in the direction of
/// travel; the opposite flag comes from a one-row lookup past the page edge
/// (the anchor when the page is empty), so every `true` flag comes with a
/// cursor that reaches at least one record.
fn execute_keyset<C: Collection>(
    collection: C,
    order: &SortOrder,
    limit: u64,
    position: KeysetPosition,
) -> Result<QueryResult<C::Item>, C::Error> {
    let fetch = Some(limit.saturating_add(1));

    let (items, has_next_page, has_prev_page, anchor) = match position {
        KeysetPosition::First => {
            let mut items = collection.order_by(order).fetch(Start::Offset(0), fetch)?;
            let has_more = trim(&mut items, limit);
            (items, has_more, false, None)
        }
        KeysetPosition::After(values) => {
            let start = Start::Keyset(Keyset::new(order.clone(), values.clone()));
            let mut items = collection.clone().order_by(order).fetch(start, fetch)?;
            let has_more = trim(&mut items, limit);
            let edge = items.first().map_or_else(|| values.clone(), |i| order.values_of(i));
            let has_prev = any_past(collection, &order.reversed(), edge)?;
            (items, has_more, has_prev, Some(values))
        }
        // Backward pages run in reversed order and are flipped back afterwards.
        KeysetPosition::Before(values) => {
            let reversed = order.reversed();
            let start = Start::Keyset(Keyset::new(reversed.clone(), values.clone()));
            let mut items = collection.clone().order_by(&reversed).fetch(start, fetch)?;
            let has_more = trim(&mut items, limit);
            items.reverse();
            let edge = items.last().map_or_else(|| values.clone(), |i| order.values_of(i));
            let has_next = any_past(collection, order, edge)?;
            (items, has_next, has_more, Some(values))
        }
    };

    let cursors: Vec<String> = items
        .iter()
        .map(|item| Cursor::for_record(order, item).encode())
        .collect();
    // An empty page navigates from the anchor it was requested with.
    let anchor = anchor.map(|values| Cursor::new(values).encode());

    let meta = PageMeta {
        has_next_page,
        has_prev_page: Some(has_prev_page),
        next_cursor: has_next_page
            .then(|| cursors.last().cloned().or_else(|| anchor.clone()))
            .flatten(),
        prev_cursor: has_prev_page
            .then(|| cursors.first().cloned().or(anchor))
            .flatten(),
        cursors: Some(cursors),
    };
    trace!(
        count = items.len(),
        has_next_page,
        has_prev_page,
        "fetched keyset page"
    );
    Ok(QueryResult::new(items, meta))
}

/// Whether any record sorts strictly after `values` under `order`.
fn any_past<C: Collection>(
    collection: C,
    order: &SortOrder,
    values: Vec<Value>,
) -> Result<bool, C::Error> {
    let start = Start::Keyset(Keyset::new(order.clone(), values));
    let beyond = collection.order_by(order).fetch(start, Some(1))?;
    Ok(!beyond.is_empty())
}

/// Drop the overfetched row; true when there was one.
fn trim<T>(items: &mut Vec<T>, limit: u64) -> bool {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let has_more = items.len() > limit;
    items.truncate(limit);
    has_more
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{LimitCfg, RelayCursorPagination};

    /// Collection that fails on fetch.
    #[derive(Clone)]
    struct Broken;

    impl Collection for Broken {
        type Item = std::collections::HashMap<String, Value>;
        type Error = &'static str;

        fn filter(self, _: Predicate) -> Self {
            self
        }

        fn order_by(self, _: &SortOrder) -> Self {
            self
        }

        fn fetch(self, _: Start, _: Option<u64>) -> Result<Vec<Self::Item>, Self::Error> {
            Err("backend down")
        }
    }

    fn builder() -> QueryBuilder {
        QueryBuilder::new(
            FieldMap::new()
                .insert("id", FieldKind::Int)
                .insert("color", FieldKind::Text),
        )
        .with_filtering(Filtering::new().eq("color"))
        .with_sorting(Sorting::new(["color", "id"]))
        .with_pagination(RelayCursorPagination::new(LimitCfg::new(2, 10)))
    }

    #[test]
    fn cursor_mode_appends_tiebreaker() {
        let prepared = builder()
            .prepare(&QueryParams::default().with_sort("-color"))
            .unwrap();
        assert_eq!(prepared.order().to_signed_tokens(), "-color,id");
        assert_eq!(prepared.limit(), Some(2));
    }

    #[test]
    fn errors_surface_before_collection_access() {
        let err = builder()
            .fetch(&QueryParams::default().with_filter("shape", "round"), Broken)
            .unwrap_err();
        assert!(matches!(err, FetchError::Query(Error::UnknownFilterField(_))));

        let err = builder()
            .fetch(&QueryParams::default().with_page("after", "%%%"), Broken)
            .unwrap_err();
        assert!(matches!(err, FetchError::Query(Error::InvalidCursor(_))));
    }

    #[test]
    fn collection_errors_pass_through() {
        let err = builder().fetch(&QueryParams::default(), Broken).unwrap_err();
        assert!(matches!(err, FetchError::Collection("backend down")));
    }

    #[test]
    fn tiebreaker_must_be_a_known_field() {
        let b = QueryBuilder::new(FieldMap::new().insert("color", FieldKind::Text))
            .with_sorting(Sorting::new(["color"]))
            .with_pagination(RelayCursorPagination::default());
        let token = Cursor::new(vec![Value::from("red"), Value::Int(1)]).encode();
        let err = b
            .prepare(&QueryParams::default().with_sort("color").with_page("after", token))
            .unwrap_err();
        assert_eq!(err, Error::InvalidSortField("id".to_string()));
    }

    #[test]
    fn builder_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QueryBuilder>();
    }
}
