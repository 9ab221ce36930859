use resty_query::testing::assert_shape;
use resty_query::{
    Cursor, Error, FieldKind, FieldMap, Filtering, LimitCfg, LimitOffsetPagination,
    MemoryCollection, PageMeta, PagePagination, Pagination, QueryBuilder, QueryParams, Record,
    RelayCursorPagination, SortDir, Sorting, Value,
};
use serde_json::json;

#[derive(Debug)]
struct Widget {
    id: i64,
    color: &'static str,
}

impl Record for Widget {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Int(self.id)),
            "color" => Some(Value::from(self.color)),
            _ => None,
        }
    }
}

fn widgets() -> Vec<Widget> {
    vec![
        Widget { id: 1, color: "red" },
        Widget { id: 2, color: "green" },
        Widget { id: 3, color: "blue" },
        Widget { id: 4, color: "red" },
        Widget { id: 5, color: "green" },
        Widget { id: 6, color: "red" },
        Widget { id: 7, color: "blue" },
    ]
}

fn builder(pagination: impl Into<Pagination>) -> QueryBuilder {
    QueryBuilder::new(
        FieldMap::new()
            .insert("id", FieldKind::Int)
            .insert("color", FieldKind::Text),
    )
    .with_filtering(Filtering::new().eq("color"))
    .with_sorting(Sorting::new(["id", "color"]))
    .with_pagination(pagination)
}

fn page(builder: &QueryBuilder, data: &[Widget], params: &QueryParams) -> (Vec<i64>, PageMeta) {
    let result = builder
        .fetch(params, MemoryCollection::new(data))
        .unwrap();
    (result.items.iter().map(|w| w.id).collect(), result.meta)
}

#[test]
fn page_pagination_covers_all_records() {
    let data: Vec<Widget> = widgets().into_iter().take(4).collect();
    let b = builder(PagePagination::new(LimitCfg::new(10, 10)));

    let (first, meta) = page(&b, &data, &QueryParams::parse("page[size]=2&page[number]=1"));
    assert_eq!(first, vec![1, 2]);
    assert!(meta.has_next_page);

    let (second, meta) = page(&b, &data, &QueryParams::parse("page[size]=2&page[number]=2"));
    assert_eq!(second, vec![3, 4]);
    assert!(!meta.has_next_page);
    assert_eq!(meta.has_prev_page, None);

    let (third, meta) = page(&b, &data, &QueryParams::parse("page[size]=2&page[number]=3"));
    assert!(third.is_empty());
    assert!(!meta.has_next_page);
}

#[test]
fn limit_offset_pagination() {
    let data = widgets();
    let b = builder(LimitOffsetPagination::new(LimitCfg::new(3, 10)));

    let (ids, meta) = page(&b, &data, &QueryParams::parse("page[offset]=2"));
    assert_eq!(ids, vec![3, 4, 5]);
    assert!(meta.has_next_page);

    let (ids, meta) = page(&b, &data, &QueryParams::parse("page[offset]=5&page[limit]=5"));
    assert_eq!(ids, vec![6, 7]);
    assert!(!meta.has_next_page);
}

#[test]
fn oversized_page_is_rejected() {
    let b = builder(PagePagination::new(LimitCfg::new(2, 5)));
    let err = b.prepare(&QueryParams::parse("page[size]=6")).unwrap_err();
    assert_eq!(err, Error::PageSizeExceeded { requested: 6, max: 5 });
}

#[test]
fn cursor_forward_walk_has_no_gaps_or_overlaps() {
    let data = widgets();
    let b = builder(RelayCursorPagination::new(LimitCfg::new(3, 10)));
    let sort = "color";

    let mut seen = Vec::new();
    let mut params = QueryParams::default().with_sort(sort);
    let mut pages = 0;
    loop {
        let (ids, meta) = page(&b, &data, &params);
        pages += 1;
        seen.extend(ids);
        match meta.next_cursor {
            Some(next) => {
                assert!(meta.has_next_page);
                params = QueryParams::default().with_sort(sort).with_page("after", next);
            }
            None => {
                assert!(!meta.has_next_page);
                break;
            }
        }
    }

    assert_eq!(pages, 3);
    // blue: 3,7  green: 2,5  red: 1,4,6 (id tie-break ascending)
    assert_eq!(seen, vec![3, 7, 2, 5, 1, 4, 6]);
}

#[test]
fn cursor_meta_on_first_and_middle_pages() {
    let data = widgets();
    let b = builder(RelayCursorPagination::new(LimitCfg::new(2, 10)));

    let first = b
        .fetch(&QueryParams::default(), MemoryCollection::new(&data))
        .unwrap();
    let meta = serde_json::to_value(&first.meta).unwrap();
    assert_shape(
        &meta,
        &json!({"has_next_page": true, "has_prev_page": false}),
    );
    assert!(first.meta.prev_cursor.is_none());
    let cursors = first.meta.cursors.clone().unwrap();
    assert_eq!(cursors.len(), 2);
    assert_eq!(first.meta.next_cursor.as_ref(), cursors.last());

    let next = first.meta.next_cursor.unwrap();
    let (ids, meta) = page(&b, &data, &QueryParams::default().with_page("cursor", next));
    assert_eq!(ids, vec![3, 4]);
    assert!(meta.has_next_page);
    assert_eq!(meta.has_prev_page, Some(true));
    assert!(meta.prev_cursor.is_some());
}

#[test]
fn cursor_backward_round_trip_reproduces_previous_page() {
    let data = widgets();
    let b = builder(RelayCursorPagination::new(LimitCfg::new(2, 10)));
    let sort = "-color";

    let (page1, meta1) = page(&b, &data, &QueryParams::default().with_sort(sort));
    let (page2, meta2) = page(
        &b,
        &data,
        &QueryParams::default()
            .with_sort(sort)
            .with_page("after", meta1.next_cursor.unwrap()),
    );
    assert_eq!(page1, vec![1, 4]);
    assert_eq!(page2, vec![6, 2]);

    let (back, meta) = page(
        &b,
        &data,
        &QueryParams::default()
            .with_sort(sort)
            .with_page("before", meta2.prev_cursor.unwrap()),
    );
    assert_eq!(back, page1);
    assert!(meta.has_next_page);
    assert_eq!(meta.has_prev_page, Some(false));
    assert!(meta.prev_cursor.is_none());
}

#[test]
fn before_cursor_with_more_behind() {
    let data = widgets();
    let b = builder(RelayCursorPagination::new(LimitCfg::new(2, 10)));

    // Before id 6 with limit 2 → [4, 5], and 1..3 remain behind.
    let token = Cursor::new(vec![Value::Int(6)]).encode();
    let (ids, meta) = page(&b, &data, &QueryParams::default().with_page("before", token));
    assert_eq!(ids, vec![4, 5]);
    assert_eq!(meta.has_prev_page, Some(true));
    assert!(meta.has_next_page);
    assert_eq!(meta.cursors.map(|c| c.len()), Some(2));
}

#[test]
fn filtered_cursor_pages() {
    let data = widgets();
    let b = builder(RelayCursorPagination::new(LimitCfg::new(2, 10)));
    let params = QueryParams::parse("filter[color]=red");

    let (ids, meta) = page(&b, &data, &params);
    assert_eq!(ids, vec![1, 4]);
    let (ids, meta) = page(
        &b,
        &data,
        &params.clone().with_page("after", meta.next_cursor.unwrap()),
    );
    assert_eq!(ids, vec![6]);
    assert!(!meta.has_next_page);
    assert!(meta.next_cursor.is_none());
}

#[test]
fn explicit_tiebreaker_keeps_client_direction() {
    let data = widgets();
    let b = builder(
        RelayCursorPagination::new(LimitCfg::new(3, 10)).with_tiebreaker("id", SortDir::Asc),
    );
    let prepared = b.prepare(&QueryParams::parse("sort=-id")).unwrap();
    assert_eq!(prepared.order().to_signed_tokens(), "-id");

    let (ids, meta) = page(&b, &data, &QueryParams::parse("sort=-id"));
    assert_eq!(ids, vec![7, 6, 5]);
    let (ids, _) = page(
        &b,
        &data,
        &QueryParams::parse("sort=-id").with_page("after", meta.next_cursor.unwrap()),
    );
    assert_eq!(ids, vec![4, 3, 2]);
}

#[test]
fn cursor_errors() {
    let b = builder(RelayCursorPagination::default());

    let err = b
        .prepare(&QueryParams::parse("page[after]=a&page[before]=b"))
        .unwrap_err();
    assert_eq!(err, Error::ConflictingPaginationParameters);

    let err = b
        .prepare(&QueryParams::parse("page[cursor]=!!!"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCursor(_)));

    // Cursor minted under `sort=color` does not fit the default order.
    let token = Cursor::new(vec![Value::from("red"), Value::Int(1)]).encode();
    let err = b
        .prepare(&QueryParams::default().with_page("after", token))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCursor(_)));
}

#[test]
fn after_the_last_record_points_back() {
    let data: Vec<Widget> = widgets().into_iter().take(2).collect();
    let b = builder(RelayCursorPagination::new(LimitCfg::new(2, 10)));

    let token = Cursor::new(vec![Value::Int(2)]).encode();
    let (ids, meta) = page(&b, &data, &QueryParams::default().with_page("after", token));
    assert!(ids.is_empty());
    assert!(!meta.has_next_page);
    assert_eq!(meta.has_prev_page, Some(true));

    let prev = meta.prev_cursor.expect("a previous page must be reachable");
    let (ids, _) = page(&b, &data, &QueryParams::default().with_page("before", prev));
    assert_eq!(ids, vec![1]);
}

#[test]
fn before_the_first_record_points_forward() {
    let data: Vec<Widget> = widgets().into_iter().take(2).collect();
    let b = builder(RelayCursorPagination::new(LimitCfg::new(2, 10)));

    let token = Cursor::new(vec![Value::Int(1)]).encode();
    let (ids, meta) = page(&b, &data, &QueryParams::default().with_page("before", token));
    assert!(ids.is_empty());
    assert_eq!(meta.has_prev_page, Some(false));
    assert!(meta.has_next_page);

    let next = meta.next_cursor.expect("a next page must be reachable");
    let (ids, _) = page(&b, &data, &QueryParams::default().with_page("after", next));
    assert_eq!(ids, vec![2]);
}

#[test]
fn cursor_on_the_only_record_has_no_neighbours() {
    let data: Vec<Widget> = widgets().into_iter().take(1).collect();
    let b = builder(RelayCursorPagination::new(LimitCfg::new(2, 10)));
    let token = Cursor::new(vec![Value::Int(1)]).encode();

    let (ids, meta) = page(&b, &data, &QueryParams::default().with_page("after", token.clone()));
    assert!(ids.is_empty());
    assert!(!meta.has_next_page);
    assert_eq!(meta.has_prev_page, Some(false));
    assert!(meta.prev_cursor.is_none());

    let (ids, meta) = page(&b, &data, &QueryParams::default().with_page("before", token));
    assert!(ids.is_empty());
    assert!(!meta.has_next_page);
    assert!(meta.next_cursor.is_none());
}

#[test]
fn after_the_first_record_can_go_back_to_it() {
    let data = widgets();
    let b = builder(RelayCursorPagination::new(LimitCfg::new(2, 10)));

    let token = Cursor::new(vec![Value::Int(1)]).encode();
    let (ids, meta) = page(&b, &data, &QueryParams::default().with_page("after", token));
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(meta.has_prev_page, Some(true));

    let (ids, meta) = page(
        &b,
        &data,
        &QueryParams::default().with_page("before", meta.prev_cursor.unwrap()),
    );
    assert_eq!(ids, vec![1]);
    assert_eq!(meta.has_prev_page, Some(false));
}
