//! End-to-end listing flows over the in-memory store.

use listing_query_core::{FieldOptions, FilterOperator, QueryParams, SortDir, ValueType};
use listing_query_engine::{
    compile, fetch_aggregation_page, fetch_cursor_page, fetch_facet_page, fetch_offset_page,
    fetch_scroll_page, MemoryStore, PaginationConfig, Paginator, PipelineOptions, ToDocument,
};
use serde_json::{json, Value as JsonValue};

fn listings(n: usize) -> Vec<JsonValue> {
    (1..=n)
        .map(|i| {
            json!({
                "_id": format!("id{i:03}"),
                "title": if i % 2 == 0 { format!("Beach House {i}") } else { format!("Mountain Cabin {i}") },
                "price": i * 10,
                "country": if i % 3 == 0 { "India" } else { "Italy" },
                "featured": i % 5 == 0,
                "createdAt": format!("2024-01-{:02}T00:00:00Z", (i % 28) + 1),
            })
        })
        .collect()
}

fn options() -> FieldOptions {
    FieldOptions::new()
        .search("title")
        .filter("country", ValueType::String, FilterOperator::Eq)
        .range("price", "price")
        .boolean("featured")
}

fn ids(rows: &[JsonValue]) -> Vec<String> {
    rows.iter()
        .filter_map(|r| r["_id"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn offset_pages_walk_the_whole_result_set() {
    let store = MemoryStore::new(listings(95));
    let paginator = Paginator::default();

    let params = QueryParams::parse("page=5&limit=20&sortBy=price&sortOrder=asc");
    let page = fetch_offset_page(&store, &params, &options(), &paginator)
        .await
        .unwrap();

    assert_eq!(page.data.len(), 15);
    assert_eq!(page.pagination.total_pages, 5);
    assert!(!page.pagination.has_next);
    assert!(page.pagination.has_prev);
    assert_eq!(page.pagination.start_index, 81);
    assert_eq!(page.pagination.end_index, 95);
    assert_eq!(page.data[0]["price"], 810);
    assert_eq!(store.round_trips(), 1);
}

#[tokio::test]
async fn offset_page_applies_compiled_filter() {
    let store = MemoryStore::new(listings(30));
    let params = QueryParams::parse("search=beach&country=India&price_min=100");
    let page = fetch_offset_page(&store, &params, &options(), &Paginator::default())
        .await
        .unwrap();

    // Even ids divisible by 3 with price >= 100: 12, 18, 24, 30.
    assert_eq!(page.pagination.total_count, 4);
    assert!(page
        .data
        .iter()
        .all(|r| r["country"] == "India" && r["price"].as_u64().unwrap_or(0) >= 100));
}

#[tokio::test]
async fn empty_collection_yields_well_formed_envelope() {
    let store = MemoryStore::new(Vec::new());
    let page = fetch_offset_page(&store, &QueryParams::new(), &options(), &Paginator::default())
        .await
        .unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total_pages, 0);
    assert!(!page.pagination.has_next);
    assert!(!page.pagination.has_prev);
}

#[tokio::test]
async fn cursor_pages_chain_without_overlap() {
    let store = MemoryStore::new(listings(25));
    let paginator = Paginator::default();
    let opts = options();

    let first_params = QueryParams::parse("limit=10");
    let cursor = paginator
        .build_cursor_pagination(&first_params, "price", SortDir::Asc)
        .with_cursor_type(ValueType::Number);
    let first = fetch_cursor_page(&store, &first_params, &opts, &cursor)
        .await
        .unwrap();
    assert_eq!(first.data.len(), 10);
    assert!(first.pagination.has_next);
    assert!(!first.pagination.has_prev);
    assert_eq!(first.pagination.next_cursor, Some(json!(100)));

    let second_params = QueryParams::parse("limit=10&cursor=100");
    let cursor = paginator
        .build_cursor_pagination(&second_params, "price", SortDir::Asc)
        .with_cursor_type(ValueType::Number);
    let second = fetch_cursor_page(&store, &second_params, &opts, &cursor)
        .await
        .unwrap();
    assert_eq!(second.data[0]["price"], 110);
    assert!(second.pagination.has_prev);

    let prev_params = QueryParams::parse("limit=10&cursor=110&direction=prev");
    let cursor = paginator
        .build_cursor_pagination(&prev_params, "price", SortDir::Asc)
        .with_cursor_type(ValueType::Number);
    let back = fetch_cursor_page(&store, &prev_params, &opts, &cursor)
        .await
        .unwrap();
    assert!(back.data.iter().all(|r| r["price"].as_u64().unwrap_or(0) < 110));
}

#[tokio::test]
async fn scroll_walks_ids_descending() {
    let store = MemoryStore::new(listings(7));
    let paginator = Paginator::default();

    let scroll = paginator.build_scroll_pagination(&QueryParams::parse("limit=3"));
    let page = fetch_scroll_page(&store, &scroll, "_id").await.unwrap();
    assert_eq!(ids(&page.data), vec!["id007", "id006", "id005"]);
    assert!(page.has_more);
    assert_eq!(page.next_cursor, Some(json!("id005")));

    let scroll = paginator.build_scroll_pagination(&QueryParams::parse("limit=3&lastId=id002"));
    let page = fetch_scroll_page(&store, &scroll, "_id").await.unwrap();
    assert_eq!(ids(&page.data), vec!["id001"]);
    assert!(!page.has_more);
    assert_eq!(page.next_cursor, Some(json!("id001")));
}

#[tokio::test]
async fn aggregation_takes_two_round_trips_facet_takes_one() {
    let store = MemoryStore::new(listings(45));
    let paginator = Paginator::default();
    let params = QueryParams::parse("page=2&limit=20&sortBy=price&sortOrder=asc");

    let agg = fetch_aggregation_page(&store, &params, &options(), &paginator)
        .await
        .unwrap();
    assert_eq!(store.round_trips(), 2);
    assert_eq!(agg.data.len(), 20);
    assert!(agg.pagination.has_more);
    assert_eq!(agg.pagination.info.total_count, 45);
    assert_eq!(agg.data[0]["price"], 210);

    store.reset_round_trips();
    let facet = fetch_facet_page(&store, &params, &options(), &PipelineOptions::default(), &paginator)
        .await
        .unwrap();
    assert_eq!(store.round_trips(), 1);
    assert_eq!(ids(&facet.data), ids(&agg.data));
    assert_eq!(facet.pagination, agg.pagination.info);
}

#[tokio::test]
async fn facet_over_no_matches_defaults_to_zero() {
    let store = MemoryStore::new(listings(5));
    let params = QueryParams::parse("country=Atlantis");
    let page = fetch_facet_page(
        &store,
        &params,
        &options(),
        &PipelineOptions::default(),
        &Paginator::default(),
    )
    .await
    .unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total_count, 0);
    assert_eq!(page.pagination.total_pages, 0);
}

#[test]
fn compiled_filter_renders_as_document() {
    let params = QueryParams::parse("search=lap&price_min=100&featured=true");
    let doc = compile(&params, &options()).to_document();
    assert_eq!(
        doc,
        json!({
            "$or": [{"title": {"$regex": "lap", "$options": "i"}}],
            "price": {"$gte": 100},
            "featured": true
        })
    );
    assert!(doc["price"].get("$lte").is_none());
}

#[test]
fn clamping_is_shared_across_strategies() {
    let paginator = Paginator::new(PaginationConfig {
        default_limit: 20,
        max_limit: 100,
        default_page: 1,
    });
    let params = QueryParams::parse("limit=500&page=0");
    assert_eq!(paginator.build_pagination(&params).limit, 100);
    assert_eq!(paginator.build_pagination(&params).page, 1);
    assert_eq!(
        paginator
            .build_cursor_pagination(&params, "_id", SortDir::Desc)
            .limit,
        100
    );
    assert_eq!(paginator.build_scroll_pagination(&params).limit, 100);
}
