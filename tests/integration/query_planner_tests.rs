//! Query planner tests against in-memory record stores

use std::collections::BTreeSet;

use rstest::rstest;
use serde_json::Value;

use audit_service::{
    db::AuditStore,
    models::{AuditQuery, FieldSelection},
    services::{build_filter, build_response, paginate, project_fields, PageRequest, Projection, QueryPlan},
};

use crate::common::{AuditFactory, AuditFixtures, FailingAuditStore, MemoryAuditStore};

async fn seeded_store() -> MemoryAuditStore {
    let store = MemoryAuditStore::new();
    for record in AuditFixtures::seed_records() {
        store.insert(&record).await.unwrap();
    }
    store
}

fn user_ids(results: &[Value]) -> Vec<String> {
    results
        .iter()
        .map(|r| r["userId"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[rstest]
#[case(Some("2023-04-20T08:00:00.000Z"), Some("2023-04-20T12:00:00.000Z"), 4)]
#[case(Some("2023-04-20T08:00:00"), Some("2023-04-20T08:00:00"), 1)]
#[case(Some("2023-04-20T08:30:00Z"), Some("2023-04-20T10:00:00Z"), 2)]
#[case(Some("2023-04-20T11:00:01Z"), None, 0)]
#[case(Some("2023-04-19T00:00:00Z"), None, 4)]
#[case(None, None, 4)]
#[case(Some("2023-04-21T00:00:00Z"), Some("2023-04-20T00:00:00Z"), 0)]
#[tokio::test]
async fn test_range_filter_counts(
    #[case] start: Option<&str>,
    #[case] end: Option<&str>,
    #[case] expected: usize,
) {
    let store = seeded_store().await;
    let filter = build_filter(start, end).unwrap();

    let results = paginate(&store, &filter, &Projection::All, &PageRequest::default())
        .await
        .unwrap();

    assert_eq!(results.len(), expected);
}

#[tokio::test]
async fn test_pages_partition_the_result_set() {
    let store = MemoryAuditStore::new();
    for record in AuditFactory::new().sequence(7) {
        store.insert(&record).await.unwrap();
    }
    assert_eq!(store.len(), 7);

    let filter = build_filter(None, None).unwrap();
    let mut all = Vec::new();
    for number in 1..=3 {
        let page = PageRequest::new(number, 3);
        let results = paginate(&store, &filter, &Projection::All, &page)
            .await
            .unwrap();
        all.extend(results.iter().map(|r| r["_id"].to_string()));
    }

    assert_eq!(all.len(), 7);
    let unique: BTreeSet<_> = all.iter().collect();
    assert_eq!(unique.len(), 7);
}

#[tokio::test]
async fn test_full_plan_round_trip() {
    let store = seeded_store().await;
    let query = AuditQuery {
        page_size: Some("2".to_string()),
        page_number: Some("2".to_string()),
        start_date: Some("2023-04-20T08:00:00Z".to_string()),
        ..Default::default()
    };
    let selection = FieldSelection {
        select: Some(vec!["userId".to_string()]),
    };

    let plan = QueryPlan::from_request(&query, &selection, 1000).unwrap();
    let results = paginate(&store, &plan.filter, &plan.projection, &plan.page)
        .await
        .unwrap();
    let page = build_response("http://h/api/v1/audit?pageSize=2&pageNumber=2", &plan.page, results);

    assert_eq!(
        user_ids(&page.results),
        ["2222222222222222222222", "3333333333333333333333"]
    );
    assert!(page.results.iter().all(|r| r.as_object().unwrap().len() == 2));
    assert_eq!(page.links.base, "http://h/api/v1/audit");
    assert!(page.links.prev.is_some());
    assert!(page.links.next.is_some());
}

#[tokio::test]
async fn test_projection_hides_unselected_fields() {
    let store = seeded_store().await;
    let selected = vec!["_id".to_string(), "timeStamp".to_string(), "data".to_string()];
    let projection = project_fields(Some(selected.as_slice()));

    let results = paginate(
        &store,
        &build_filter(None, None).unwrap(),
        &projection,
        &PageRequest::default(),
    )
    .await
    .unwrap();

    for result in results {
        assert!(result.get("userId").is_none());
        assert!(result.get("source").is_none());
        assert!(result.get("method").is_none());
        assert!(result.get("data").is_some());
    }
}

#[tokio::test]
async fn test_store_errors_propagate() {
    let store = FailingAuditStore::default();
    let err = paginate(
        &store,
        &build_filter(None, None).unwrap(),
        &Projection::All,
        &PageRequest::default(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("connection refused"));
}
