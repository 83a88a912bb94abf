use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;

use click_recs::api::{create_router, AppState};
use click_recs::db::{create_redis_client, EventStore, InMemoryEventStore, RedisEventStore};
use click_recs::models::{ClickEvent, EventTimestamp};

fn click(product: &str, category: &str, price: f64, second: u32) -> ClickEvent {
    ClickEvent::new(
        product,
        category,
        price,
        Some(EventTimestamp::new(2024, 5, 17, 14, 3, second)),
    )
}

fn create_test_server(events: Vec<ClickEvent>) -> TestServer {
    let store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::with_events(events));
    let app = create_router(AppState::with_store(store));
    TestServer::new(app).unwrap()
}

fn scenario_events() -> Vec<ClickEvent> {
    vec![
        click("A", "Electronics", 100.0, 0),
        click("B", "Books", 20.0, 1),
        click("A", "Electronics", 100.0, 3),
        click("C", "Toys", 0.0, 12),
    ]
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(Vec::new());
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["events"], 0);
}

#[tokio::test]
async fn test_health_check_counts_events() {
    let server = create_test_server(scenario_events());
    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["events"], 4);
}

#[tokio::test]
async fn test_health_check_reports_unreachable_store() {
    let client = create_redis_client("redis://127.0.0.1:1").unwrap();
    let store: Arc<dyn EventStore> = Arc::new(RedisEventStore::new(client, "click_events"));
    let server = TestServer::new(create_router(AppState::with_store(store))).unwrap();

    let response = server.get("/health").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["store"], "redis");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server(Vec::new());
    let response = server.get("/").await;
    response.assert_status_ok();
    let header = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(header.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_recommend_direct_rule() {
    let server = create_test_server(scenario_events());

    let response = server.get("/recommend/A").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["product_name"], "A");
    assert_eq!(body["total_recommendations"], 1);
    assert_eq!(body["recommendations"][0]["product"], "B");
    assert_eq!(body["recommendations"][0]["confidence"], 1.0);
    assert_eq!(body["recommendations"][0]["support"], 0.5);
    assert_eq!(body["recommendations"][0]["rule"], "A → B");
    assert_eq!(body["recommendations"][0]["source"], "direct");
    assert_eq!(body["summary"]["total_transactions"], 2);
    assert_eq!(body["summary"]["min_support"], 0.05);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_recommend_fallback_for_unseen_product() {
    let server = create_test_server(scenario_events());

    let response = server
        .get("/recommend/Z")
        .add_query_param("max_recommendations", 1)
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_ne!(recommendations[0]["product"], "Z");
    assert_eq!(recommendations[0]["source"], "fallback");
}

#[tokio::test]
async fn test_recommend_accepts_time_window_alias() {
    let server = create_test_server(scenario_events());

    // One 60-second bucket collapses everything into a single transaction
    let response = server
        .get("/recommend/A")
        .add_query_param("time_window", 60)
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["window_seconds"], 60);
    assert_eq!(body["summary"]["total_transactions"], 1);
    assert_eq!(body["learning_groups"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_recommend_without_data_is_bad_request() {
    let server = create_test_server(Vec::new());

    let response = server.get("/recommend/A").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["kind"], "no_data");
    assert_eq!(body["error"]["message"], "no transaction data");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 0);
    assert_eq!(body["summary"]["total_transactions"], 0);
}

#[tokio::test]
async fn test_recommend_rejects_zero_window() {
    let server = create_test_server(scenario_events());
    let response = server
        .get("/recommend/A")
        .add_query_param("window_seconds", 0)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_group_info() {
    let server = create_test_server(scenario_events());

    let response = server.get("/groups/info").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_groups"], 2);
    assert_eq!(body["group_types"]["time_groups"], 2);
    assert_eq!(body["group_types"]["session_groups"], 0);
    assert_eq!(body["groups"][0]["group_id"], "2024-05-17_14-03-00");
    assert_eq!(body["groups"][0]["products"], serde_json::json!(["A", "B"]));
    assert_eq!(
        body["groups"][0]["categories"],
        serde_json::json!(["Books", "Electronics"])
    );
    assert_eq!(body["summary"]["total_products"], 3);
}

#[tokio::test]
async fn test_group_info_empty_store() {
    let server = create_test_server(Vec::new());

    let response = server.get("/groups/info").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_groups"], 0);
    assert_eq!(body["error"]["kind"], "no_data");
}

#[tokio::test]
async fn test_product_analytics() {
    let server = create_test_server(scenario_events());

    let response = server.get("/analytics/products").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_products"], 3);
    assert_eq!(body["total_clicks"], 4);
    assert_eq!(body["top_products"][0]["product_name"], "A");
    assert_eq!(body["top_products"][0]["clicks"], 2);
    assert_eq!(body["category_distribution"]["Electronics"], 2);
    assert_eq!(body["price_statistics"]["count"], 3);
    assert_eq!(body["price_statistics"]["min"], 20.0);
}
