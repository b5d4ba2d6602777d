//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

const SOURCE_CSV: &str = "\
Daily log
Date,J,A,M
2024-01-01,2,0,1
2024-01-02,0,3,0
2024-01-03,2,0,0
";

/// Refresher backed by a temp CSV file; keep the TempDir alive for the test
fn setup_refresher() -> (Arc<Refresher>, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.csv");
    std::fs::write(&path, SOURCE_CSV).unwrap();

    let refresher = Arc::new(Refresher::new(
        Some(DataSource::File(path)),
        AnalyticsEngine::default(),
        Arc::new(MemoryReportStore::new()),
    ));
    (refresher, dir)
}

fn setup_test_app(refresher: Arc<Refresher>) -> Router {
    create_router(refresher, None, ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

// ========== Report API Tests ==========

#[tokio::test]
async fn test_data_not_available_before_refresh() {
    let (refresher, _dir) = setup_refresher();
    let response = get(setup_test_app(refresher), "/api/data").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No data available");
}

#[tokio::test]
async fn test_get_data() {
    let (refresher, _dir) = setup_refresher();
    refresher.refresh().await.unwrap();

    let response = get(setup_test_app(refresher), "/api/data").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let points = json["dataPoints"].as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["date"], "2024-01-01");
    assert_eq!(points[0]["J"], 2);
    assert_eq!(json["stats"]["J"]["totalCount"], 4);
    assert_eq!(json["dateRange"]["end"], "2024-01-03");
    assert!(json["insights"].as_array().unwrap().len() >= 5);
}

#[tokio::test]
async fn test_data_is_the_published_report() {
    let (refresher, _dir) = setup_refresher();
    refresher.refresh().await.unwrap();
    let published = refresher.store().get().unwrap();

    let response = get(setup_test_app(refresher.clone()), "/api/data").await;
    let json = get_body_json(response).await;

    assert_eq!(json, serde_json::to_value(published.as_ref()).unwrap());
    assert!(Arc::ptr_eq(&published, &refresher.store().get().unwrap()));
}

#[tokio::test]
async fn test_get_insights_with_limit() {
    let (refresher, _dir) = setup_refresher();
    refresher.refresh().await.unwrap();

    let response = get(setup_test_app(refresher), "/api/insights?limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let insights = json.as_array().unwrap();
    assert_eq!(insights.len(), 2);
    assert_eq!(insights[0]["type"], "comparison");
    assert_eq!(insights[0]["person"], "J");
    assert_eq!(insights[1]["type"], "streak");
}

#[tokio::test]
async fn test_get_stats() {
    let (refresher, _dir) = setup_refresher();
    refresher.refresh().await.unwrap();

    let response = get(setup_test_app(refresher), "/api/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["A"]["totalCount"], 3);
    assert_eq!(json["A"]["peakDay"], "2024-01-02");
    assert_eq!(json["M"]["zeroDays"], 2);
}

// ========== Refresh API Tests ==========

#[tokio::test]
async fn test_refresh_status_before_and_after() {
    let (refresher, _dir) = setup_refresher();

    let response = get(setup_test_app(refresher.clone()), "/api/refresh/status").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    refresher.refresh().await.unwrap();
    let response = get(setup_test_app(refresher), "/api/refresh/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert!(json["lastRefresh"].is_string());
    assert!(json["nextRefresh"].is_null());
    assert_eq!(json["timeUntilNextRefresh"], 0);
}

#[tokio::test]
async fn test_refresh_status_reports_schedule() {
    let (refresher, _dir) = setup_refresher();
    refresher.refresh().await.unwrap();
    refresher.set_next_refresh(Some(chrono::Utc::now() + chrono::Duration::minutes(30)));

    let json = get_body_json(get(setup_test_app(refresher), "/api/refresh/status").await).await;
    let remaining = json["timeUntilNextRefresh"].as_i64().unwrap();
    assert!(remaining > 0 && remaining <= 30 * 60 * 1000);
}

#[tokio::test]
async fn test_trigger_refresh() {
    let (refresher, _dir) = setup_refresher();

    let response = post(setup_test_app(refresher.clone()), "/api/refresh").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["dataPoints"], 3);
    assert!(refresher.store().get().is_some());
}

#[tokio::test]
async fn test_trigger_refresh_without_source() {
    let refresher = Arc::new(Refresher::new(
        None,
        AnalyticsEngine::default(),
        Arc::new(MemoryReportStore::new()),
    ));

    let response = post(setup_test_app(refresher), "/api/refresh").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_refresh_is_sanitized() {
    let (refresher, dir) = setup_refresher();
    refresher.refresh().await.unwrap();
    std::fs::remove_file(dir.path().join("log.csv")).unwrap();

    let response = post(setup_test_app(refresher.clone()), "/api/refresh").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "An internal error occurred");

    // Previous report stays published
    let response = get(setup_test_app(refresher), "/api/data").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ========== Middleware Tests ==========

#[tokio::test]
async fn test_security_headers() {
    let (refresher, _dir) = setup_refresher();
    let response = get(setup_test_app(refresher), "/api/data").await;

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn test_unknown_route() {
    let (refresher, _dir) = setup_refresher();
    let response = get(setup_test_app(refresher), "/api/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
