use super::*;
use crate::collector::test_helpers::{MockWeatherProvider, RecordingStore, test_collector};
use crate::types::{CityId, TaskStatus, UserId};
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;


/// Collector over test doubles, wrapped for the router
fn create_test_collector(
    cities: Vec<CityId>,
    provider: MockWeatherProvider,
) -> (Arc<WeatherCollector>, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::new());
    let collector = test_collector(cities, Arc::new(provider), Arc::clone(&store));
    (Arc::new(collector), store)
}

fn router_for(collector: &Arc<WeatherCollector>) -> Router {
    let config = collector.get_config();
    create_router(Arc::clone(collector), config)
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_user(user_id: i64) -> Request {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "user_id": user_id }).to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn wait_terminal(collector: &WeatherCollector, user_id: UserId) -> TaskStatus {
    loop {
        if let Some(status) = collector.status(user_id).await {
            if status.is_terminal() {
                return status;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_api_server_stops_on_shutdown_signal() {
    let (collector, _store) = create_test_collector(vec![1], MockWeatherProvider::succeeding());

    let mut config = (*collector.get_config()).clone();
    config.server.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(start_api_server(collector, config, async {
        let _ = rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_api_server_stops_with_open_event_stream() {
    let (collector, _store) = create_test_collector(vec![1], MockWeatherProvider::succeeding());
    let config = collector.get_config();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, Arc::clone(&collector), config, async {
        let _ = rx.await;
    }));

    let client = tokio::spawn(async move {
        let mut response = reqwest::get(format!("http://{addr}/events")).await.unwrap();
        let status = response.status();
        while response.chunk().await.unwrap().is_some() {}
        status
    });

    // Let the client connect and subscribe
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop while an event stream is open")
        .unwrap();
    assert!(result.is_ok());

    let status = tokio::time::timeout(Duration::from_secs(5), client)
        .await
        .expect("event stream should end on shutdown")
        .unwrap();
    assert_eq!(status, reqwest::StatusCode::OK);
}

#[tokio::test]
async fn test_event_stream_ends_when_shutdown_token_is_cancelled() {
    use futures::StreamExt;

    let (collector, _store) = create_test_collector(vec![1], MockWeatherProvider::succeeding());
    let token = CancellationToken::new();
    let state = AppState::with_shutdown(
        Arc::clone(&collector),
        collector.get_config(),
        token.clone(),
    );
    let app = build_router(state);

    let response = app.oneshot(get("/events")).await.unwrap();
    let mut body = response.into_body().into_data_stream();

    token.cancel();

    let next = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("body should finish after cancellation");
    assert!(next.is_none());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (collector, _store) = create_test_collector(vec![1], MockWeatherProvider::succeeding());

    let mut config = (*collector.get_config()).clone();
    config.server.cors_enabled = true;
    config.server.cors_origins = vec!["*".to_string()];
    let app = create_router(collector, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (collector, _store) = create_test_collector(vec![1], MockWeatherProvider::succeeding());

    let mut config = (*collector.get_config()).clone();
    config.server.cors_enabled = false;
    let app = create_router(collector, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (collector, _store) = create_test_collector(vec![1], MockWeatherProvider::succeeding());

    let mut config = (*collector.get_config()).clone();
    config.server.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(collector, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://allowed.example"
    );
}
