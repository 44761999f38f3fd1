//! Common test utilities for weather-collector integration tests

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use weather_collector::{CityId, Config, Event, TaskStatus, UserId, WeatherCollector};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// API key the mock provider expects
pub const TEST_API_KEY: &str = "test-key";

/// Provider payload for one city, as OpenWeather returns it
pub fn weather_payload(city_id: CityId) -> serde_json::Value {
    json!({
        "coord": {"lon": -56.17, "lat": -34.83},
        "main": {"temp": city_id as f64 / 10.0, "humidity": 40, "pressure": 1012},
        "id": city_id,
        "name": format!("city-{city_id}"),
        "cod": 200
    })
}

/// Start a provider answering 200 for every city in `cities`
pub async fn start_provider(cities: &[CityId]) -> MockServer {
    let server = MockServer::start().await;
    for &city_id in cities {
        Mock::given(method("GET"))
            .and(query_param("id", city_id.to_string()))
            .and(query_param("appid", TEST_API_KEY))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_payload(city_id)))
            .mount(&server)
            .await;
    }
    server
}

/// Config pointing at `server`, with the database and city file in `dir`
pub fn test_config(server: &MockServer, dir: &TempDir, cities: &[CityId]) -> Config {
    let cities_path = dir.path().join("cities.txt");
    let content: Vec<String> = cities.iter().map(|c| c.to_string()).collect();
    std::fs::write(&cities_path, content.join("\n")).unwrap();

    let mut config = Config::default();
    config.weather.api_key = TEST_API_KEY.to_string();
    config.weather.base_url = format!("{}/data/2.5/weather", server.uri());
    config.persistence.database_path = dir.path().join("weather.db");
    config.cities_path = cities_path;
    config.task.shutdown_timeout = Duration::from_secs(5);
    config
}

/// Wait for the task of `user_id` to reach a terminal state
pub async fn wait_for_terminal(
    collector: &WeatherCollector,
    user_id: UserId,
    timeout: Duration,
) -> Option<TaskStatus> {
    tokio::time::timeout(timeout, async {
        loop {
            match collector.status(user_id).await {
                Some(status) if status.is_terminal() => return status,
                _ => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
    })
    .await
    .ok()
}

/// Collect every event until the terminal event of `user_id`
pub async fn events_until_terminal(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    user_id: UserId,
) -> Vec<Event> {
    let mut seen = vec![];
    while let Ok(event) = events.recv().await {
        let done = matches!(
            &event,
            Event::Finished { user_id: id, .. } | Event::Failed { user_id: id, .. } if *id == user_id
        );
        seen.push(event);
        if done {
            break;
        }
    }
    seen
}
