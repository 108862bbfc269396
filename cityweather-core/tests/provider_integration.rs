//! Integration tests for OpenWeatherClient using wiremock.

use std::time::Duration;

use cityweather_core::{
    OpenWeatherClient, ParseError, ProviderSettings, TransportError, WeatherProvider, normalize,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, timeout: Duration) -> OpenWeatherClient {
    OpenWeatherClient::new(ProviderSettings {
        api_key: "TEST_KEY".to_string(),
        base_url: format!("{}/data/2.5/weather", server.uri()),
        timeout,
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_sends_city_key_and_metric_units() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Lille"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Lille"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Duration::from_secs(5));
    let response = client.fetch("Lille").await.unwrap();

    assert_eq!(response.status, 200);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["name"], "Lille");
}

#[tokio::test]
async fn test_fetch_not_found_returns_status_as_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Duration::from_secs(5));
    let response = client.fetch("xxxx").await.unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.body, "404");
    assert!(!response.is_success());
    assert_eq!(normalize(&response.body).unwrap_err(), ParseError::NotJson);
}

#[tokio::test]
async fn test_fetch_unauthorized_is_not_a_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Duration::from_secs(5));
    let response = client.fetch("Nancy").await.unwrap();

    assert_eq!(response.body, "401");
}

#[tokio::test]
async fn test_fetch_timeout_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Duration::from_millis(50));
    let err = client.fetch("Nancy").await.unwrap_err();

    assert!(matches!(err, TransportError::Timeout(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn test_fetch_unreachable_host_is_transport_error() {
    let client = OpenWeatherClient::new(ProviderSettings {
        api_key: "TEST_KEY".to_string(),
        base_url: "http://127.0.0.1:1/data/2.5/weather".to_string(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    assert!(client.fetch("Nancy").await.is_err());
}
