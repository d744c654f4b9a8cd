#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use client::{ContentClient, DataService};
use mockito::{self, Matcher};
use serde_json::json;
use shared_types::ContentKey;
use std::sync::Arc;

#[tokio::test]
async fn test_health_check() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(r#"{"status":"healthy","service":"site-content"}"#)
        .create();

    let client = ContentClient::new(server.url()).unwrap();
    let healthy = client.health_check().await.unwrap();
    assert!(healthy);
}

#[tokio::test]
async fn test_get_data() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("GET", "/data")
        .match_query(Matcher::UrlEncoded("key".into(), "hero-subtitle".into()))
        .with_status(200)
        .with_body(r#"{"data": "BUILT TO LAST"}"#)
        .create();

    let client = ContentClient::new(server.url()).unwrap();
    let value = client.get_data(ContentKey::HeroSubtitle).await.unwrap();

    assert_eq!(value, json!("BUILT TO LAST"));
}

#[tokio::test]
async fn test_get_data_error_carries_message() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("GET", "/data")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error": "Invalid key"}"#)
        .create();

    let client = ContentClient::new(server.url()).unwrap();
    let result = client.get_data(ContentKey::NewsData).await;

    let message = result.unwrap_err().to_string();
    assert!(message.contains("400"));
    assert!(message.contains("Invalid key"));
}

#[tokio::test]
async fn test_get_many() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("GET", "/data")
        .match_query(Matcher::UrlEncoded(
            "keys".into(),
            "hero-subtitle,news-data".into(),
        ))
        .with_status(200)
        .with_body(r#"{"data": {"hero-subtitle": "Hi", "news-data": [{"id": "n-1"}]}}"#)
        .create();

    let client = ContentClient::new(server.url()).unwrap();
    let values = client
        .get_many(&[ContentKey::HeroSubtitle, ContentKey::NewsData])
        .await
        .unwrap();

    assert_eq!(values.len(), 2);
    assert_eq!(values[&ContentKey::HeroSubtitle], json!("Hi"));
    assert_eq!(values[&ContentKey::NewsData], json!([{"id": "n-1"}]));
}

#[tokio::test]
async fn test_put_data_sends_token() {
    let mut server = mockito::Server::new_async().await;

    let m = server
        .mock("POST", "/data")
        .match_header("content-type", "application/json")
        .match_header("x-admin-token", "secret")
        .match_body(Matcher::Json(json!({
            "key": "services-data",
            "data": [{"id": "s-1", "title": "Groundworks"}]
        })))
        .with_status(200)
        .with_body(r#"{"success": true, "data": [{"id": "s-1", "title": "Groundworks"}]}"#)
        .create_async()
        .await;

    let client = ContentClient::new(server.url())
        .unwrap()
        .with_admin_token("secret");
    client
        .put_data(
            ContentKey::ServicesData,
            &json!([{"id": "s-1", "title": "Groundworks"}]),
        )
        .await
        .unwrap();

    m.assert_async().await;
}

#[tokio::test]
async fn test_put_data_unauthorized() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("POST", "/data")
        .with_status(401)
        .with_body(r#"{"error": "Unauthorized"}"#)
        .create();

    let client = ContentClient::new(server.url()).unwrap();
    let result = client.put_data(ContentKey::HeroSubtitle, &json!("x")).await;

    assert!(result.unwrap_err().to_string().contains("Unauthorized"));
}

#[tokio::test]
async fn test_upload() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("POST", "/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data".to_string()),
        )
        .with_status(200)
        .with_body(r#"{"success": true, "url": "data:image/png;base64,iVBORw=="}"#)
        .create();

    let client = ContentClient::new(server.url()).unwrap();
    let url = client
        .upload("hero.png", "image/png", vec![0x89, b'P', b'N', b'G'])
        .await
        .unwrap();

    assert_eq!(url, "data:image/png;base64,iVBORw==");
}

#[tokio::test]
async fn test_submit_lead() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("POST", "/leads/contact")
        .match_body(Matcher::PartialJson(json!({"email": "site@example.com"})))
        .with_status(200)
        .with_body(r#"{"success": true, "id": "3f2a"}"#)
        .create();

    let client = ContentClient::new(server.url()).unwrap();
    let id = client
        .submit_lead(
            "contact",
            &json!({"name": "Sam", "email": "site@example.com", "message": "Quote please"}),
        )
        .await
        .unwrap();

    assert_eq!(id, "3f2a");
}

#[tokio::test]
async fn test_service_falls_back_when_batch_fails() {
    let mut server = mockito::Server::new_async().await;

    let batch = server
        .mock("GET", "/data")
        .match_query(Matcher::Regex("keys=".to_string()))
        .with_status(500)
        .with_body(r#"{"error": "Internal Server Error"}"#)
        .expect(1)
        .create_async()
        .await;
    let services = server
        .mock("GET", "/data")
        .match_query(Matcher::UrlEncoded("key".into(), "services-data".into()))
        .with_status(200)
        .with_body(r#"{"data": [{"id": "s-1"}]}"#)
        .expect(1)
        .create_async()
        .await;
    let portfolio = server
        .mock("GET", "/data")
        .match_query(Matcher::UrlEncoded("key".into(), "portfolio-data".into()))
        .with_status(200)
        .with_body(r#"{"data": [{"id": "p-1"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let service = DataService::new(Arc::new(ContentClient::new(server.url()).unwrap()));
    let values = service
        .get_batch(&[ContentKey::ServicesData, ContentKey::PortfolioData])
        .await;

    assert_eq!(values[&ContentKey::ServicesData], json!([{"id": "s-1"}]));
    assert_eq!(values[&ContentKey::PortfolioData], json!([{"id": "p-1"}]));

    // Second read is served from the cache
    service.get(ContentKey::ServicesData, false).await;

    batch.assert_async().await;
    services.assert_async().await;
    portfolio.assert_async().await;
}

#[tokio::test]
async fn test_service_read_failure_is_none() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("GET", "/data")
        .match_query(Matcher::Any)
        .with_status(500)
        .create();

    let service = DataService::new(Arc::new(ContentClient::new(server.url()).unwrap()));

    assert_eq!(service.get(ContentKey::HeroSubtitle, false).await, None);
}
