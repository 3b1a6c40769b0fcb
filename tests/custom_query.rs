//! End-to-end tests against a real HTTP server (mockito).
//!
//! These exercise the full path: URL building, validation, transport,
//! classification, hydration and the response cache.

use hal_client::{HalClient, HalConfiguration, HalError, HttpMethod, QueryOptions, Sort};
use mockito::Matcher;
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn client_for(server: &mockito::Server) -> HalClient {
    let base = format!("{}/api", server.url());
    HalClient::new(HalConfiguration::new(base)).unwrap()
}

#[tokio::test]
async fn test_custom_query_hydrates_a_resource() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let self_href = format!("{}/api/orders/1", server.url());
    let mock = server
        .mock("GET", "/api/orders/search/first")
        .with_status(200)
        .with_header("content-type", "application/hal+json")
        .with_body(
            json!({
                "status": "OPEN",
                "total": 12.5,
                "_links": {"self": {"href": self_href}}
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let hydrated = client
        .custom_query("orders", HttpMethod::Get, "search/first", None, None)
        .await
        .unwrap();

    let resource = hydrated.into_resource().unwrap();
    assert_eq!(resource.get("status"), Some(&json!("OPEN")));
    assert_eq!(resource.self_href(), Some(self_href.as_str()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_paged_collection_hydrates_with_metadata() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let collection_href = format!("{}/api/orders", server.url());
    let mock = server
        .mock("GET", "/api/orders")
        .with_status(200)
        .with_body(
            json!({
                "_embedded": {
                    "orders": [
                        {"status": "NEW", "_links": {"self": {"href": format!("{collection_href}/1")}}},
                        {"status": "SHIPPED", "_links": {"self": {"href": format!("{collection_href}/2")}}}
                    ]
                },
                "_links": {
                    "self": {"href": collection_href},
                    "next": {"href": format!("{collection_href}?page=1")}
                },
                "page": {"size": 2, "totalElements": 5, "totalPages": 3, "number": 0}
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let page = client.get_page("orders", None).await.unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.page().total_elements, 5);
    assert!(page.page().pages_consistent());
    assert!(page.has_next());
    let first = &page.items()[0];
    assert_eq!(first.parent().relation, "orders");
    assert_eq!(first.parent().href.as_deref(), Some(collection_href.as_str()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_identical_gets_share_one_request() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/orders/1")
        .with_status(200)
        .with_body(json!({"status": "OPEN", "_links": {"self": {"href": "http://h/1"}}}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let (a, b) = tokio::join!(
        client.custom_query("orders", HttpMethod::Get, "1", None, None),
        client.custom_query("orders", HttpMethod::Get, "1", None, None),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_mutation_invalidates_the_cached_read() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let get_mock = server
        .mock("GET", "/api/orders/1")
        .with_status(200)
        .with_body(json!({"status": "OPEN", "_links": {"self": {"href": "http://h/1"}}}).to_string())
        .expect(2)
        .create_async()
        .await;
    let put_mock = server
        .mock("PUT", "/api/orders/1")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);

    // Two reads, one wire hit.
    client
        .custom_query("orders", HttpMethod::Get, "1", None, None)
        .await
        .unwrap();
    client
        .custom_query("orders", HttpMethod::Get, "1", None, None)
        .await
        .unwrap();

    // The write returns no body and drops the cached read.
    let written = client
        .custom_query(
            "orders",
            HttpMethod::Put,
            "1",
            Some(json!({"status": "PAID"})),
            None,
        )
        .await
        .unwrap();
    assert!(written.as_raw().is_some());

    client
        .custom_query("orders", HttpMethod::Get, "1", None, None)
        .await
        .unwrap();

    get_mock.assert_async().await;
    put_mock.assert_async().await;
}

#[tokio::test]
async fn test_error_responses_are_not_cached() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/orders/9")
        .with_status(500)
        .with_body("boom")
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    for _ in 0..2 {
        let err = client
            .custom_query("orders", HttpMethod::Get, "9", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("HTTP 500"));
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_preconditions_issue_no_request() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let catch_all = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);

    let err = client
        .custom_query("", HttpMethod::Get, "search/all", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::MissingResourceName));
    assert_eq!(err.to_string(), "resource name should be defined");

    let err = client
        .custom_query("orders", HttpMethod::Get, "", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::MissingQuery));

    let err = client
        .custom_query("orders", HttpMethod::Delete, "1", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::UnsupportedMethod(_)));
    assert!(err.to_string().contains("DELETE"));

    catch_all.assert_async().await;
}

#[tokio::test]
async fn test_query_options_reach_the_wire() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/orders/search/findByStatus")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("status".into(), "OPEN".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("size".into(), "20".into()),
            Matcher::UrlEncoded("sort".into(), "createdAt,DESC".into()),
        ]))
        .with_status(200)
        .with_body(json!({"_embedded": {"orders": []}}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let options = QueryOptions::new()
        .with_param("status", "OPEN")
        .with_page(1)
        .with_size(20)
        .with_sort(Sort::desc("createdAt"));
    let hydrated = client
        .custom_query(
            "orders",
            HttpMethod::Get,
            "search/findByStatus",
            None,
            Some(options),
        )
        .await
        .unwrap();

    assert!(hydrated.as_collection().is_some());
    assert!(hydrated.as_collection().unwrap().is_empty());
    mock.assert_async().await;
}
