use multisearch_rs::backend::{BackendError, SearchBackend, Weaviate};
use multisearch_rs::config::BackendSettings;
use multisearch_rs::network::HttpClient;
use multisearch_rs::search::Dispatcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer, request_timeout: f64) -> Weaviate {
    let settings = BackendSettings {
        url: server.uri(),
        api_key: Some("secret".to_string()),
        request_timeout,
        ..Default::default()
    };
    let client = HttpClient::with_settings(&settings).unwrap();
    Weaviate::new(client, &settings).unwrap()
}

fn objects(labels: &[&str]) -> serde_json::Value {
    let items: Vec<_> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            json!({
                "text": label,
                "image": "aGVsbG8=",
                "_additional": { "id": format!("id-{}", i), "distance": 0.1 * i as f64 }
            })
        })
        .collect();
    json!({ "data": { "Get": { "Image": items } } })
}

#[tokio::test]
async fn test_search_decodes_candidates_in_backend_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(header("authorization", "Bearer secret"))
        .and(body_string_contains("nearText"))
        .and(body_string_contains("limit: 3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(objects(&["tabby", "lion", "lynx"])))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = backend_for(&server, 5.0).search("cat", 3).await.unwrap();

    let labels: Vec<_> = candidates
        .iter()
        .map(|c| c.label.as_deref().unwrap())
        .collect();
    assert_eq!(labels, vec!["tabby", "lion", "lynx"]);
    assert_eq!(candidates[0].image.as_deref(), Some(&b"hello"[..]));
    assert_eq!(candidates[2].id.as_deref(), Some("id-2"));
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend_for(&server, 5.0).search("cat", 3).await.unwrap_err();
    assert!(matches!(err, BackendError::Unavailable(_)));
}

#[tokio::test]
async fn test_graphql_errors_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Cannot query field \"Image\" on type \"GetObjectsObj\"." }]
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server, 5.0).search("cat", 3).await.unwrap_err();
    assert!(matches!(err, BackendError::Malformed(_)));
}

#[tokio::test]
async fn test_slow_backend_is_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(objects(&["late"]))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server, 0.2).search("cat", 1).await.unwrap_err();
    assert!(matches!(err, BackendError::Timeout));
}

#[tokio::test]
async fn test_dispatcher_fans_out_over_one_shared_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("\\\"dog\\\""))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(objects(&["x", "y"])))
        .mount(&server)
        .await;

    let backend = Arc::new(backend_for(&server, 5.0));
    let result = Dispatcher::new(backend)
        .dispatch(vec!["cat", "dog", "bird"], 2)
        .collect_all()
        .await;

    assert_eq!(result.timings.len(), 3);
    assert_eq!(result.candidates.len(), 4);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].query, "dog");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
