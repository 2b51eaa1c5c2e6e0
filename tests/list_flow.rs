use pnc_console::AppError;
use pnc_console::api::client::PncClient;
use pnc_console::cli::command_handlers::ListHandler;
use pnc_console::cli::main_types::ListArgs;
use pnc_console::core::query_params::get_component_query_param_value;
use pnc_console::error::ApiError;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn builds_page() -> Value {
    json!({
        "pageIndex": 1,
        "pageSize": 10,
        "totalPages": 1,
        "totalHits": 2,
        "content": [
            {"id": "100", "status": "BUILDING", "submitTime": "2024-05-01T10:00:00Z"},
            {"id": "101", "status": "SUCCESS", "submitTime": "2024-05-01T09:00:00Z"}
        ]
    })
}

fn client_for(server: &MockServer) -> Arc<PncClient> {
    Arc::new(PncClient::with_timeout(server.uri(), 5).expect("client"))
}

fn list_args(resource: &str) -> ListArgs {
    ListArgs {
        resource: resource.to_string(),
        retries: 1,
        ..ListArgs::default()
    }
}

#[tokio::test]
async fn defaults_are_written_and_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/builds"))
        .and(query_param("pageIndex", "1"))
        .and(query_param("pageSize", "10"))
        .and(query_param("sort", "=desc=submitTime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(builds_page()))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = ListHandler::new()
        .fetch(&list_args("builds"), client_for(&server), 10, false)
        .await
        .expect("list succeeds");

    assert_eq!(outcome.page.content.len(), 2);
    assert_eq!(outcome.location.pathname, "/builds");
    let search = &outcome.location.search;
    assert_eq!(
        get_component_query_param_value(search, "sort", None).as_deref(),
        Some("=desc=submitTime")
    );
    assert_eq!(
        get_component_query_param_value(search, "pageSize", None).as_deref(),
        Some("10")
    );
}

#[tokio::test]
async fn component_parameters_are_scoped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("pageIndex", "3"))
        .and(query_param("pageSize", "5"))
        .and(query_param("sort", "=asc=name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pageIndex": 3, "pageSize": 5, "totalPages": 3, "totalHits": 11,
            "content": [{"id": "7", "name": "EAP"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let args = ListArgs {
        search: "?left-pageIndex=3&left-pageSize=5&right-pageIndex=9".to_string(),
        component: Some("left".to_string()),
        ..list_args("products")
    };
    let outcome = ListHandler::new()
        .fetch(&args, client_for(&server), 10, false)
        .await
        .expect("list succeeds");

    let search = &outcome.location.search;
    assert_eq!(
        get_component_query_param_value(search, "pageIndex", Some("right")).as_deref(),
        Some("9")
    );
    assert_eq!(
        get_component_query_param_value(search, "sort", Some("left")).as_deref(),
        Some("=asc=name")
    );
    assert_eq!(get_component_query_param_value(search, "sort", None), None);
}

#[tokio::test]
async fn user_choices_reach_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/builds"))
        .and(query_param("pageIndex", "2"))
        .and(query_param("pageSize", "25"))
        .and(query_param("sort", "=asc=status"))
        .and(query_param("q", "status==FAILED"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(builds_page()))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = PncClient::with_timeout(server.uri(), 5).expect("client");
    client.set_token("secret".to_string());
    let args = ListArgs {
        query: Some("status==FAILED".to_string()),
        sort: Some("status:asc".to_string()),
        page_size: Some(25),
        page: Some(2),
        ..list_args("builds")
    };

    ListHandler::new()
        .fetch(&args, Arc::new(client), 10, false)
        .await
        .expect("list succeeds");
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/artifacts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/artifacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pageIndex": 1, "pageSize": 10, "totalPages": 1, "totalHits": 1,
            "content": [{"id": "a1", "identifier": "org.jboss:core:1.0"}]
        })))
        .mount(&server)
        .await;

    let args = ListArgs {
        retries: 3,
        ..list_args("artifacts")
    };
    let outcome = ListHandler::new()
        .fetch(&args, client_for(&server), 10, false)
        .await
        .expect("second attempt succeeds");

    assert_eq!(outcome.page.total_hits, 1);
}

#[tokio::test]
async fn unauthorized_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/builds"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let args = ListArgs {
        retries: 3,
        ..list_args("builds")
    };
    let result = ListHandler::new()
        .fetch(&args, client_for(&server), 10, false)
        .await;

    assert!(matches!(
        result,
        Err(AppError::Api(ApiError::Unauthorized { status: 401, .. }))
    ));
    // authentication failures are not retried
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(1));
}

#[tokio::test]
async fn pushed_updates_replace_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/builds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(builds_page()))
        .mount(&server)
        .await;

    let dir = tempdir().expect("temp dir");
    let updates = dir.path().join("updates.jsonl");
    std::fs::write(
        &updates,
        concat!(
            "{\"build\": {\"id\": \"100\", \"status\": \"SUCCESS\"}}\n",
            "\n",
            "{\"build\": {\"id\": \"999\", \"status\": \"FAILED\"}}\n",
        ),
    )
    .expect("write updates");

    let args = ListArgs {
        updates: Some(updates),
        ..list_args("builds")
    };
    let outcome = ListHandler::new()
        .fetch(&args, client_for(&server), 10, false)
        .await
        .expect("list succeeds");

    let statuses: Vec<&str> = outcome
        .page
        .content
        .iter()
        .filter_map(|row| row["status"].as_str())
        .collect();
    assert_eq!(statuses, vec!["SUCCESS", "SUCCESS"]);
    assert_eq!(outcome.page.content.len(), 2);
}

#[tokio::test]
async fn unknown_resource_is_rejected_before_any_request() {
    let server = MockServer::start().await;

    let result = ListHandler::new()
        .fetch(&list_args("milestones"), client_for(&server), 10, false)
        .await;

    assert!(matches!(result, Err(AppError::Cli(_))));
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(0));
}
