use pretty_assertions::assert_eq;
use scout_core::{JobStatus, ScrapeRequest, TaskId};
use scout_engine::{ClientErrorKind, ClientSettings, JobClient, ReqwestJobClient};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestJobClient {
    ReqwestJobClient::new(&ClientSettings::with_base_url(format!("{}/api", server.uri())))
        .expect("client")
}

fn request() -> ScrapeRequest {
    ScrapeRequest {
        api_key: "secret".to_string(),
        system_prompt: "find deals".to_string(),
        ..ScrapeRequest::default()
    }
}

#[tokio::test]
async fn submit_posts_request_and_returns_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/start-scrape"))
        .and(body_json(json!({
            "target_companies": "ICEYE",
            "sources": ["SpaceNews"],
            "ai_model": "mistral-large-latest",
            "api_key": "secret",
            "system_prompt": "find deals",
            "min_year": 2024,
            "max_pages": 1,
            "force_rescan": false
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"task_id": "t-1", "status": "PENDING"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let handle = client_for(&server).submit(&request()).await.expect("submit ok");
    assert_eq!(handle.task_id, TaskId::new("t-1"));
    assert_eq!(handle.status, JobStatus::Pending);
}

#[tokio::test]
async fn submit_rejection_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/start-scrape"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"detail": "unknown source"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).submit(&request()).await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Rejected(422));
    assert_eq!(err.message, "unknown source");
    assert!(err.is_rejection());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn poll_once_reads_result_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "t-9",
            "status": "SUCCESS",
            "result": [
                {"source": "SpaceNews", "title": "ICEYE raises", "published_date": "2024-05-01",
                 "deal_type": "Funding", "amount": "$93M"}
            ]
        })))
        .mount(&server)
        .await;

    let snapshot = client_for(&server)
        .poll_once(&TaskId::new("t-9"))
        .await
        .expect("poll ok");
    assert_eq!(snapshot.status, JobStatus::Success);
    let deals = snapshot.result.expect("result");
    assert_eq!(deals.len(), 1);
    assert_eq!(deals[0].title, "ICEYE raises");
    assert_eq!(deals[0].text_field("amount"), Some("$93M"));
}

#[tokio::test]
async fn server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t-1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .poll_once(&TaskId::new("t-1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::HttpStatus(503));
    assert!(err.is_transient());
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/results"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_aggregate_results()
        .await
        .unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Decode);
}

#[tokio::test]
async fn deals_and_heatmap_pass_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/deals"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"title": "a"}, {"title": "b"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/heatmap"))
        .and(query_param("targets", "ICEYE, Planet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "ICEYE", "score": 9.5, "deals": 4},
            {"name": "Planet", "score": 3}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let deals = client.fetch_deals(25).await.expect("deals");
    assert_eq!(deals.len(), 2);

    let tiles = client.fetch_heatmap("  ICEYE, Planet ").await.expect("heatmap");
    assert_eq!(tiles.len(), 2);
    assert_eq!(tiles[0].name, "ICEYE");
    assert_eq!(tiles[0].extra.get("deals"), Some(&json!(4)));
    assert_eq!(tiles[1].score, 3.0);
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let client = ReqwestJobClient::new(&ClientSettings::with_base_url("http://127.0.0.1:9/api"))
        .expect("client");
    let err = client.fetch_aggregate_results().await.unwrap_err();
    assert!(matches!(
        err.kind,
        ClientErrorKind::Transport | ClientErrorKind::Timeout
    ));
}
