use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use scout_core::{
    JobHandle, JobOutcome, JobStatus, ScrapeRequest, SubmitRejected, TaskId, ValidationError,
};
use scout_engine::{ClientSettings, JobPoller, PollEvent, ReqwestJobClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

fn settings(server: &MockServer) -> ClientSettings {
    ClientSettings {
        poll_interval: Duration::from_millis(20),
        ..ClientSettings::with_base_url(format!("{}/api", server.uri()))
    }
}

fn poller(settings: &ClientSettings) -> JobPoller {
    let client = ReqwestJobClient::new(settings).expect("client");
    JobPoller::new(Arc::new(client), settings)
}

fn request() -> ScrapeRequest {
    ScrapeRequest {
        api_key: "secret".to_string(),
        ..ScrapeRequest::default()
    }
}

async fn mount_submit(server: &MockServer, task_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/start-scrape"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"task_id": task_id, "status": "PENDING"})),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn collect(events: scout_engine::PollEvents) -> Vec<PollEvent> {
    tokio::time::timeout(WAIT, events.collect::<Vec<_>>())
        .await
        .expect("poll loop finished in time")
}

#[tokio::test]
async fn single_submission_then_polls_until_success() {
    let server = MockServer::start().await;
    mount_submit(&server, "t-1").await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"task_id": "t-1", "status": "PENDING"})),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "t-1",
            "status": "SUCCESS",
            "result": [{"title": "one"}, {"title": "two"}]
        })))
        .mount(&server)
        .await;

    let settings = settings(&server);
    let (_handle, events) = poller(&settings).start_stream(request()).expect("valid");
    let events = collect(events).await;

    assert_eq!(events.len(), 4);
    assert_eq!(
        events[0],
        PollEvent::Submitted(JobHandle {
            task_id: TaskId::new("t-1"),
            status: JobStatus::Pending,
        })
    );
    assert_eq!(events[1], PollEvent::StillRunning(JobStatus::Pending));
    assert_eq!(events[2], PollEvent::StillRunning(JobStatus::Pending));
    match &events[3] {
        PollEvent::Finished(JobOutcome::Succeeded(deals)) => assert_eq!(deals.len(), 2),
        other => panic!("unexpected terminal event {other:?}"),
    }
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    let requests = server.received_requests().await.expect("recording on");
    let polls = requests.iter().filter(|r| r.method.as_str() == "GET").count();
    assert_eq!(polls, 3);
}

#[tokio::test]
async fn failure_status_ends_with_backend_message() {
    let server = MockServer::start().await;
    mount_submit(&server, "t-2").await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "t-2",
            "status": "FAILURE",
            "error": "scraper crashed"
        })))
        .mount(&server)
        .await;

    let settings = settings(&server);
    let (_handle, events) = poller(&settings).start_stream(request()).expect("valid");
    let events = collect(events).await;

    assert_eq!(
        events.last(),
        Some(&PollEvent::Finished(JobOutcome::Failed {
            message: "scraper crashed".to_string()
        }))
    );
}

#[tokio::test]
async fn transient_poll_errors_are_retried() {
    let server = MockServer::start().await;
    mount_submit(&server, "t-3").await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t-3"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t-3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"task_id": "t-3", "status": "SUCCESS"})),
        )
        .mount(&server)
        .await;

    let settings = settings(&server);
    let (_handle, events) = poller(&settings).start_stream(request()).expect("valid");
    let events = collect(events).await;

    assert_eq!(
        events.last(),
        Some(&PollEvent::Finished(JobOutcome::Succeeded(Vec::new())))
    );
}

#[tokio::test]
async fn bounded_retries_give_up_as_failure() {
    let server = MockServer::start().await;
    mount_submit(&server, "t-4").await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t-4"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let settings = ClientSettings {
        max_poll_errors: Some(3),
        ..settings(&server)
    };
    let (_handle, events) = poller(&settings).start_stream(request()).expect("valid");
    let events = collect(events).await;

    match events.last() {
        Some(PollEvent::Finished(JobOutcome::Failed { message })) => {
            assert!(message.contains("3 failed status checks"), "{message}")
        }
        other => panic!("unexpected terminal event {other:?}"),
    }
    let requests = server.received_requests().await.expect("recording on");
    assert_eq!(requests.iter().filter(|r| r.method.as_str() == "GET").count(), 3);
}

#[tokio::test]
async fn submit_failure_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/start-scrape"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "bad model"})))
        .mount(&server)
        .await;

    let settings = settings(&server);
    let (_handle, events) = poller(&settings).start_stream(request()).expect("valid");
    let events = collect(events).await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        PollEvent::SubmitFailed(err) => assert_eq!(err.message, "bad model"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_loop_stops_polling() {
    let server = MockServer::start().await;
    mount_submit(&server, "t-5").await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t-5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"task_id": "t-5", "status": "STARTED"})),
        )
        .mount(&server)
        .await;

    let settings = settings(&server);
    let (mut handle, mut events) = poller(&settings).start_stream(request()).expect("valid");
    // Wait for the submission and one poll, then cancel.
    for _ in 0..2 {
        tokio::time::timeout(WAIT, events.next())
            .await
            .expect("event in time")
            .expect("stream open");
    }
    handle.cancel();
    handle.cancel();
    tokio::time::timeout(WAIT, handle.finished())
        .await
        .expect("loop returned");
    assert!(handle.is_finished());
    assert_eq!(events.next().await, None);

    let before = server.received_requests().await.expect("recording on").len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let after = server.received_requests().await.expect("recording on").len();
    assert_eq!(before, after);
}

#[tokio::test]
async fn invalid_request_never_reaches_network() {
    let server = MockServer::start().await;
    let settings = settings(&server);

    let missing_key = ScrapeRequest::default();
    let err = poller(&settings).start_stream(missing_key).err();
    assert_eq!(err, Some(SubmitRejected::Invalid(ValidationError::MissingApiKey)));

    let no_pages = ScrapeRequest {
        max_pages: 0,
        ..request()
    };
    assert_eq!(
        poller(&settings).start_stream(no_pages).err(),
        Some(SubmitRejected::Invalid(ValidationError::NoPages))
    );

    let requests = server.received_requests().await.expect("recording on");
    assert!(requests.is_empty());
}
