use std::sync::Arc;
use std::time::Duration;

use aily_client::{
    AilyClient, CompletionRequest, CompletionSettings, ExecStatus, MockTransport, RequestOptions,
};
use aily_session::{MemoryRecordCache, RecordCache, SharedRecordCache};
use reqwest::Method;
use serde_json::{Value, json};

const SESSIONS: &str = "open-apis/aily/v1/sessions";
const MESSAGES: &str = "open-apis/aily/v1/sessions/s1/messages";
const RUNS: &str = "open-apis/aily/v1/sessions/s1/runs";
const RUN: &str = "open-apis/aily/v1/sessions/s1/runs/r1";

fn settings() -> CompletionSettings {
    CompletionSettings::default().with_poll_interval(Duration::from_millis(1))
}

fn setup_with(settings: CompletionSettings) -> (AilyClient, Arc<MockTransport>, Arc<MemoryRecordCache>) {
    let mock = Arc::new(MockTransport::new());
    let cache = Arc::new(MemoryRecordCache::new());
    let client = AilyClient::builder()
        .transport(mock.clone())
        .record_cache(cache.clone() as SharedRecordCache)
        .completion_settings(settings)
        .build()
        .expect("client build");
    (client, mock, cache)
}

fn setup() -> (AilyClient, Arc<MockTransport>, Arc<MemoryRecordCache>) {
    setup_with(settings())
}

fn message(id: &str, sender: &str) -> Value {
    json!({
        "id": id,
        "session_id": "s1",
        "run_id": "r1",
        "content": format!("content of {id}"),
        "sender": {"sender_type": sender}
    })
}

fn run(status: &str) -> Value {
    json!({"run": {"id": "r1", "session_id": "s1", "status": status}})
}

/// Script a full happy path for session `s1` and run `r1`.
fn script_success(mock: &MockTransport) {
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0", "session_id": "s1"}}))
        .ok(Method::POST, RUNS, run("QUEUED"))
        .ok(Method::GET, RUN, run("IN_PROGRESS"))
        .ok(Method::GET, RUN, run("COMPLETED"))
        .ok(
            Method::GET,
            MESSAGES,
            json!({"messages": [message("m0", "USER"), message("m1", "ASSISTANT")], "has_more": false}),
        );
}

fn request() -> CompletionRequest {
    CompletionRequest::new("app_1", "hello")
}

#[tokio::test]
async fn test_success_returns_last_assistant_message() {
    let (client, mock, _) = setup();
    script_success(&mock);

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Success);
    assert_eq!(result.message.expect("reply").id, "m1");
    assert_eq!(mock.count(&Method::GET, RUN), 2);

    let list = mock
        .requests()
        .into_iter()
        .find(|r| r.method == Method::GET && r.path == MESSAGES)
        .expect("list call");
    assert_eq!(list.params.get("run_id"), Some(&json!("r1")));
}

#[tokio::test]
async fn test_message_request_body() {
    let (client, mock, _) = setup();
    script_success(&mock);

    let mut req = request();
    req.message.file_ids = vec!["file_1".to_string()];
    client.completions().create(req, &RequestOptions::new()).await;

    let create = mock
        .requests()
        .into_iter()
        .find(|r| r.method == Method::POST && r.path == MESSAGES)
        .expect("message create");
    let body = create.data.expect("body");
    assert_eq!(body["content"], "hello");
    assert_eq!(body["content_type"], "MDX");
    assert_eq!(body["file_ids"], json!(["file_1"]));
    assert!(!body["idempotent_id"].as_str().unwrap_or_default().is_empty());

    let run_create = mock
        .requests()
        .into_iter()
        .find(|r| r.method == Method::POST && r.path == RUNS)
        .expect("run create");
    assert_eq!(run_create.data.expect("body")["app_id"], "app_1");
}

#[tokio::test]
async fn test_session_key_is_reused() {
    let (client, mock, cache) = setup();
    script_success(&mock);
    let completions = client.completions();

    let first = completions
        .create(request().with_session_key("chat-1"), &RequestOptions::new())
        .await;
    let second = completions
        .create(request().with_session_key("chat-1"), &RequestOptions::new())
        .await;

    assert!(first.is_success());
    assert!(second.is_success());
    assert_eq!(mock.count(&Method::POST, SESSIONS), 1);

    let records = cache.get(aily_session::SESSION_RECORDS_KEY).await.expect("records");
    assert_eq!(records.get("chat-1"), Some(&json!("s1")));
}

#[tokio::test]
async fn test_seeded_record_skips_session_creation() {
    let (client, mock, _) = setup();
    script_success(&mock);
    let completions = client.completions();
    completions
        .session_records()
        .insert("chat-9", "s1")
        .await;

    let result = completions
        .create(request().with_session_key("chat-9"), &RequestOptions::new())
        .await;

    assert!(result.is_success());
    assert_eq!(mock.count(&Method::POST, SESSIONS), 0);
}

#[tokio::test]
async fn test_keyless_calls_create_a_session_each_time() {
    let (client, mock, _) = setup();
    script_success(&mock);
    let completions = client.completions();

    completions.create(request(), &RequestOptions::new()).await;
    completions.create(request(), &RequestOptions::new()).await;

    assert_eq!(mock.count(&Method::POST, SESSIONS), 2);
    assert!(completions.records().await.is_empty());
}

#[tokio::test]
async fn test_terminal_statuses_map_without_listing_messages() {
    for (status, expected) in [
        ("FAILED", ExecStatus::Failed),
        ("EXPIRED", ExecStatus::Expired),
        ("CANCELLED", ExecStatus::Cancelled),
        ("REQUIRES_ACTION", ExecStatus::Other),
    ] {
        let (client, mock, _) = setup();
        mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
            .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0"}}))
            .ok(Method::POST, RUNS, run("QUEUED"))
            .ok(Method::GET, RUN, run(status));

        let result = client.completions().create(request(), &RequestOptions::new()).await;

        assert_eq!(result.status, expected, "status {status}");
        assert!(result.message.is_none());
        assert_eq!(mock.count(&Method::GET, MESSAGES), 0);
    }
}

#[tokio::test]
async fn test_reply_is_last_assistant_across_pages() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0"}}))
        .ok(Method::POST, RUNS, run("QUEUED"))
        .ok(Method::GET, RUN, run("COMPLETED"))
        .ok(
            Method::GET,
            MESSAGES,
            json!({
                "messages": [message("a1", "ASSISTANT"), message("a2", "ASSISTANT")],
                "has_more": true,
                "page_token": "p2"
            }),
        )
        .ok(
            Method::GET,
            MESSAGES,
            json!({"messages": [message("u1", "USER"), message("a3", "ASSISTANT"), message("u2", "USER")], "has_more": false}),
        );

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Success);
    assert_eq!(result.message.expect("reply").id, "a3");
    assert_eq!(mock.count(&Method::GET, MESSAGES), 2);
}

#[tokio::test]
async fn test_null_run_status_maps_to_other() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0"}}))
        .ok(Method::POST, RUNS, run("QUEUED"))
        .ok(Method::GET, RUN, json!({"run": {"id": "r1", "status": null}}));

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Other);
    assert_eq!(mock.count(&Method::GET, RUN), 1);
}

#[tokio::test]
async fn test_malformed_neighbour_does_not_hide_reply() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0"}}))
        .ok(Method::POST, RUNS, run("QUEUED"))
        .ok(Method::GET, RUN, run("COMPLETED"))
        .ok(
            Method::GET,
            MESSAGES,
            json!({
                "messages": [
                    {"id": "u1", "content": null, "sender": {"sender_type": "USER"}},
                    {"id": "u2", "content": "odd", "sender": {}},
                    {"id": "a1", "content": "hi", "sender": {"sender_type": "ASSISTANT"}}
                ],
                "has_more": false
            }),
        );

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Success);
    let reply = result.message.expect("reply");
    assert_eq!(reply.id, "a1");
    assert_eq!(reply.content, "hi");
}

#[tokio::test]
async fn test_no_assistant_reply_is_error() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0"}}))
        .ok(Method::POST, RUNS, run("QUEUED"))
        .ok(Method::GET, RUN, run("COMPLETED"))
        .ok(Method::GET, MESSAGES, json!({"messages": [message("u1", "USER")], "has_more": false}));

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Error);
    assert!(result.message.is_none());
}

#[tokio::test]
async fn test_reply_listing_failure_keeps_earlier_reply() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0"}}))
        .ok(Method::POST, RUNS, run("QUEUED"))
        .ok(Method::GET, RUN, run("COMPLETED"))
        .ok(
            Method::GET,
            MESSAGES,
            json!({"messages": [message("a1", "ASSISTANT")], "has_more": true, "page_token": "p2"}),
        )
        .fail(Method::GET, MESSAGES, 500, "internal");

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Success);
    assert_eq!(result.message.expect("reply").id, "a1");
}

#[tokio::test]
async fn test_session_creation_failure_is_error() {
    let (client, mock, _) = setup();
    mock.fail(Method::POST, SESSIONS, 2320002, "no permission");

    let result = client
        .completions()
        .create(request().with_session_key("chat-1"), &RequestOptions::new())
        .await;

    assert_eq!(result.status, ExecStatus::Error);
    assert_eq!(mock.count(&Method::POST, MESSAGES), 0);
    assert!(client.completions().records().await.is_empty());
}

#[tokio::test]
async fn test_session_creation_rejection_is_error() {
    let (client, mock, _) = setup();
    mock.reject(Method::POST, SESSIONS, "dns failure");

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Error);
}

#[tokio::test]
async fn test_message_failure_stops_before_run() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .fail(Method::POST, MESSAGES, 2320003, "content rejected");

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Error);
    assert_eq!(mock.count(&Method::POST, RUNS), 0);
}

#[tokio::test]
async fn test_run_without_id_is_error() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0"}}))
        .ok(Method::POST, RUNS, json!({"run": {"status": "QUEUED"}}));

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Error);
    assert_eq!(mock.count(&Method::GET, RUN), 0);
}

#[tokio::test]
async fn test_status_check_rejection_is_failed() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0"}}))
        .ok(Method::POST, RUNS, run("QUEUED"))
        .reject(Method::GET, RUN, "timeout");

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Failed);
}

#[tokio::test]
async fn test_poll_cap_gives_error() {
    let (client, mock, _) = setup_with(settings().with_max_poll_attempts(3));
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s1"}}))
        .ok(Method::POST, MESSAGES, json!({"message": {"id": "m0"}}))
        .ok(Method::POST, RUNS, run("QUEUED"))
        .ok(Method::GET, RUN, run("IN_PROGRESS"));

    let result = client.completions().create(request(), &RequestOptions::new()).await;

    assert_eq!(result.status, ExecStatus::Error);
    assert_eq!(mock.count(&Method::GET, RUN), 3);
}

#[tokio::test]
async fn test_get_session_id_creates_and_records() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({"session": {"id": "s77"}}));
    let completions = client.completions();

    let id = completions
        .get_session_id(Some("k"), &Default::default(), &RequestOptions::new())
        .await;
    assert_eq!(id.as_deref(), Some("s77"));

    let again = completions
        .get_session_id(Some("k"), &Default::default(), &RequestOptions::new())
        .await;
    assert_eq!(again.as_deref(), Some("s77"));
    assert_eq!(mock.count(&Method::POST, SESSIONS), 1);
}

#[tokio::test]
async fn test_get_session_id_without_session_in_payload() {
    let (client, mock, _) = setup();
    mock.ok(Method::POST, SESSIONS, json!({}));

    let id = client
        .completions()
        .get_session_id(Some("k"), &Default::default(), &RequestOptions::new())
        .await;

    assert_eq!(id, None);
    assert!(client.completions().records().await.is_empty());
}

#[tokio::test]
async fn test_request_options_reach_every_call() {
    let (client, mock, _) = setup();
    script_success(&mock);
    let options = RequestOptions::new().header("X-Tenant", "acme");

    client.completions().create(request(), &options).await;

    let requests = mock.requests();
    assert!(requests.len() >= 6);
    for r in requests {
        assert_eq!(r.headers.get("X-Tenant").map(String::as_str), Some("acme"), "{}", r.path);
    }
}
