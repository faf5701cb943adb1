use std::sync::Arc;

use aily_client::pagination::PAGINATION_FIELDS;
use aily_client::{
    AilyClient, ApiRequest, ListMessagesQuery, MockTransport, PageIterator, PageRequest,
    RequestOptions, Transport,
};
use futures::StreamExt;
use reqwest::Method;
use serde_json::{Map, Value, json};

const MESSAGES: &str = "open-apis/aily/v1/sessions/s1/messages";

fn setup() -> (AilyClient, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::new());
    let client = AilyClient::builder()
        .transport(mock.clone())
        .build()
        .expect("client build");
    (client, mock)
}

fn message(id: &str, sender: &str) -> Value {
    json!({"id": id, "session_id": "s1", "content": id, "sender": {"sender_type": sender}})
}

fn raw_pages(mock: &Arc<MockTransport>) -> PageIterator<Map<String, Value>> {
    let mock = mock.clone();
    let fetch = move |page: PageRequest| {
        let mock = mock.clone();
        async move {
            mock.send(ApiRequest::new(Method::GET, MESSAGES).with_params(page.params))
                .await
        }
    };
    PageIterator::new(fetch, PageRequest::default())
}

#[tokio::test]
async fn test_yields_every_page_then_ends() {
    let (client, mock) = setup();
    mock.ok(Method::GET, MESSAGES, json!({"messages": [message("m1", "USER")], "has_more": true, "page_token": "p2"}))
        .ok(Method::GET, MESSAGES, json!({"messages": [message("m2", "ASSISTANT")], "has_more": true, "page_token": "p3"}))
        .ok(Method::GET, MESSAGES, json!({"messages": [message("m3", "ASSISTANT")], "has_more": false}));

    let pages: Vec<_> = client
        .messages()
        .list_with_iterator("s1", &ListMessagesQuery::default(), &RequestOptions::new())
        .into_stream()
        .collect()
        .await;

    assert_eq!(pages.len(), 3);
    let ids: Vec<_> = pages
        .iter()
        .map(|p| p.as_ref().expect("page").messages[0].id.clone())
        .collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
    assert_eq!(mock.count(&Method::GET, MESSAGES), 3);

    let tokens: Vec<_> = mock
        .requests()
        .iter()
        .map(|r| r.params.get("page_token").cloned())
        .collect();
    assert_eq!(tokens, vec![None, Some(json!("p2")), Some(json!("p3"))]);
}

#[tokio::test]
async fn test_failure_mid_sequence_yields_sentinel_then_ends() {
    let (client, mock) = setup();
    mock.ok(Method::GET, MESSAGES, json!({"messages": [message("m1", "USER")], "has_more": true, "page_token": "p2"}))
        .reject(Method::GET, MESSAGES, "connection reset");

    let mut pages =
        client
            .messages()
            .list_with_iterator("s1", &ListMessagesQuery::default(), &RequestOptions::new());

    assert!(matches!(pages.next_page().await, Some(Some(_))));
    assert_eq!(pages.next_page().await, Some(None));
    assert_eq!(pages.next_page().await, None);
    assert!(pages.is_finished());
    assert_eq!(mock.count(&Method::GET, MESSAGES), 2);
}

#[tokio::test]
async fn test_error_envelope_first_page_is_sentinel() {
    let (client, mock) = setup();
    mock.fail(Method::GET, MESSAGES, 2320001, "session not found");

    let pages: Vec<_> = client
        .messages()
        .list_with_iterator("s1", &ListMessagesQuery::default(), &RequestOptions::new())
        .into_stream()
        .collect()
        .await;

    assert_eq!(pages, vec![None]);
}

#[tokio::test]
async fn test_pagination_fields_are_stripped() {
    let (_client, mock) = setup();
    mock.ok(
        Method::GET,
        MESSAGES,
        json!({"messages": [], "has_more": true, "page_token": "p2", "next_page_token": "p2", "total": 4}),
    )
    .ok(Method::GET, MESSAGES, json!({"messages": [], "has_more": false, "total": 4}));

    let mut pages = raw_pages(&mock);
    while let Some(page) = pages.next_page().await {
        let page = page.expect("page");
        for field in PAGINATION_FIELDS {
            assert!(!page.contains_key(field), "{field} should be stripped");
        }
        assert_eq!(page.get("total"), Some(&json!(4)));
    }
    assert_eq!(pages.pages_fetched(), 2);
}

#[tokio::test]
async fn test_next_page_token_is_used_when_page_token_missing() {
    let (client, mock) = setup();
    mock.ok(Method::GET, MESSAGES, json!({"messages": [], "has_more": true, "next_page_token": "n2"}))
        .ok(Method::GET, MESSAGES, json!({"messages": [], "has_more": false}));

    let mut pages =
        client
            .messages()
            .list_with_iterator("s1", &ListMessagesQuery::default(), &RequestOptions::new());
    while pages.next_page().await.is_some() {}

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].params.get("page_token"), Some(&json!("n2")));
}

#[tokio::test]
async fn test_query_filters_are_resent_with_every_page() {
    let (client, mock) = setup();
    mock.ok(Method::GET, MESSAGES, json!({"messages": [], "has_more": true, "page_token": "p2"}))
        .ok(Method::GET, MESSAGES, json!({"messages": [], "has_more": false}));

    let query = ListMessagesQuery {
        run_id: Some("run_1".to_string()),
        page_size: Some(0),
        ..Default::default()
    };
    let options = RequestOptions::new().header("X-Trace", "t1");
    let mut pages = client.messages().list_with_iterator("s1", &query, &options);
    while pages.next_page().await.is_some() {}

    for request in mock.requests() {
        assert_eq!(request.params.get("run_id"), Some(&json!("run_1")));
        assert!(!request.params.contains_key("page_size"));
        assert_eq!(request.headers.get("X-Trace").map(String::as_str), Some("t1"));
    }
}
