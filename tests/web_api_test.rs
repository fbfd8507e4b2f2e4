mod common;

use axum_test::TestServer;
use carmate::{
    actions::{CHAT_FALLBACK, DESCRIPTION_FALLBACK, FEEDBACK_CONFIRMATION, FEEDBACK_FALLBACK},
    web_server, Config,
};
use common::{actions, StubProvider, StubReply};
use serde_json::{json, Value};

fn server(provider: std::sync::Arc<StubProvider>, config: &Config) -> TestServer {
    TestServer::new(web_server::router(actions(provider), config)).unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = server(StubProvider::replying(json!({})), &Config::default());
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_chat_endpoint() {
    let provider = StubProvider::replying(json!({ "response": "Hello!" }));
    let server = server(provider.clone(), &Config::default());

    let response = server
        .post("/api/chat")
        .json(&json!({ "message": "hi", "history": [{ "role": "user", "content": "earlier" }] }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "text": "Hello!" }));
    assert!(provider.last_prompt().contains("user: earlier"));
}

#[tokio::test]
async fn test_chat_endpoint_failure_is_still_ok() {
    let server = server(StubProvider::failing(StubReply::Timeout), &Config::default());

    let response = server.post("/api/chat").json(&json!({ "message": "hi" })).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "text": CHAT_FALLBACK, "error": "model" }));
}

#[tokio::test]
async fn test_chat_endpoint_rejects_bad_record_softly() {
    let provider = StubProvider::replying(json!({ "response": "unused" }));
    let server = server(provider.clone(), &Config::default());

    let response = server.post("/api/chat").json(&json!({ "msg": "hi" })).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["error"], "validation");
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_feedback_endpoint() {
    let provider = StubProvider::replying(json!({ "summary": "Answer was correct." }));
    let server = server(provider.clone(), &Config::default());

    let response = server
        .post("/api/feedback")
        .json(&json!({
            "label": "Good response",
            "history": [{ "role": "user", "content": "2+2?" }, { "role": "model", "content": "4" }]
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "text": FEEDBACK_CONFIRMATION }));
    assert!(provider.last_prompt().contains("User Feedback: Good response"));
}

#[tokio::test]
async fn test_car_description_endpoint() {
    let provider = StubProvider::replying(json!({ "description": "Low-mileage commuter." }));
    let server = server(provider, &Config::default());

    let response = server
        .post("/api/car-description")
        .json(&json!({
            "make": "Toyota", "model": "Corolla", "year": 2020, "mileage": 30000,
            "condition": "good", "features": "sunroof, navigation",
            "sellingPoints": "low mileage, fuel-efficient"
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["text"], "Low-mileage commuter.");
}

#[tokio::test]
async fn test_index_page_renders_template() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>{{ title }}</h1><p>{{ model }}</p>").unwrap();
    let config = Config {
        template_dir: dir.path().to_string_lossy().into_owned(),
        model: "test-model".into(),
        ..Config::default()
    };

    let server = server(StubProvider::replying(json!({})), &config);
    let response = server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "<h1>Carmate AI Assistant</h1><p>test-model</p>");
}

#[tokio::test]
async fn test_missing_static_file_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        static_dir: dir.path().to_string_lossy().into_owned(),
        ..Config::default()
    };

    let server = server(StubProvider::replying(json!({})), &config);
    server.get("/static/nope.js").await.assert_status_not_found();
}

#[tokio::test]
async fn test_non_json_bodies_get_an_action_reply() {
    let provider = StubProvider::replying(json!({ "response": "unused" }));
    let server = server(provider.clone(), &Config::default());

    for (path, fallback) in [
        ("/api/chat", CHAT_FALLBACK),
        ("/api/feedback", FEEDBACK_FALLBACK),
        ("/api/car-description", DESCRIPTION_FALLBACK),
    ] {
        let response = server.post(path).text("hello").await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "text": fallback, "error": "validation" }),
            "plain text body on {}",
            path
        );

        let response = server.post(path).text("{not json").await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "text": fallback, "error": "validation" }),
            "malformed body on {}",
            path
        );
    }

    assert!(provider.requests().is_empty());
}
