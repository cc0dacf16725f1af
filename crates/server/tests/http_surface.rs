use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use parley_agent::{LlmClient, LlmError};
use parley_core::prompts::{ChatPrompt, PromptKind};
use parley_db::{connect_with_settings, migrations, DbPool, DemoSeedDataset, DEMO_USER_ID};
use parley_server::{app, AppState};

struct StubLlm {
    reply: Option<String>,
    prompts: Mutex<Vec<ChatPrompt>>,
}

impl StubLlm {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: Some(reply.to_string()), prompts: Mutex::new(Vec::new()) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { reply: None, prompts: Mutex::new(Vec::new()) })
    }

    fn kinds(&self) -> Vec<PromptKind> {
        self.prompts.lock().expect("prompt log").iter().map(|prompt| prompt.kind).collect()
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LlmError> {
        self.prompts.lock().expect("prompt log").push(prompt.clone());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(LlmError::Status { status: 500, message: "model overloaded".to_string() }),
        }
    }
}

async fn test_app(llm: Arc<StubLlm>) -> (Router, DbPool) {
    let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
    migrations::run_pending(&pool).await.expect("migrations should apply");
    let state = AppState::new(pool.clone(), llm).expect("state should build");
    (app(state, pool.clone()), pool)
}

fn post_json(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::empty()).expect("request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

#[tokio::test]
async fn contract_generator_returns_draft_with_disclaimer() {
    let llm = StubLlm::replying("MUTUAL NON-DISCLOSURE AGREEMENT ...");
    let (app, _pool) = test_app(llm.clone()).await;

    let (status, body) = send(
        &app,
        post_json(
            "/functions/v1/ai-contract-generator",
            None,
            json!({
                "contractType": "nda",
                "parties": [{ "name": "Acme Corp" }, { "name": "Jane Doe" }],
                "terms": { "duration": "2 years" }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contract"], "MUTUAL NON-DISCLOSURE AGREEMENT ...");
    assert_eq!(body["contractType"], "nda");
    assert_eq!(body["jurisdiction"], "United States");
    assert!(body["disclaimer"].as_str().unwrap_or_default().contains("qualified attorney"));
    assert_eq!(llm.kinds(), vec![PromptKind::Drafting]);
}

#[tokio::test]
async fn contract_generator_rejects_missing_type_without_calling_model() {
    let llm = StubLlm::replying("unused");
    let (app, _pool) = test_app(llm.clone()).await;

    let (status, body) = send(
        &app,
        post_json(
            "/functions/v1/ai-contract-generator",
            None,
            json!({ "parties": [{ "name": "Acme Corp" }] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(llm.kinds().is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request_with_error_body() {
    let (app, _pool) = test_app(StubLlm::replying("unused")).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/functions/v1/ai-negotiation-assistant")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"userMessage\": "))
        .expect("request");

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["error"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn assistant_reply_is_recorded_in_the_transcript() {
    let (app, _pool) = test_app(StubLlm::replying("Hold at 95k and trade on term length.")).await;

    let (status, created) = send(
        &app,
        post_json(
            "/api/v1/negotiations",
            Some("user-1"),
            json!({ "title": "Vendor renewal", "counterparty_name": "Globex" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "draft");
    let negotiation_id = created["id"].as_str().expect("negotiation id").to_string();

    let (status, reply) = send(
        &app,
        post_json(
            "/functions/v1/ai-negotiation-assistant",
            Some("user-1"),
            json!({
                "negotiationId": negotiation_id,
                "userMessage": "They countered at 90k.",
                "strategy": "aggressive"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["aiResponse"], "Hold at 95k and trade on term length.");
    assert_eq!(reply["strategy"], "aggressive");

    let (status, messages) = send(
        &app,
        get(&format!("/api/v1/negotiations/{negotiation_id}/messages"), Some("user-1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().expect("message list");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["sender_type"], "user");
    assert_eq!(messages[0]["message"], "They countered at 90k.");
    assert_eq!(messages[1]["sender_type"], "ai");
}

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway_and_records_nothing() {
    let (app, _pool) = test_app(StubLlm::failing()).await;

    let (_, created) = send(
        &app,
        post_json("/api/v1/negotiations", Some("user-1"), json!({ "title": "Lease" })),
    )
    .await;
    let negotiation_id = created["id"].as_str().expect("negotiation id").to_string();

    let (status, body) = send(
        &app,
        post_json(
            "/functions/v1/ai-negotiation-assistant",
            Some("user-1"),
            json!({ "negotiationId": negotiation_id, "userMessage": "Counter?" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());

    let (_, messages) = send(
        &app,
        get(&format!("/api/v1/negotiations/{negotiation_id}/messages"), Some("user-1")),
    )
    .await;
    assert_eq!(messages.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn assistant_refuses_negotiations_owned_by_someone_else() {
    let llm = StubLlm::replying("Our walk-away is 70k.");
    let (app, _pool) = test_app(llm.clone()).await;

    let (_, created) = send(
        &app,
        post_json("/api/v1/negotiations", Some("user-a"), json!({ "title": "Supplier deal" })),
    )
    .await;
    let negotiation_id = created["id"].as_str().expect("negotiation id").to_string();
    let (status, _) = send(
        &app,
        post_json(
            "/functions/v1/ai-negotiation-assistant",
            Some("user-a"),
            json!({ "negotiationId": negotiation_id, "userMessage": "Our walk-away is 70k." }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(llm.kinds().len(), 1);

    let (status, body) = send(
        &app,
        post_json(
            "/functions/v1/ai-negotiation-assistant",
            Some("user-b"),
            json!({ "negotiationId": negotiation_id, "userMessage": "What did they say?" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        post_json(
            "/functions/v1/ai-negotiation-assistant",
            None,
            json!({ "negotiationId": negotiation_id, "userMessage": "What did they say?" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(llm.kinds().len(), 1);

    let (_, messages) = send(
        &app,
        get(&format!("/api/v1/negotiations/{negotiation_id}/messages"), Some("user-a")),
    )
    .await;
    assert_eq!(messages.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn assistant_rejects_unknown_negotiation_without_calling_model() {
    let llm = StubLlm::replying("unused");
    let (app, _pool) = test_app(llm.clone()).await;

    let (status, body) = send(
        &app,
        post_json(
            "/functions/v1/ai-negotiation-assistant",
            Some("user-1"),
            json!({ "negotiationId": "does-not-exist", "userMessage": "Any tips?" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!body["error"].as_str().unwrap_or_default().contains("FOREIGN KEY"));
    assert!(llm.kinds().is_empty());
}

#[tokio::test]
async fn stateless_advice_needs_no_caller() {
    let llm = StubLlm::replying("Anchor high and concede slowly.");
    let (app, _pool) = test_app(llm.clone()).await;

    let (status, body) = send(
        &app,
        post_json(
            "/functions/v1/ai-negotiation-assistant",
            None,
            json!({ "userMessage": "How should I open?" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aiResponse"], "Anchor high and concede slowly.");
    assert_eq!(llm.kinds(), vec![PromptKind::Negotiation]);
}

#[tokio::test]
async fn contract_analyzer_forwards_text() {
    let llm = StubLlm::replying("Summary: one-year lease.");
    let (app, _pool) = test_app(llm.clone()).await;

    let (status, body) = send(
        &app,
        post_json(
            "/functions/v1/ai-contract-analyzer",
            None,
            json!({ "contractText": "1. Term. Twelve months." }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"], "Summary: one-year lease.");
    assert_eq!(body["analysisType"], "full");
    assert_eq!(llm.kinds(), vec![PromptKind::Analysis]);
}

#[tokio::test]
async fn store_routes_require_caller_header() {
    let (app, _pool) = test_app(StubLlm::replying("unused")).await;

    let (status, body) = send(&app, get("/api/v1/negotiations", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing x-user-id header");
}

#[tokio::test]
async fn preflight_is_answered_with_permissive_cors() {
    let (app, _pool) = test_app(StubLlm::replying("unused")).await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/functions/v1/ai-contract-generator")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization, content-type")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn dashboard_shows_profile_and_five_most_recent_negotiations() {
    let (app, pool) = test_app(StubLlm::replying("unused")).await;
    DemoSeedDataset::load(&pool).await.expect("seed should load");

    for index in 0..6 {
        let (status, _) = send(
            &app,
            post_json(
                "/api/v1/negotiations",
                Some(DEMO_USER_ID),
                json!({ "title": format!("Deal {index}") }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get("/api/v1/dashboard", Some(DEMO_USER_ID))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["company_name"], "Acme Corp");
    let recent = body["recentNegotiations"].as_array().expect("recent list");
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0]["title"], "Deal 5");
}

#[tokio::test]
async fn negotiations_of_other_users_are_not_visible() {
    let (app, _pool) = test_app(StubLlm::replying("unused")).await;

    let (_, created) = send(
        &app,
        post_json("/api/v1/negotiations", Some("owner"), json!({ "title": "Private deal" })),
    )
    .await;
    let negotiation_id = created["id"].as_str().expect("negotiation id").to_string();

    let (status, _) =
        send(&app, get(&format!("/api/v1/negotiations/{negotiation_id}"), Some("intruder"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        get(&format!("/api/v1/negotiations/{negotiation_id}/messages"), Some("intruder")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, listed) = send(&app, get("/api/v1/negotiations", Some("intruder"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn saved_contracts_are_listed_for_their_owner() {
    let (app, _pool) = test_app(StubLlm::replying("unused")).await;

    let (status, saved) = send(
        &app,
        post_json(
            "/api/v1/contracts",
            Some("user-1"),
            json!({ "title": "Acme NDA", "content": "NDA body", "contract_type": "nda" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["status"], "draft");

    let (_, listed) = send(&app, get("/api/v1/contracts", Some("user-1"))).await;
    let listed = listed.as_array().expect("contract list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["title"], "Acme NDA");

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/contracts",
            Some("user-1"),
            json!({ "title": "", "content": "", "contract_type": "nda" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
