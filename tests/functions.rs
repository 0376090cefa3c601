use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use coton_noir::config::{CompletionConfig, FallbackStatus};
use coton_noir::functions::{self, FunctionsState, completion::ChatClient, routine::DEFAULT_STEPS};
use coton_noir::models::DetailedHairProfile;
use coton_noir::storage::LocalStore;
use coton_noir::tips::{FunctionsClient, TipGenerator, TipType, fallback::fallback_tip};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

#[derive(Clone)]
struct FakeCompletion {
    status: StatusCode,
    content: Arc<String>,
}

async fn chat_completions(
    State(fake): State<FakeCompletion>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    assert_eq!(
        headers.get(header::AUTHORIZATION).unwrap(),
        "Bearer test-key"
    );
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);

    let reply = json!({
        "choices": [{ "message": { "role": "assistant", "content": fake.content.as_str() } }]
    });
    (fake.status, Json(reply))
}

/// Serves a canned chat-completion reply on a random local port.
async fn fake_completion_api(status: StatusCode, content: &str) -> String {
    let app = Router::new()
        .route("/chat/completions", post(chat_completions))
        .with_state(FakeCompletion {
            status,
            content: Arc::new(content.to_string()),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn functions_router(base_url: Option<&str>, policy: FallbackStatus) -> Router {
    let chat = ChatClient::new(&CompletionConfig {
        api_key: base_url.map(|_| SecretString::from("test-key".to_string())),
        base_url: base_url.unwrap_or("http://127.0.0.1:9").to_string(),
        model: "test-model".to_string(),
    })
    .unwrap();
    functions::router(FunctionsState::new(chat, policy))
}

async fn post_json(router: Router, path: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn tip_request() -> String {
    json!({
        "hairProfile": { "hairType": "4C", "porosity": "high", "isCompleted": true },
        "tipType": "routine"
    })
    .to_string()
}

fn routine_request() -> String {
    json!({
        "profile": {
            "hairType": "4B",
            "porosity": "low",
            "objective": "pousse",
            "problems": ["casse"],
            "needs": ["hydratation"]
        }
    })
    .to_string()
}

#[tokio::test]
async fn preflight_answers_with_open_cors() {
    for path in [
        "/generate-hair-tips",
        "/generate-personalized-routine",
        "/generate-realtime-tips",
    ] {
        let request = Request::builder()
            .method("OPTIONS")
            .uri(path)
            .header(header::ORIGIN, "https://app.cotonnoir.fr")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = functions_router(None, FallbackStatus::Legacy)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }
}

#[tokio::test]
async fn non_post_methods_are_rejected() {
    let request = Request::builder()
        .method("GET")
        .uri("/generate-hair-tips")
        .body(Body::empty())
        .unwrap();
    let response = functions_router(None, FallbackStatus::Legacy)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn hair_tips_without_key_is_degraded_500() {
    let router = functions_router(None, FallbackStatus::Legacy);
    let (status, body) = post_json(router, "/generate-hair-tips", tip_request()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["tip"].as_str().unwrap().is_empty());
    assert_eq!(body["tipType"], "routine");
    assert!(body["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
    assert_eq!(body["degraded"], true);
}

#[tokio::test]
async fn routine_without_key_returns_default_routine_with_500() {
    let router = functions_router(None, FallbackStatus::Legacy);
    let (status, body) =
        post_json(router, "/generate-personalized-routine", routine_request()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let steps: Vec<String> = serde_json::from_value(body["steps"].clone()).unwrap();
    assert_eq!(steps, DEFAULT_STEPS);
    assert_eq!(body["prioritySteps"], json!([2, 3]));
    assert!(!body["tip"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn realtime_without_key_returns_200_fallback() {
    let router = functions_router(None, FallbackStatus::Legacy);
    let body = json!({ "hairType": "4A", "porosity": "low", "problems": [], "needs": [] });
    let (status, body) = post_json(router, "/generate-realtime-tips", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    let preview = body["routinePreview"].as_array().unwrap();
    assert_eq!(preview.len(), 3);
    assert!(!body["cotonTips"].as_str().unwrap().is_empty());
    assert_eq!(body["degraded"], true);
}

#[tokio::test]
async fn always_ok_policy_answers_200_on_fallback() {
    let router = functions_router(None, FallbackStatus::AlwaysOk);
    let (status, body) = post_json(router, "/generate-hair-tips", tip_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
}

#[tokio::test]
async fn malformed_request_takes_fallback_path() {
    let router = functions_router(None, FallbackStatus::Legacy);
    let (status, body) = post_json(router, "/generate-hair-tips", "{not json".to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["tipType"], "general");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn hair_tip_from_completion() {
    let base = fake_completion_api(StatusCode::OK, "\"Scellez vos pointes au karité.\"").await;
    let router = functions_router(Some(&base), FallbackStatus::Legacy);
    let (status, body) = post_json(router, "/generate-hair-tips", tip_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tip"], "Scellez vos pointes au karité.");
    assert!(body.get("error").is_none());
    assert!(body.get("degraded").is_none());
}

#[tokio::test]
async fn routine_from_fenced_json_completion() {
    let reply = "```json\n{\"steps\": [\"a\", \"b\", \"c\", \"d\", \"e\", \"f\"], \"prioritySteps\": [0, 5], \"tip\": \"t\"}\n```";
    let base = fake_completion_api(StatusCode::OK, reply).await;
    let router = functions_router(Some(&base), FallbackStatus::Legacy);
    let (status, body) =
        post_json(router, "/generate-personalized-routine", routine_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["steps"].as_array().unwrap().len(), 6);
    assert_eq!(body["prioritySteps"], json!([0, 5]));
}

#[tokio::test]
async fn routine_prose_reply_uses_default_with_200() {
    let base = fake_completion_api(StatusCode::OK, "Voici une belle routine pour vous !").await;
    let router = functions_router(Some(&base), FallbackStatus::Legacy);
    let (status, body) =
        post_json(router, "/generate-personalized-routine", routine_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["steps"].as_array().unwrap().len(), 5);
    assert_eq!(body["degraded"], true);
}

#[tokio::test]
async fn routine_upstream_error_is_500() {
    let base = fake_completion_api(StatusCode::TOO_MANY_REQUESTS, "").await;
    let router = functions_router(Some(&base), FallbackStatus::Legacy);
    let (status, body) =
        post_json(router, "/generate-personalized-routine", routine_request()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("429"));
    assert_eq!(body["prioritySteps"], json!([2, 3]));
}

#[tokio::test]
async fn realtime_high_porosity_fallback_on_bad_shape() {
    let reply = r#"{"routinePreview": ["only one"], "cotonTips": "t"}"#;
    let base = fake_completion_api(StatusCode::OK, reply).await;
    let router = functions_router(Some(&base), FallbackStatus::Legacy);
    let body = json!({ "hairType": "4C", "porosity": "high" });
    let (status, body) = post_json(router, "/generate-realtime-tips", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["routinePreview"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn generator_treats_degraded_500_as_fallback() {
    // Functions without a key answer 500 with a generic tip; the generator records
    // the error and uses the subtype table instead.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = functions_router(None, FallbackStatus::Legacy);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStore::open(dir.path()).await.unwrap();
    let client = FunctionsClient::new(format!("http://{addr}"), None).unwrap();
    let generator = TipGenerator::load(client, storage).await;

    let profile = DetailedHairProfile {
        hair_type: "4B".to_string(),
        is_completed: true,
        ..DetailedHairProfile::default()
    };
    let tip = generator
        .generate(&profile, TipType::Styling, None)
        .await
        .unwrap();

    assert_eq!(tip.tip, fallback_tip("4B", TipType::Styling));
    let state = generator.state();
    assert!(state.error.unwrap().contains("OPENAI_API_KEY"));
    assert!(generator.cache().await.is_empty());
}
