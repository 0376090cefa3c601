use once_cell::sync::Lazy;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateResponse {
    coins: u64,
    dark_mode: bool,
    premium: bool,
    challenge: ChallengeResponse,
}

#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    joined: bool,
    days: u8,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_dir() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("coton_noir_http_{}_{}", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_coton_noir"))
        .env("PORT", port.to_string())
        .env("APP_DATA_DIR", unique_data_dir())
        .env("RUST_LOG", "info")
        .env_remove("OPENAI_API_KEY")
        .env_remove("COTON_FUNCTIONS_URL")
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_ANON_KEY")
        .env_remove("COTON_USER_ID")
        .env_remove("COTON_FALLBACK_STATUS")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn current_state(client: &Client, base_url: &str) -> StateResponse {
    client
        .get(format!("{base_url}/api/state"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn dispatch(client: &Client, base_url: &str, action: Value) -> StateResponse {
    let response = client
        .post(format!("{base_url}/api/actions"))
        .json(&action)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_coin_actions_clamp_at_zero() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = current_state(&client, &server.base_url).await;
    let added = dispatch(
        &client,
        &server.base_url,
        json!({ "type": "ADD_COINS", "amount": 15 }),
    )
    .await;
    assert_eq!(added.coins, before.coins + 15);

    let spent = dispatch(
        &client,
        &server.base_url,
        json!({ "type": "SPEND_COINS", "amount": added.coins + 1000 }),
    )
    .await;
    assert_eq!(spent.coins, 0);

    let after = current_state(&client, &server.base_url).await;
    assert_eq!(after.coins, 0);
}

#[tokio::test]
async fn http_dark_mode_toggle_and_challenge() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = current_state(&client, &server.base_url).await;
    let toggled = dispatch(&client, &server.base_url, json!({ "type": "TOGGLE_DARK_MODE" })).await;
    assert_eq!(toggled.dark_mode, !before.dark_mode);
    let theme: Value = client
        .get(format!("{}/api/theme", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let expected = if toggled.dark_mode { "dark" } else { "light" };
    assert_eq!(theme["theme"], expected);
    let restored = dispatch(&client, &server.base_url, json!({ "type": "TOGGLE_DARK_MODE" })).await;
    assert_eq!(restored.dark_mode, before.dark_mode);
    assert_eq!(restored.premium, before.premium);

    dispatch(&client, &server.base_url, json!({ "type": "JOIN_CHALLENGE" })).await;
    let mut last = None;
    for _ in 0..32 {
        let advance = json!({ "type": "ADVANCE_CHALLENGE" });
        last = Some(dispatch(&client, &server.base_url, advance).await);
    }
    let last = last.unwrap();
    assert!(last.challenge.joined);
    assert_eq!(last.challenge.days, 30);
}

#[tokio::test]
async fn http_unknown_action_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/actions", server.base_url))
        .json(&json!({ "type": "DELETE_EVERYTHING" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn http_functions_answer_preflight_and_fallbacks() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let preflight = client
        .request(
            Method::OPTIONS,
            format!("{}/functions/v1/generate-realtime-tips", server.base_url),
        )
        .header("Origin", "https://app.cotonnoir.fr")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status(), StatusCode::OK);
    assert_eq!(
        preflight.headers()["access-control-allow-origin"],
        "*"
    );

    let response = client
        .post(format!("{}/functions/v1/generate-realtime-tips", server.base_url))
        .json(&json!({ "hairType": "4C", "porosity": "high", "problems": [], "needs": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(!body["routinePreview"].as_array().unwrap().is_empty());

    let response = client
        .post(format!(
            "{}/functions/v1/generate-personalized-routine",
            server.base_url
        ))
        .json(&json!({ "profile": { "hairType": "4C" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["prioritySteps"], json!([2, 3]));
}

#[tokio::test]
async fn http_tip_generation_falls_back_without_key() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/tips/generate", server.base_url))
        .json(&json!({ "tipType": "styling" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let state: Value = response.json().await.unwrap();
    assert_eq!(state["loading"], false);
    assert_eq!(state["current"]["tipType"], "styling");
    assert!(!state["current"]["tip"].as_str().unwrap().is_empty());
    assert!(state["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
}

#[tokio::test]
async fn http_language_preference_round_trip() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .put(format!("{}/api/preferences/language", server.base_url))
        .json(&json!({ "language": "en" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = client
        .get(format!("{}/api/preferences/language", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["language"], "en");
}

#[tokio::test]
async fn http_journal_is_empty_when_signed_out() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let view: Value = client
        .get(format!("{}/api/journal", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["entries"], json!([]));
    assert_eq!(view["loading"], false);

    let response = client
        .post(format!("{}/hooks/journal", server.base_url))
        .json(&json!({
            "type": "INSERT",
            "table": "journal_entries",
            "record": { "id": "e1", "user_id": "someone" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
