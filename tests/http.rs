use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct DayScore {
    percent: f64,
    wake: Option<f64>,
    sleep: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    date: String,
    score: DayScore,
    band: String,
}

#[derive(Debug, Deserialize)]
struct Task {
    name: String,
}

struct TestServer {
    base_url: String,
    child: std::sync::Mutex<Child>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Ok(child) = self.child.get_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
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

fn unique_data_path(label: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("focus_grid_http_{label}_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/load")).send().await {
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

async fn spawn_server(label: &str, heartbeat_secs: u64) -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_focus_grid"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_data_path(label))
        .env("HEARTBEAT_TIMEOUT_SECS", heartbeat_secs.to_string())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    let base_url = format!("http://127.0.0.1:{port}");
    let server = TestServer {
        base_url,
        child: std::sync::Mutex::new(child),
    };
    wait_until_ready(&server.base_url).await;
    server
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server("shared", 0).await);
    #[cfg(unix)]
    cleanup::register(server.child.lock().unwrap().id());
    *guard = Some(Arc::clone(&server));
    server
}

fn scenario_document() -> Value {
    json!({
        "data": {},
        "config": [
            {"name": "Wake up", "type": "time", "weight": 20, "target": "06:00", "condition": "before", "days": "Daily"},
            {"name": "Work", "type": "bool", "weight": 20, "days": "Mon,Tue,Wed,Thu,Fri"}
        ]
    })
}

async fn reset(client: &Client, base_url: &str) {
    let response = client
        .post(format!("{base_url}/api/save"))
        .json(&scenario_document())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn http_record_edits_drive_the_score() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url).await;

    for (task, value) in [("Wake up", json!("06:15")), ("Work", json!(true))] {
        let response = client
            .post(format!("{}/api/record", server.base_url))
            .json(&json!({ "date": "2026-01-05", "task": task, "value": value }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    let score: DayScore = client
        .get(format!("{}/api/score/2026-01-05", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!((score.percent - 95.0).abs() < 1e-9);
    assert_eq!(score.wake, Some(6.25));
    assert_eq!(score.sleep, None);

    let cleared: RecordResponse = client
        .post(format!("{}/api/record", server.base_url))
        .json(&json!({ "date": "2026-01-05", "task": "Work", "value": null }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared.date, "2026-01-05");
    assert!((cleared.score.percent - 45.0).abs() < 1e-9);
    assert_eq!(cleared.band, "low");
}

#[tokio::test]
async fn http_record_rejects_unknown_task() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url).await;

    let response = client
        .post(format!("{}/api/record", server.base_url))
        .json(&json!({ "date": "2026-01-05", "task": "Swim", "value": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get(format!("{}/api/score/yesterday", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_save_validates_and_serves_data_file() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let rejected = client
        .post(format!("{}/save", server.base_url))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::INTERNAL_SERVER_ERROR);

    for body in [
        r#"{"data":{},"config":[{"name":"x"}]}"#,
        r#"{"data":{"2026-01-05":{"Gym":[1]}},"config":[]}"#,
    ] {
        let rejected = client
            .post(format!("{}/save", server.base_url))
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    let mut document = scenario_document();
    document["data"] = json!({ "2026-01-06": { "Work": true } });
    let saved = client
        .post(format!("{}/save", server.base_url))
        .body(document.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(saved.status(), StatusCode::OK);
    assert_eq!(saved.text().await.unwrap(), "Saved");

    let on_disk: Value = client
        .get(format!("{}/data.json", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(on_disk["data"]["2026-01-06"]["Work"], json!(true));
    assert_eq!(on_disk["config"][1]["days"], "Mon,Tue,Wed,Thu,Fri");

    let loaded: Value = client
        .get(format!("{}/api/load", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loaded["config"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn http_task_manager_round() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url).await;

    let duplicate = client
        .post(format!("{}/api/tasks", server.base_url))
        .json(&json!({ "name": "Work", "type": "bool", "weight": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let created = client
        .post(format!("{}/api/tasks", server.base_url))
        .json(&json!({ "name": "Focus", "type": "score", "weight": 10, "days": "Daily" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let tasks: Vec<Task> = created.json().await.unwrap();
    assert_eq!(tasks.len(), 3);

    let moved: Vec<Task> = client
        .post(format!("{}/api/tasks/2/move", server.base_url))
        .json(&json!({ "direction": "up" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = moved.iter().map(|task| task.name.as_str()).collect();
    assert_eq!(names, vec!["Wake up", "Focus", "Work"]);

    let remaining: Vec<Task> = client
        .delete(format!("{}/api/tasks/0", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(remaining.len(), 2);

    let missing = client
        .delete(format!("{}/api/tasks/9", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_rename_keeps_recorded_values() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url).await;

    let recorded = client
        .post(format!("{}/api/record", server.base_url))
        .json(&json!({ "date": "2026-01-05", "task": "Work", "value": true }))
        .send()
        .await
        .unwrap();
    assert!(recorded.status().is_success());

    let renamed: Vec<Task> = client
        .put(format!("{}/api/tasks/1", server.base_url))
        .json(&json!({ "name": "Office", "type": "bool", "weight": 20, "days": "Mon,Tue,Wed,Thu,Fri" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = renamed.iter().map(|task| task.name.as_str()).collect();
    assert_eq!(names, vec!["Wake up", "Office"]);

    let score: DayScore = client
        .get(format!("{}/api/score/2026-01-05", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!((score.percent - 50.0).abs() < 1e-9);

    let loaded: Value = client
        .get(format!("{}/api/load", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loaded["data"]["2026-01-05"]["Office"], json!(true));
    assert!(loaded["data"]["2026-01-05"].get("Work").is_none());
}

#[tokio::test]
async fn http_week_page_and_history() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    reset(&client, &server.base_url).await;

    let week: Value = client
        .get(format!("{}/api/week?start=2026-01-07", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(week["week"]["start_date"], "2026-01-05");
    assert_eq!(week["week"]["rows"].as_array().map(Vec::len), Some(7));

    let page = client
        .get(format!("{}/?week=2026-01-07", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(page.status().is_success());
    let html = page.text().await.unwrap();
    assert!(html.contains("Jan 05 - Jan 11, 2026"));

    let history: Value = client
        .get(format!("{}/api/history", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["series"]["score"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn http_silent_page_stops_server() {
    let server = spawn_server("heartbeat", 1).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/heartbeat", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let exited = server.child.lock().unwrap().try_wait().unwrap();
        if let Some(status) = exited {
            assert!(status.success());
            return;
        }
        if Instant::now() > deadline {
            panic!("server kept running without heartbeats");
        }
        sleep(Duration::from_millis(200)).await;
    }
}
