use chrono::Local;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Tally {
    #[serde(rename = "P")]
    present: u64,
    #[serde(rename = "A")]
    absent: u64,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct TallyResponse {
    event_id: String,
    tally: Tally,
}

#[derive(Debug, Deserialize)]
struct Bucket {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct Aggregate {
    buckets: Vec<Bucket>,
    total_count: u64,
    weeks_total: usize,
    window_days: i64,
}

#[derive(Debug, Deserialize)]
struct ChartPoint {
    label: String,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct WeeklyResponse {
    aggregate: Aggregate,
    chart: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
struct PersonRanking {
    person_id: String,
    name: String,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct Ranking {
    people: Vec<PersonRanking>,
}

#[derive(Debug, Deserialize)]
struct PersonHistory {
    person_id: String,
    weeks: Vec<serde_json::Value>,
    total_expected: u64,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    window_days: i64,
    expected_per_week: u32,
    people: Vec<PersonHistory>,
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
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

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

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("club_attendance_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/weekly")).send().await {
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
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_club_attendance"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("WINDOW_DAYS", "28")
        .env("RUST_LOG", "info")
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

fn today() -> String {
    Local::now().date_naive().format("%d/%m/%Y").to_string()
}

async fn mark(client: &Client, base_url: &str, body: serde_json::Value) -> reqwest::Response {
    client
        .post(format!("{base_url}/api/attendance"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn weekly(client: &Client, base_url: &str, query: &str) -> WeeklyResponse {
    client
        .get(format!("{base_url}/api/weekly{query}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_weekly_uses_configured_window() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = weekly(&client, &server.base_url, "").await;
    assert_eq!(response.aggregate.window_days, 28);
    assert_eq!(response.aggregate.weeks_total, 4);
    assert_eq!(response.chart.len(), 4);
    assert!(response.chart.iter().all(|point| point.label.contains('/')));

    let response = weekly(&client, &server.base_url, "?days=7").await;
    assert_eq!(response.aggregate.weeks_total, 1);
}

#[tokio::test]
async fn http_weekly_rejects_non_positive_window() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for days in ["0", "-3"] {
        let response = client
            .get(format!("{}/api/weekly?days={days}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn http_mark_counts_in_current_week() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = weekly(&client, &server.base_url, "?days=7&person=mark-p1").await;
    assert_eq!(before.aggregate.total_count, 0);

    let response = mark(
        &client,
        &server.base_url,
        serde_json::json!({
            "event_id": "mark-e1",
            "person_id": "mark-p1",
            "person_name": "Ana",
            "date": today(),
            "code": "P"
        }),
    )
    .await;
    assert!(response.status().is_success());
    let tally: TallyResponse = response.json().await.unwrap();
    assert_eq!(tally.event_id, "mark-e1");
    assert_eq!(tally.tally.present, 1);
    assert_eq!(tally.tally.total, 1);

    let after = weekly(&client, &server.base_url, "?days=7&person=mark-p1").await;
    assert_eq!(after.aggregate.total_count, 1);
    assert_eq!(after.aggregate.buckets[0].count, 1);
    assert_eq!(after.chart[0].value, 1);
}

#[tokio::test]
async fn http_changing_a_mark_moves_the_tally() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for code in ["P", "A"] {
        let response = mark(
            &client,
            &server.base_url,
            serde_json::json!({
                "event_id": "change-e1",
                "person_id": "change-p1",
                "date": today(),
                "code": code
            }),
        )
        .await;
        assert!(response.status().is_success());
    }

    let tally: TallyResponse = client
        .get(format!("{}/api/events/tally?event=change-e1", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tally.tally.present, 0);
    assert_eq!(tally.tally.absent, 1);
    assert_eq!(tally.tally.total, 1);

    // an absence does not count as attendance
    let response = weekly(&client, &server.base_url, "?days=7&person=change-p1").await;
    assert_eq!(response.aggregate.total_count, 0);
}

#[tokio::test]
async fn http_cancel_removes_the_mark() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = mark(
        &client,
        &server.base_url,
        serde_json::json!({
            "event_id": "cancel-e1",
            "person_id": "cancel-p1",
            "date": today(),
            "code": "PN"
        }),
    )
    .await;
    assert!(response.status().is_success());

    let cancel = || {
        client
            .post(format!("{}/api/attendance/cancel", server.base_url))
            .json(&serde_json::json!({ "event_id": "cancel-e1", "person_id": "cancel-p1" }))
            .send()
    };

    let response = cancel().await.unwrap();
    assert!(response.status().is_success());
    let tally: TallyResponse = response.json().await.unwrap();
    assert_eq!(tally.tally.total, 0);

    let response = cancel().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_mark_rejects_bad_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let bad_date = mark(
        &client,
        &server.base_url,
        serde_json::json!({
            "event_id": "bad-e1",
            "person_id": "bad-p1",
            "date": "yesterday-ish",
            "code": "P"
        }),
    )
    .await;
    assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);

    let missing_person = mark(
        &client,
        &server.base_url,
        serde_json::json!({
            "event_id": "bad-e1",
            "person_id": "  ",
            "date": today(),
            "code": "P"
        }),
    )
    .await;
    assert_eq!(missing_person.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_ranking_filters_by_name() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let yesterday = (Local::now().date_naive() - chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();
    for (event, code) in [("rank-e1", "P"), ("rank-e2", "AA")] {
        let response = mark(
            &client,
            &server.base_url,
            serde_json::json!({
                "event_id": event,
                "person_id": "rank-p1",
                "person_name": "Zoe Ranking",
                "date": yesterday,
                "code": code
            }),
        )
        .await;
        assert!(response.status().is_success());
    }

    let ranking: Ranking = client
        .get(format!("{}/api/ranking?name=zoe%20rank", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ranking.people.len(), 1);
    assert_eq!(ranking.people[0].person_id, "rank-p1");
    assert_eq!(ranking.people[0].name, "Zoe Ranking");
    assert_eq!(ranking.people[0].total, 2);
}

#[tokio::test]
async fn http_history_pairs_weeks_with_expected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = mark(
        &client,
        &server.base_url,
        serde_json::json!({
            "event_id": "history-e1",
            "person_id": "history-p1",
            "date": today(),
            "code": "P"
        }),
    )
    .await;
    assert!(response.status().is_success());

    let history: HistoryResponse = client
        .get(format!("{}/api/history?days=14&expected=2", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.window_days, 14);
    assert_eq!(history.expected_per_week, 2);

    let person = history
        .people
        .iter()
        .find(|person| person.person_id == "history-p1")
        .expect("missing person");
    assert_eq!(person.weeks.len(), 2);
    assert_eq!(person.total_expected, 4);

    let response = client
        .get(format!("{}/api/history?days=1000000000", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_index_renders_chart() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client.get(format!("{}/", server.base_url)).send().await.unwrap();
    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("Weekly Attendance"));
    assert_eq!(body.matches(r#"<div class="bar""#).count(), 4);
}
