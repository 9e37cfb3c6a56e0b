use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn lf_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("lf");
    path
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn setup_test_env_with(port: u16, matching: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/lf.sqlite"

{}

[server]
bind = "127.0.0.1:{}"
"#,
        root.display(),
        matching,
        port
    );

    let config_path = config_dir.join("lf.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn setup_test_env() -> (TempDir, PathBuf) {
    setup_test_env_with(7340, "")
}

fn run_lf(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = lf_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lf binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn report(config_path: &Path, kind: &str, name: &str, description: &str, location: &str) {
    let (stdout, stderr, success) = run_lf(
        config_path,
        &[
            "report",
            kind,
            "--name",
            name,
            "--description",
            description,
            "--location",
            location,
            "--reporter",
            "u1",
            "--contact-email",
            "finder@example.com",
        ],
    );
    assert!(success, "report failed: stdout={}, stderr={}", stdout, stderr);
}

fn match_json(config_path: &Path, extra: &[&str]) -> Vec<serde_json::Value> {
    let mut args = vec!["match", "--json"];
    args.extend_from_slice(extra);
    let (stdout, stderr, success) = run_lf(config_path, &args);
    assert!(success, "match failed: stdout={}, stderr={}", stdout, stderr);
    serde_json::from_str::<Vec<serde_json::Value>>(&stdout).unwrap()
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_lf(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/lf.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_lf(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_lf(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_lf(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_report_and_list() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    report(&config_path, "lost", "Wallet", "black leather", "Library");
    report(&config_path, "lost", "Keys", "car keys", "Park");

    let (stdout, _, success) = run_lf(&config_path, &["list", "lost", "--json"]);
    assert!(success);
    let reports: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["name"], "Wallet");
    assert_eq!(reports[1]["name"], "Keys");
    assert!(reports[0]["id"].is_string());
    assert!(reports[0]["timestamp"].is_string());

    let (stdout, _, success) = run_lf(&config_path, &["list", "found"]);
    assert!(success);
    assert!(stdout.contains("No found reports."));
}

#[test]
fn test_report_rejects_blank_name() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    let (_, stderr, success) = run_lf(
        &config_path,
        &[
            "report",
            "found",
            "--name",
            "  ",
            "--description",
            "x",
            "--location",
            "y",
            "--reporter",
            "u1",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("name must not be empty"));
}

#[test]
fn test_report_unknown_kind() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    let (_, stderr, success) = run_lf(&config_path, &["list", "stolen"]);
    assert!(!success);
    assert!(stderr.contains("unknown report kind"));
}

#[test]
fn test_match_empty() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    let (stdout, _, success) = run_lf(&config_path, &["match"]);
    assert!(success);
    assert!(stdout.contains("No matches."));

    report(&config_path, "lost", "Wallet", "black leather", "Library");
    assert!(match_json(&config_path, &[]).is_empty());
}

#[test]
fn test_match_certain() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    report(&config_path, "lost", "Wallet", "black leather", "Library");
    report(&config_path, "found", "Wallet", "black leather wallet", "Library");

    let results = match_json(&config_path, &[]);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["score"].as_f64().unwrap(), 1.0);
    assert_eq!(results[0]["certain"], true);
    assert_eq!(results[0]["contact"]["email"], "finder@example.com");

    let (stdout, _, success) = run_lf(&config_path, &["match"]);
    assert!(success);
    assert!(stdout.contains("[1.00]  CERTAIN Wallet <-> Wallet"));
}

#[test]
fn test_match_truncates_and_sorts() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    report(&config_path, "lost", "Wallet", "brown", "Gym");
    report(&config_path, "lost", "Keys", "ring of three", "Cafe");
    report(&config_path, "lost", "Scarf", "wool", "Bus");
    report(&config_path, "found", "Wallet", "brown", "Gym");
    report(&config_path, "found", "Keys", "silver", "Cafe");
    report(&config_path, "found", "Hat", "wool", "Train");

    let results = match_json(&config_path, &[]);
    assert_eq!(results.len(), 5);
    let scores: Vec<f64> = results
        .iter()
        .map(|r| r["score"].as_f64().unwrap())
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1], "not sorted: {:?}", scores);
    }
    assert!((scores[0] - 1.0).abs() < 1e-9);
    assert!((scores[1] - 0.7).abs() < 1e-9);
    assert!((scores[2] - 0.3).abs() < 1e-9);

    let limited = match_json(&config_path, &["--limit", "2"]);
    assert_eq!(limited.len(), 2);
}

#[test]
fn test_match_deterministic() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    report(&config_path, "lost", "Bottle", "steel", "Gym");
    report(&config_path, "lost", "Bottle", "plastic", "Pool");
    report(&config_path, "found", "bottle", "glass", "Office");
    report(&config_path, "found", "Bottle", "ceramic", "Lab");

    let first = match_json(&config_path, &[]);
    let second = match_json(&config_path, &[]);
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert_eq!(first[0]["lost"]["description"], "steel");
    assert_eq!(first[0]["found"]["description"], "glass");
    assert_eq!(first[3]["lost"]["description"], "plastic");
    assert_eq!(first[3]["found"]["description"], "ceramic");
}

#[test]
fn test_match_explain() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    report(&config_path, "lost", "Umbrella", "red", "Station");
    report(&config_path, "found", "umbrella", "navy", "station");

    let results = match_json(&config_path, &["--explain"]);
    assert!((results[0]["score"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    assert_eq!(results[0]["signals"]["name"], true);
    assert_eq!(results[0]["signals"]["description"], false);
    assert_eq!(results[0]["signals"]["location"], true);
    assert!(results[0].get("contact").is_none());
}

#[test]
fn test_match_zero_limit_rejected() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    let (_, stderr, success) = run_lf(&config_path, &["match", "--limit", "0"]);
    assert!(!success);
    assert!(stderr.contains("--limit must be >= 1"));
}

#[test]
fn test_config_limit_applies() {
    let (_tmp, config_path) = setup_test_env_with(7340, "[matching]\nlimit = 1\n");
    run_lf(&config_path, &["init"]);

    report(&config_path, "lost", "Pen", "blue ink", "Hall");
    report(&config_path, "found", "Pen", "blue", "Hall");
    report(&config_path, "found", "Pencil", "yellow", "Hall");

    let results = match_json(&config_path, &[]);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["found"]["description"], "blue");
}

#[test]
fn test_user_add_and_get() {
    let (_tmp, config_path) = setup_test_env();
    run_lf(&config_path, &["init"]);

    let (stdout, stderr, success) = run_lf(
        &config_path,
        &["user", "add", "--name", "Ada", "--email", "ada@example.com"],
    );
    assert!(success, "user add failed: {} {}", stdout, stderr);
    assert!(stdout.contains("Registered user Ada"));

    let (stdout, _, success) = run_lf(&config_path, &["user", "get", "ADA@example.com"]);
    assert!(success);
    assert!(stdout.contains("ada@example.com"));

    let (_, stderr, success) = run_lf(
        &config_path,
        &["user", "add", "--name", "Ada", "--email", "ada@example.com"],
    );
    assert!(!success);
    assert!(stderr.contains("already exists"));

    let (_, stderr, success) = run_lf(&config_path, &["user", "get", "bob@example.com"]);
    assert!(!success);
    assert!(stderr.contains("user not found"));
}

// ============ HTTP server ============

fn start_server(config_path: &Path) -> std::process::Child {
    let binary = lf_binary();
    Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("serve")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to start server: {}", e))
}

/// Wait for the server to be ready by polling the health endpoint.
fn wait_for_server(port: u16) {
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        std::thread::sleep(std::time::Duration::from_millis(100));
        if let Ok(resp) = reqwest::blocking::get(&url) {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

#[test]
fn test_server_health() {
    let port = find_free_port();
    let (_tmp, config_path) = setup_test_env_with(port, "");

    let mut server = start_server(&config_path);
    wait_for_server(port);

    let url = format!("http://127.0.0.1:{}/health", port);
    let resp = reqwest::blocking::get(&url).unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());

    server.kill().ok();
    server.wait().ok();
}

#[test]
fn test_server_reports_and_matches() {
    let port = find_free_port();
    let (_tmp, config_path) = setup_test_env_with(port, "");

    let mut server = start_server(&config_path);
    wait_for_server(port);

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::blocking::Client::new();

    let resp = client
        .post(format!("{}/reports/lost", base))
        .json(&serde_json::json!({
            "name": "Wallet",
            "description": "black leather",
            "location": "Library",
            "reporter_id": "u1"
        }))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = resp.json().unwrap();
    assert!(created["id"].is_string());

    let resp = client
        .post(format!("{}/reports/found", base))
        .json(&serde_json::json!({
            "name": "wallet",
            "description": "Black Leather Wallet",
            "location": "library",
            "reporter_id": "u2",
            "coordinates": { "latitude": 40.7, "longitude": -74.0 },
            "contact_phone": "555-0101"
        }))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .get(format!("{}/reports/found", base))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    let found = body["reports"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["coordinates"]["latitude"], 40.7);

    let resp = client
        .post(format!("{}/matches", base))
        .json(&serde_json::json!({ "explain": true }))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["score"].as_f64().unwrap(), 1.0);
    assert_eq!(matches[0]["certain"], true);
    assert_eq!(matches[0]["contact"]["phone"], "555-0101");
    assert_eq!(matches[0]["signals"]["location"], true);

    server.kill().ok();
    server.wait().ok();
}

#[test]
fn test_server_errors() {
    let port = find_free_port();
    let (_tmp, config_path) = setup_test_env_with(port, "");

    let mut server = start_server(&config_path);
    wait_for_server(port);

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::blocking::Client::new();

    let resp = client
        .post(format!("{}/reports/lost", base))
        .json(&serde_json::json!({
            "name": "Wallet",
            "description": "",
            "location": "Library",
            "reporter_id": "u1"
        }))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("description must not be empty"));

    let resp = client
        .get(format!("{}/reports/stolen", base))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/matches", base))
        .json(&serde_json::json!({ "limit": 0 }))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(format!("{}/users/nobody@example.com", base))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    server.kill().ok();
    server.wait().ok();
}

#[test]
fn test_server_malformed_body() {
    let port = find_free_port();
    let (_tmp, config_path) = setup_test_env_with(port, "");

    let mut server = start_server(&config_path);
    wait_for_server(port);

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::blocking::Client::new();

    for path in ["reports/lost", "matches", "users"] {
        let resp = client
            .post(format!("{}/{}", base, path))
            .header("content-type", "application/json")
            .body("not json")
            .send()
            .unwrap();
        assert_eq!(resp.status(), 400, "POST /{}", path);
        let body: serde_json::Value = resp.json().unwrap();
        assert_eq!(body["error"]["code"], "bad_request", "POST /{}", path);
        assert!(body["error"]["message"].as_str().is_some());
    }

    // Well-formed JSON with a missing field is also a 400, not a 422.
    let resp = client
        .post(format!("{}/users", base))
        .json(&serde_json::json!({ "name": "Ada" }))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    // Missing content type.
    let resp = client
        .post(format!("{}/reports/found", base))
        .body("{}")
        .send()
        .unwrap();
    assert_eq!(resp.status(), 400);

    server.kill().ok();
    server.wait().ok();
}

#[test]
fn test_server_users() {
    let port = find_free_port();
    let (_tmp, config_path) = setup_test_env_with(port, "");

    let mut server = start_server(&config_path);
    wait_for_server(port);

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::blocking::Client::new();
    let body = serde_json::json!({ "name": "Ada", "email": "ada@example.com" });

    let resp = client
        .post(format!("{}/users", base))
        .json(&body)
        .send()
        .unwrap();
    assert_eq!(resp.status(), 201);
    let user: serde_json::Value = resp.json().unwrap();

    let resp = client
        .get(format!("{}/users/ada@example.com", base))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);
    let fetched: serde_json::Value = resp.json().unwrap();
    assert_eq!(fetched["id"], user["id"]);

    let resp = client
        .post(format!("{}/users", base))
        .json(&body)
        .send()
        .unwrap();
    assert_eq!(resp.status(), 409);
    let err: serde_json::Value = resp.json().unwrap();
    assert_eq!(err["error"]["code"], "conflict");

    server.kill().ok();
    server.wait().ok();
}
