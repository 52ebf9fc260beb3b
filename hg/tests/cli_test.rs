//! End-to-end tests for the `hg` binary
//!
//! Each test runs against its own temporary data directory and home, so no
//! user configuration or stored key leaks in.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hg(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hg").expect("hg binary");
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(home.join("data"));
    cmd
}

#[test]
fn test_example_show_and_outline() {
    let home = TempDir::new().unwrap();

    hg(home.path())
        .arg("example")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded example grid"));

    hg(home.path())
        .args(["show", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Body Care"))
        .stdout(predicate::str::contains("Mental"))
        .stdout(predicate::str::contains("\u{1b}[").not());

    hg(home.path())
        .args(["show", "--outline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Goal: Get drafted 1st overall by 8 NPB teams"))
        .stdout(predicate::str::contains("8. Mental Toughness"));
}

#[test]
fn test_show_without_grid_fails() {
    let home = TempDir::new().unwrap();
    hg(home.path())
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active grid"));
}

#[test]
fn test_edit_commits_and_blank_reverts() {
    let home = TempDir::new().unwrap();
    hg(home.path()).arg("example").assert().success();

    hg(home.path())
        .args(["edit", "2", "--task", "3", "  Throw 50 bullpen pitches  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated pillar 2 task 3: Throw 50 bullpen pitches"));

    hg(home.path())
        .args(["edit", "1", "   "])
        .assert()
        .success()
        .stdout(predicate::str::contains("No change to pillar 1"));

    hg(home.path())
        .args(["show", "--outline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3) Throw 50 bullpen pitches"))
        .stdout(predicate::str::contains("1. Body Care"));
}

#[test]
fn test_export_import_reset() {
    let home = TempDir::new().unwrap();
    hg(home.path()).arg("example").assert().success();

    let exported = home.path().join("grid.json");
    hg(home.path())
        .args(["export", "-o"])
        .arg(&exported)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported to"));
    let json = std::fs::read_to_string(&exported).unwrap();
    assert!(json.contains("\"goal\": \"Get drafted 1st overall by 8 NPB teams\""));

    hg(home.path())
        .args(["export", "-f", "md", "-o", "-"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Get drafted 1st overall by 8 NPB teams"));

    hg(home.path()).args(["reset", "--yes"]).assert().success();
    hg(home.path()).arg("show").assert().failure();

    hg(home.path())
        .arg("import")
        .arg(&exported)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported grid"));
    hg(home.path())
        .args(["show", "--outline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Body Care"));
}

#[test]
fn test_export_default_filename() {
    let home = TempDir::new().unwrap();
    hg(home.path()).arg("example").assert().success();
    hg(home.path()).args(["export", "-f", "text"]).assert().success();

    let names: Vec<String> = std::fs::read_dir(home.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(
        names
            .iter()
            .any(|n| n.starts_with("harada-get-drafted-1st-overall-by-8-npb-teams-") && n.ends_with(".txt")),
        "exported files: {:?}",
        names
    );
}

#[test]
fn test_reset_declined() {
    let home = TempDir::new().unwrap();
    hg(home.path()).arg("example").assert().success();

    hg(home.path())
        .arg("reset")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted"));
    hg(home.path()).arg("show").assert().success();
}

#[test]
fn test_import_rejects_bad_document() {
    let home = TempDir::new().unwrap();
    let bad = home.path().join("bad.json");
    std::fs::write(&bad, r#"{"goal": "x", "pillars": [], "createdAt": "2026-01-01T00:00:00Z", "updatedAt": "2026-01-01T00:00:00Z"}"#).unwrap();

    hg(home.path())
        .arg("import")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid grid document"));
}

#[test]
fn test_generate_without_key_fails() {
    let home = TempDir::new().unwrap();
    hg(home.path())
        .args(["generate", "Learn Rust"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key configured"));
}

#[test]
fn test_generate_rejects_blank_goal() {
    let home = TempDir::new().unwrap();
    hg(home.path())
        .args(["generate", "   ", "--api-key", "sk-test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Goal must not be empty"));
}

#[test]
fn test_key_set_status_clear() {
    let home = TempDir::new().unwrap();

    hg(home.path())
        .args(["key", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No API key configured"));

    hg(home.path())
        .args(["key", "set", "sk-abcdefghijklmnop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API key saved"));

    hg(home.path())
        .args(["key", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-…mnop"))
        .stdout(predicate::str::contains("stored key"));

    hg(home.path())
        .args(["key", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API key removed"));
}

/// Answer `count` requests with the same response, returning the request bodies
fn serve(count: usize, status: &'static str, content_type: &'static str, body: String) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut bodies = Vec::new();
        for stream in listener.incoming().take(count) {
            let mut stream = stream.unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
            }
            let mut request = vec![0; content_length];
            reader.read_exact(&mut request).unwrap();
            bodies.push(String::from_utf8(request).unwrap());

            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();
        }
        bodies
    });

    (base_url, handle)
}

/// Serve `count` chat-completion requests, each answered with the same list
fn serve_lists(count: usize) -> (String, thread::JoinHandle<Vec<String>>) {
    let items: Vec<String> = (1..=8).map(|i| format!("Item {}", i)).collect();
    let content = serde_json::to_string(&items).unwrap();
    let delta = serde_json::json!({"choices": [{"delta": {"content": content}, "finish_reason": null}]});
    let stop = serde_json::json!({"choices": [{"delta": {}, "finish_reason": "stop"}]});
    let body = format!("data: {}\n\ndata: {}\n\ndata: [DONE]\n\n", delta, stop);
    serve(count, "200 OK", "text/event-stream", body)
}

/// Config pointing the client at a local server, with proxies out of the way
fn local_config(home: &Path, base_url: &str) -> std::path::PathBuf {
    let config = home.join("hg.yml");
    std::fs::write(&config, format!("llm:\n  base-url: {}\n  reasoning-effort: \"\"\n", base_url)).unwrap();
    config
}

fn hg_local(home: &Path, config: &Path) -> Command {
    let mut cmd = hg(home);
    cmd.arg("--config")
        .arg(config)
        .env("NO_PROXY", "127.0.0.1")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy");
    cmd
}

#[test]
fn test_generate_against_local_server() {
    let home = TempDir::new().unwrap();
    let (base_url, server) = serve_lists(9);

    let config = local_config(home.path(), &base_url);

    hg_local(home.path(), &config)
        .args(["generate", "Learn Rust", "--api-key", "sk-test", "--no-delay"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Your Harada grid is ready"))
        .stdout(predicate::str::contains("Item 8"));

    let bodies = server.join().unwrap();
    assert_eq!(bodies.len(), 9);
    assert!(bodies[0].contains("Learn Rust"));
    assert!(bodies.iter().all(|b| b.contains("\"stream\":true")));

    hg(home.path())
        .args(["show", "--outline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Goal: Learn Rust"))
        .stdout(predicate::str::contains("(pending)").not());
}

#[test]
fn test_generate_failure_reports_error_once() {
    let home = TempDir::new().unwrap();
    let body = r#"{"error": {"message": "The server had an error"}}"#.to_string();
    let (base_url, server) = serve(1, "500 Internal Server Error", "application/json", body);
    let config = local_config(home.path(), &base_url);

    let output = hg_local(home.path(), &config)
        .args(["generate", "Learn Rust", "--api-key", "sk-test", "--no-delay"])
        .assert()
        .failure()
        .get_output()
        .clone();
    server.join().unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("API error 500: The server had an error").count(), 1, "stderr: {}", stderr);
    assert!(stderr.contains("0 of 64 tasks kept"));
}
