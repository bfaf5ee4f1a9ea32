//! CLI integration tests for bdictl
//!
//! Every run gets its own config dir and a model URL on loopback so no user
//! configuration or real model server is touched.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output, Stdio};
use std::thread;

fn bdictl(config_home: &std::path::Path, url: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bdictl"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env("BDI_OLLAMA_URL", url)
        .env("NO_COLOR", "1")
        .env_remove("BDI_MODEL")
        .env_remove("BDI_TIMEOUT_SECS")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    cmd
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Answer `count` requests with the same generate reply
fn stub_model(count: usize, reply: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let body = serde_json::json!({ "model": "llama3.1:8b", "response": reply, "done": true })
        .to_string();

    thread::spawn(move || {
        for _ in 0..count {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            drain_request(&mut stream);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    url
}

fn drain_request(stream: &mut TcpStream) {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                return;
            }
        }
    }
}

#[test]
fn test_analyze_requires_consent() {
    let home = tempfile::tempdir().unwrap();
    let output = bdictl(home.path(), &closed_port_url())
        .args(["analyze", "--text", "I feel tired"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Consent required"));
    assert!(!stdout(&output).contains("OVERALL ASSESSMENT"));
}

#[test]
fn test_analyze_rejects_blank_text() {
    let home = tempfile::tempdir().unwrap();
    let output = bdictl(home.path(), &closed_port_url())
        .args(["analyze", "--consent", "--text", "   \n"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Please enter some text"));
}

#[test]
fn test_analyze_empty_stdin() {
    let home = tempfile::tempdir().unwrap();
    let output = bdictl(home.path(), &closed_port_url())
        .args(["analyze", "--consent"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_symptoms_lists_catalog() {
    let home = tempfile::tempdir().unwrap();
    let output = bdictl(home.path(), &closed_port_url())
        .arg("symptoms")
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert_eq!(text.lines().count(), 21);
    assert!(text.contains("Q1   How Sad The User Feels"));
}

#[test]
fn test_config_shows_env_override() {
    let home = tempfile::tempdir().unwrap();
    let output = bdictl(home.path(), "http://10.1.2.3:11434")
        .args(["config", "--model", "mistral"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("base_url = \"http://10.1.2.3:11434\""));
    assert!(text.contains("model = \"mistral\""));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let output = bdictl(home.path(), &closed_port_url())
        .args(["analyze", "--consent", "--text", "hello", "--timeout-secs", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let output = bdictl(home.path(), &closed_port_url())
        .env("BDI_TIMEOUT_SECS", "0")
        .arg("config")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("at least 1"));
}

#[test]
fn test_check_unreachable() {
    let home = tempfile::tempdir().unwrap();
    let output = bdictl(home.path(), &closed_port_url())
        .arg("check")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(70));
    assert!(stdout(&output).contains("unreachable"));
}

#[test]
fn test_analyze_without_model_server_is_degraded() {
    let home = tempfile::tempdir().unwrap();
    let output = bdictl(home.path(), &closed_port_url())
        .args(["analyze", "--consent", "--text", "I feel tired all the time"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("Total BDI Score:      0 / 63"));
    assert!(text.contains("Could not connect to the model"));
    assert!(text.contains("[not assessed]"));
}

#[test]
fn test_analyze_json_against_stub_model() {
    let home = tempfile::tempdir().unwrap();
    let url = stub_model(21, "Level: 1\nThe posts mention some low mood.");
    let output = bdictl(home.path(), &url)
        .args(["analyze", "--consent", "--json", "--text", "Some days are hard."])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let run: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(run["total_score"], 21);
    assert_eq!(run["severity_band"], "Moderate");
    assert_eq!(run["results"].as_array().unwrap().len(), 21);
    assert_eq!(run["results"][0]["id"], "Q1");
    assert_eq!(run["results"][0]["level"], 1);
}
