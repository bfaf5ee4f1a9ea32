//! Tests for the HTTP client against a local one-shot stub server.

use bdi_common::{HttpLlmClient, InferenceError, LlmClient, ModelConfig};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;

/// Serve the canned (status, body) replies, one per connection, and hand
/// back every raw request received.
fn stub_server(replies: Vec<(u16, String)>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in replies {
            let (mut stream, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let request = read_request(&mut stream);
            let _ = tx.send(request);

            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    (url, rx)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).to_string()
}

fn client_for(url: &str) -> HttpLlmClient {
    HttpLlmClient::new(ModelConfig {
        base_url: url.to_string(),
        model: "llama3.1:8b".to_string(),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_generate_returns_response_field() {
    let (url, requests) = stub_server(vec![(
        200,
        r#"{"model":"llama3.1:8b","response":"Level (0, 1, 2 or 3): 1\nMild.","done":true}"#
            .to_string(),
    )]);

    let text = client_for(&url).generate("Assess this").unwrap();
    assert_eq!(text, "Level (0, 1, 2 or 3): 1\nMild.");

    let request = requests.recv().unwrap();
    assert!(request.starts_with("POST /api/generate "));
    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["model"], "llama3.1:8b");
    assert_eq!(json["prompt"], "Assess this");
    assert_eq!(json["stream"], false);
}

#[test]
fn test_server_error_status() {
    let (url, _requests) = stub_server(vec![(500, r#"{"error":"out of memory"}"#.to_string())]);

    let err = client_for(&url).generate("p").unwrap_err();
    match err {
        InferenceError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("out of memory"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_unknown_model() {
    let (url, _requests) = stub_server(vec![(
        404,
        r#"{"error":"model \"llama3.1:8b\" not found, try pulling it first"}"#.to_string(),
    )]);

    let err = client_for(&url).generate("p").unwrap_err();
    assert_eq!(err, InferenceError::ModelNotFound("llama3.1:8b".to_string()));
}

#[test]
fn test_wrong_path_is_not_a_missing_model() {
    let (url, _requests) = stub_server(vec![(404, "404 page not found".to_string())]);

    let err = client_for(&url).generate("p").unwrap_err();
    assert_eq!(
        err,
        InferenceError::Status {
            status: 404,
            body: "404 page not found".to_string()
        }
    );
}

#[test]
fn test_malformed_body() {
    let (url, _requests) = stub_server(vec![(200, r#"{"done":true}"#.to_string())]);

    let err = client_for(&url).generate("p").unwrap_err();
    assert!(matches!(err, InferenceError::MalformedBody(_)));
}

#[test]
fn test_connection_refused_is_unavailable() {
    let url = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let err = client_for(&url).generate("p").unwrap_err();
    assert!(matches!(err, InferenceError::Unavailable(_)), "got {:?}", err);
}

#[test]
fn test_transient_failure_retried() {
    let (url, requests) = stub_server(vec![
        (503, "{}".to_string()),
        (200, r#"{"response":"2"}"#.to_string()),
    ]);

    let client = HttpLlmClient::new(ModelConfig {
        base_url: url,
        timeout_secs: 5,
        max_retries: 1,
        retry_backoff_ms: 10,
        ..Default::default()
    })
    .unwrap();

    assert_eq!(client.generate("p").unwrap(), "2");
    assert_eq!(requests.try_iter().count(), 2);
}

#[test]
fn test_list_models_and_has_model() {
    let tags = r#"{"models":[{"name":"llama3.1:8b","size":1},{"name":"mistral:latest"}]}"#;
    let (url, _requests) = stub_server(vec![(200, tags.to_string()), (200, tags.to_string())]);

    let client = client_for(&url);
    assert_eq!(
        client.list_models().unwrap(),
        vec!["llama3.1:8b".to_string(), "mistral:latest".to_string()]
    );
    assert!(client.has_model().unwrap());
}
