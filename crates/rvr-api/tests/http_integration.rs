//! Integration tests for `OllamaClient` against a raw TCP test server.
//!
//! Each incoming connection gets the next pre-configured HTTP response, so
//! retry behaviour and endpoint handling can be checked without Ollama.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use rvr_api::{OllamaClient, RetryConfig, model_is_available};
use rvr_types::{ApiError, ChatMessage, ChatRequest};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const CHAT_BODY: &str = "{\"model\":\"test\",\"message\":{\"role\":\"assistant\",\"content\":\"Retried OK\"},\"done\":false}\n\
{\"model\":\"test\",\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true,\"eval_count\":3}\n";

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len(),
    )
}

fn json_response(status: &str, body: &str) -> String {
    http_response(status, "application/json", body)
}

fn chat_ok() -> String {
    http_response("200 OK", "application/x-ndjson", CHAT_BODY)
}

/// Read one HTTP request: headers, then `Content-Length` bytes of body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
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
    String::from_utf8_lossy(&data).into_owned()
}

/// Start a test server. Returns its base URL, a request counter, and the
/// captured requests.
async fn start_test_server(
    responses: Vec<String>,
) -> (String, Arc<AtomicUsize>, Arc<tokio::sync::Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let counter_clone = Arc::clone(&counter);
    let requests_clone = Arc::clone(&requests);

    tokio::spawn(async move {
        let responses = Arc::new(responses);
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let idx = counter_clone.fetch_add(1, Ordering::SeqCst);
            let responses = Arc::clone(&responses);
            let requests = Arc::clone(&requests_clone);

            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                requests.lock().await.push(request);
                if let Some(response) = responses.get(idx) {
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.flush().await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), counter, requests)
}

fn make_client(base_url: &str) -> OllamaClient {
    OllamaClient::new(base_url)
        .unwrap()
        .with_retry_config(RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
        })
}

fn test_request() -> ChatRequest {
    ChatRequest {
        model: "test".to_string(),
        messages: vec![ChatMessage::user("drive forward")],
        tools: Vec::new(),
        options: None,
        stream: true,
    }
}

#[tokio::test]
async fn list_models_parses_tags() {
    let (base_url, _, requests) = start_test_server(vec![json_response(
        "200 OK",
        r#"{"models":[{"name":"qwen2.5:7b"},{"name":"llama3.2:latest"}]}"#,
    )])
    .await;

    let models = make_client(&base_url).list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert!(model_is_available(&models, "qwen2.5:7b"));
    assert!(!model_is_available(&models, "mistral"));

    let requests = requests.lock().await;
    assert!(requests[0].starts_with("GET /api/tags "), "{}", requests[0]);
}

#[tokio::test]
async fn pull_model_posts_non_streaming_request() {
    let (base_url, _, requests) =
        start_test_server(vec![json_response("200 OK", r#"{"status":"success"}"#)]).await;

    make_client(&base_url).pull_model("qwen2.5:7b").await.unwrap();

    let requests = requests.lock().await;
    assert!(requests[0].starts_with("POST /api/pull "));
    assert!(requests[0].contains(r#""model":"qwen2.5:7b""#));
    assert!(requests[0].contains(r#""stream":false"#));
}

#[tokio::test]
async fn pull_unknown_model_fails() {
    let (base_url, _, _) = start_test_server(vec![json_response(
        "500 Internal Server Error",
        r#"{"error":"pull model manifest: file does not exist"}"#,
    )])
    .await;

    let client = make_client(&base_url).with_retry_config(RetryConfig::none());
    match client.pull_model("nope:1b").await {
        Err(ApiError::Server { message, .. }) => assert!(message.contains("manifest")),
        other => panic!("Expected Server error, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_stream_sends_request_and_streams() {
    let (base_url, counter, requests) = start_test_server(vec![chat_ok()]).await;

    let stream = make_client(&base_url)
        .chat_stream(&test_request())
        .await
        .unwrap();
    let chunks: Vec<_> = stream.collect().await;
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].as_ref().unwrap().text(), "Retried OK");
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    let requests = requests.lock().await;
    assert!(requests[0].starts_with("POST /api/chat "));
    assert!(requests[0].contains(r#""stream":true"#));
}

#[tokio::test]
async fn retry_on_500_then_success() {
    let (base_url, counter, _) = start_test_server(vec![
        json_response("500 Internal Server Error", r#"{"error":"boom"}"#),
        chat_ok(),
    ])
    .await;

    let stream = make_client(&base_url).chat_stream(&test_request()).await;
    assert!(stream.is_ok(), "should succeed after retry: {:?}", stream.err());
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn retry_exhausted_on_503() {
    let (base_url, counter, _) = start_test_server(vec![
        json_response("503 Service Unavailable", r#"{"error":"busy"}"#),
        json_response("503 Service Unavailable", r#"{"error":"busy"}"#),
        json_response("503 Service Unavailable", r#"{"error":"busy"}"#),
    ])
    .await;

    let result = make_client(&base_url).chat_stream(&test_request()).await;
    assert!(matches!(result, Err(ApiError::Overloaded)), "{:?}", result.err());
    assert_eq!(counter.load(Ordering::SeqCst), 3, "1 attempt + 2 retries");
}

#[tokio::test]
async fn no_retry_on_missing_model() {
    let (base_url, counter, _) = start_test_server(vec![
        json_response("404 Not Found", r#"{"error":"model \"test\" not found, try pulling it first"}"#),
        chat_ok(),
    ])
    .await;

    match make_client(&base_url).chat_stream(&test_request()).await {
        Err(ApiError::ModelNotFound { model }) => assert_eq!(model, "test"),
        Err(e) => panic!("expected ModelNotFound, got: {e:?}"),
        Ok(_) => panic!("expected error, got Ok"),
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = make_client(&format!("http://{addr}")).with_retry_config(RetryConfig::none());
    assert!(matches!(
        client.list_models().await,
        Err(ApiError::Network(_))
    ));
}
