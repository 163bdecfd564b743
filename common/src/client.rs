//! Sending a built request to Slack.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::link::{PostMessageResponse, check_response};
use crate::request::RequestDescriptor;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub trait MessagingClient: Send + Sync {
    /// Sends the request and returns Slack's reply once it reports success.
    fn send(&self, request: &RequestDescriptor) -> Result<PostMessageResponse>;
}

/// Posts to the real Slack API over blocking HTTP.
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: Client,
}

impl SlackClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl MessagingClient for SlackClient {
    fn send(&self, request: &RequestDescriptor) -> Result<PostMessageResponse> {
        // Bodies always go out raw; a descriptor asking for re-escaping is refused.
        if request.escaping {
            return Err(PipelineError::Configuration(
                "request asks for payload re-escaping, which is not supported".to_string(),
            ));
        }

        info!("📡 Posting to {}", request.url);

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(CONTENT_TYPE, request.content_type);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        // The payload is already JSON.
        let response = builder
            .body(request.body.clone())
            .send()
            .map_err(|e| PipelineError::SendFailure {
                status: e.status().map(|s| s.as_u16()),
                error: Some(e.to_string()),
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| PipelineError::SendFailure {
            status: Some(status),
            error: Some(format!("failed to read response body: {e}")),
        })?;

        debug!("Slack replied {}: {}", status, body);
        check_response(status, &body)
    }
}

/// Logs requests instead of sending them and answers with a canned reply.
///
/// Requests are only kept when built with [`DryRunClient::recording`].
#[derive(Debug)]
pub struct DryRunClient {
    reply: PostMessageResponse,
    sent: Option<Mutex<Vec<RequestDescriptor>>>,
}

impl DryRunClient {
    pub fn new(reply: PostMessageResponse) -> Self {
        Self { reply, sent: None }
    }

    /// A successful reply in `channel`, timestamped `ts`.
    pub fn replying(channel: &str, ts: &str) -> Self {
        Self::new(PostMessageResponse {
            ok: Some(true),
            ts: Some(ts.to_string()),
            channel: Some(channel.to_string()),
            error: None,
        })
    }

    /// Keeps every request it receives, for inspection with [`DryRunClient::sent`].
    pub fn recording(mut self) -> Self {
        self.sent = Some(Mutex::new(Vec::new()));
        self
    }

    /// Requests received so far; always empty unless recording.
    pub fn sent(&self) -> Vec<RequestDescriptor> {
        self.sent
            .as_ref()
            .and_then(|sent| sent.lock().ok().map(|sent| sent.clone()))
            .unwrap_or_default()
    }
}

impl MessagingClient for DryRunClient {
    fn send(&self, request: &RequestDescriptor) -> Result<PostMessageResponse> {
        info!("🧪 Dry run, not posting to {}", request.url);
        debug!("Payload: {}", request.body);

        if let Some(Ok(mut sent)) = self.sent.as_ref().map(Mutex::lock) {
            sent.push(request.clone());
        }

        if self.reply.ok == Some(false) {
            return Err(PipelineError::SendFailure {
                status: None,
                error: self.reply.error.clone(),
            });
        }
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_record;
    use crate::request::{SlackConfig, build_request};
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn sample_request() -> RequestDescriptor {
        build_request(
            &sample_record(),
            &SlackConfig {
                token: "abc".to_string(),
                channel: "#jobs".to_string(),
            },
        )
        .unwrap()
    }

    /// Reads one HTTP/1.1 request: headers plus a `content-length` body.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                break;
            }
        }
        String::from_utf8(data).unwrap()
    }

    /// Answers a single request with `status` and `body`; the thread returns the raw request.
    fn serve_once(status: &str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!(
            "http://{}/api/chat.postMessage",
            listener.local_addr().unwrap()
        );
        let status = status.to_string();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (url, handle)
    }

    fn slack_client() -> SlackClient {
        SlackClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_dry_run_records_requests() {
        let client = DryRunClient::replying("C123", "1700000000.123456").recording();
        let request = sample_request();

        let reply = client.send(&request).unwrap();
        assert_eq!(reply.channel.as_deref(), Some("C123"));
        assert_eq!(client.sent(), vec![request]);
    }

    #[test]
    fn test_dry_run_keeps_nothing_unless_recording() {
        let client = DryRunClient::replying("C123", "1700000000.123456");
        let request = sample_request();

        for _ in 0..100 {
            client.send(&request).unwrap();
        }
        assert!(client.sent().is_empty());
    }

    #[test]
    fn test_dry_run_failure_reply() {
        let client = DryRunClient::new(PostMessageResponse {
            ok: Some(false),
            error: Some("invalid_auth".to_string()),
            ..Default::default()
        });

        assert!(matches!(
            client.send(&sample_request()),
            Err(PipelineError::SendFailure { error: Some(e), .. }) if e == "invalid_auth"
        ));
    }

    #[test]
    fn test_slack_client_sends_headers_and_raw_body() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"ok":true,"channel":"C123","ts":"1700000000.123456"}"#,
        );
        let mut request = sample_request();
        request.url = url;

        let reply = slack_client().send(&request).unwrap();
        assert_eq!(reply.channel.as_deref(), Some("C123"));
        assert_eq!(reply.ts.as_deref(), Some("1700000000.123456"));

        let received = server.join().unwrap();
        let lowered = received.to_lowercase();
        assert!(received.starts_with("POST /api/chat.postMessage HTTP/1.1\r\n"));
        assert!(lowered.contains("\r\nauthorization: bearer abc\r\n"));
        assert!(lowered.contains("\r\ncontent-type: application/json\r\n"));
        assert!(received.ends_with(&request.body));
    }

    #[test]
    fn test_slack_client_ok_false_is_send_failure() {
        let (url, server) = serve_once("200 OK", r#"{"ok":false,"error":"channel_not_found"}"#);
        let mut request = sample_request();
        request.url = url;

        let result = slack_client().send(&request);
        server.join().unwrap();

        match result {
            Err(PipelineError::SendFailure { status, error }) => {
                assert_eq!(status, Some(200));
                assert_eq!(error.as_deref(), Some("channel_not_found"));
            }
            other => panic!("expected SendFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_slack_client_error_status_is_send_failure() {
        let (url, server) = serve_once(
            "500 Internal Server Error",
            r#"{"ok":false,"error":"fatal_error"}"#,
        );
        let mut request = sample_request();
        request.url = url;

        let result = slack_client().send(&request);
        server.join().unwrap();

        match result {
            Err(PipelineError::SendFailure { status, error }) => {
                assert_eq!(status, Some(500));
                assert_eq!(error.as_deref(), Some("fatal_error"));
            }
            other => panic!("expected SendFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_slack_client_connection_refused() {
        let mut request = sample_request();
        request.url = "http://127.0.0.1:1/api/chat.postMessage".to_string();

        assert!(matches!(
            slack_client().send(&request),
            Err(PipelineError::SendFailure {
                status: None,
                error: Some(_)
            })
        ));
    }

    #[test]
    fn test_slack_client_refuses_escaping() {
        let mut request = sample_request();
        request.url = "http://127.0.0.1:1/api/chat.postMessage".to_string();
        request.escaping = true;

        assert!(matches!(
            slack_client().send(&request),
            Err(PipelineError::Configuration(_))
        ));
    }
}
