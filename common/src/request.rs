//! Builds the `chat.postMessage` request for a job.

use reqwest::Method;
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::format::format_job;
use crate::record::JobRecord;

pub const POST_MESSAGE_ENDPOINT: &str = "https://slack.com/api/chat.postMessage";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Credentials and target channel for a single post.
#[derive(Clone, PartialEq, Eq)]
pub struct SlackConfig {
    pub token: String,
    pub channel: String,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"***")
            .field("channel", &self.channel)
            .finish()
    }
}

/// Everything an HTTP client needs to send one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub content_type: &'static str,
    /// JSON payload, already serialized.
    pub body: String,
    /// Send `body` byte-for-byte; re-escaping it breaks newlines in Slack.
    pub escaping: bool,
}

impl RequestDescriptor {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Serialize)]
struct PostMessageBody<'a> {
    channel: &'a str,
    text: String,
}

pub fn build_request(job: &JobRecord, config: &SlackConfig) -> Result<RequestDescriptor> {
    if config.token.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "bearer token is empty".to_string(),
        ));
    }
    if config.channel.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "slack channel is empty".to_string(),
        ));
    }

    let body = serde_json::to_string(&PostMessageBody {
        channel: &config.channel,
        text: format_job(job),
    })
    .map_err(|e| PipelineError::Configuration(format!("failed to encode payload: {e}")))?;

    Ok(RequestDescriptor {
        method: Method::POST,
        url: POST_MESSAGE_ENDPOINT.to_string(),
        headers: vec![(
            "Authorization".to_string(),
            format!("Bearer {}", config.token),
        )],
        content_type: JSON_CONTENT_TYPE,
        body,
        escaping: false,
    })
}
