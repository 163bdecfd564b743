//! Reads Slack's reply and turns it into a permalink to the posted message.

use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// The parts of a `chat.postMessage` reply the pipeline uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostMessageResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Interprets a raw HTTP status and body from Slack.
///
/// A non-2xx status or `"ok": false` in the body is a [`PipelineError::SendFailure`].
pub fn check_response(status: u16, body: &str) -> Result<PostMessageResponse> {
    let parsed = serde_json::from_str::<PostMessageResponse>(body);

    if !(200..300).contains(&status) {
        return Err(PipelineError::SendFailure {
            status: Some(status),
            error: parsed.ok().and_then(|response| response.error),
        });
    }

    let response = parsed
        .map_err(|e| PipelineError::MalformedResponse(format!("body is not valid JSON: {e}")))?;

    if response.ok == Some(false) {
        return Err(PipelineError::SendFailure {
            status: Some(status),
            error: response.error,
        });
    }

    Ok(response)
}

/// `https://{workspace}.slack.com/archives/{channel}/p{ts without the dot}`
pub fn resolve_link(response: &PostMessageResponse, workspace: &str) -> Result<String> {
    if workspace.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "slack workspace is empty".to_string(),
        ));
    }

    let ts = response
        .ts
        .as_deref()
        .filter(|ts| !ts.is_empty())
        .ok_or_else(|| PipelineError::MalformedResponse("missing 'ts'".to_string()))?;
    let channel = response
        .channel
        .as_deref()
        .filter(|channel| !channel.is_empty())
        .ok_or_else(|| PipelineError::MalformedResponse("missing 'channel'".to_string()))?;

    let (seconds, fraction) = ts.split_once('.').ok_or_else(|| {
        PipelineError::MalformedResponse(format!("'ts' has no '.' separator: {ts}"))
    })?;
    if fraction.contains('.') {
        return Err(PipelineError::MalformedResponse(format!(
            "'ts' has more than one '.': {ts}"
        )));
    }

    Ok(format!(
        "https://{workspace}.slack.com/archives/{channel}/p{seconds}{fraction}"
    ))
}
