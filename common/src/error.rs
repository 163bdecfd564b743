//! Error kinds raised by the posting pipeline.

/// Every stage of the pipeline fails with one of these and stops there.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A form label was absent, or its value list was empty.
    #[error("form submission is missing the '{0}' field")]
    MissingField(String),

    /// The sheet range had no rows, or its first row was too short.
    #[error("malformed sheet row: {0}")]
    MalformedRow(String),

    /// A required setting is missing or empty, or the settings store failed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The API response lacked `ts`/`channel`, or `ts` was not `<secs>.<frac>`.
    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    /// Slack rejected the message: non-success status or `ok: false`.
    #[error("{}", send_failure_message(.status, .error))]
    SendFailure {
        status: Option<u16>,
        error: Option<String>,
    },
}

fn send_failure_message(status: &Option<u16>, error: &Option<String>) -> String {
    match (status, error) {
        (Some(status), Some(error)) => format!("send failed with status {status}: {error}"),
        (Some(status), None) => format!("send failed with status {status}"),
        (None, Some(error)) => format!("send failed: {error}"),
        (None, None) => "send failed".to_string(),
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
