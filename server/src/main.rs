//! Job Poster Server
//!
//! Receives form-submit events over HTTP, posts each job to Slack
//! and answers with the permalink of the new message.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use common::{
    ConfigStore, DryRunClient, EnvStore, FormSubmission, JobRecord, MessageFormat,
    MessagingClient, Pipeline, PipelineError, PropertiesStore, SlackClient,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "server", about = "Post form submissions to a Slack channel")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "JOB_POSTER_ADDR", default_value = "127.0.0.1:3000")]
    addr: String,

    /// Settings file (TOML). Settings come from the environment when omitted.
    #[arg(long, env = "JOB_POSTER_SETTINGS")]
    settings: Option<PathBuf>,

    /// Log Slack requests instead of sending them.
    #[arg(
        long,
        env = "JOB_POSTER_DRY_RUN",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    dry_run: bool,

    /// HTTP timeout for Slack calls, in seconds.
    #[arg(long, default_value_t = common::client::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

/// Shared application state
struct AppState {
    pipeline: Pipeline,
}

/// Response for a posted submission
#[derive(Debug, Serialize)]
struct SubmitResponse {
    link: String,
}

/// Response for a preview request
#[derive(Debug, Serialize)]
struct PreviewResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Errors a handler reports back to the caller.
#[derive(Debug)]
enum ApiError {
    Pipeline(PipelineError),
    Worker(String),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(PipelineError::MissingField(_))
            | ApiError::Pipeline(PipelineError::MalformedRow(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Pipeline(PipelineError::Configuration(_)) | ApiError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Pipeline(PipelineError::SendFailure { .. })
            | ApiError::Pipeline(PipelineError::MalformedResponse(_)) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Pipeline(e) => e.to_string(),
            ApiError::Worker(e) => e,
        };
        error!("❌ {} {}", status.as_u16(), message);
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Handler for POST /submissions
async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<FormSubmission>,
) -> Result<Json<SubmitResponse>, ApiError> {
    // Slack is called with a blocking client; keep it off the async workers.
    let pipeline = state.pipeline.clone();
    let link = tokio::task::spawn_blocking(move || pipeline.post_form(&event.named_values))
        .await
        .map_err(|e| ApiError::Worker(format!("posting task failed: {e}")))??;

    Ok(Json(SubmitResponse { link }))
}

/// Handler for POST /preview
async fn preview_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<FormSubmission>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let job = JobRecord::from_form(&event.named_values)?;
    let text = state.pipeline.preview(&job, MessageFormat::Slack);
    Ok(Json(PreviewResponse { text }))
}

/// Handler for GET / (root)
async fn root_handler() -> &'static str {
    "📮 Job Poster API\n\nEndpoints:\n  POST /submissions - Post a form submission to Slack\n  POST /preview     - Render a form submission without posting\n\nExample:\n  curl -X POST http://127.0.0.1:3000/submissions -H 'content-type: application/json' -d '{\"namedValues\": {\"Company\": [\"Acme\"], ...}}'"
}

/// Stands in for Slack with `--dry-run`. Keeps no requests.
fn dry_run_client() -> DryRunClient {
    DryRunClient::replying("DRYRUN", "0000000000.000000")
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/submissions", post(submit_handler))
        .route("/preview", post(preview_handler))
        .with_state(state)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("🚀 Starting Job Poster Server...");

    let store: Arc<dyn ConfigStore> = match &cli.settings {
        Some(path) => {
            info!("📂 Reading settings from {:?}", path);
            Arc::new(PropertiesStore::new(path))
        }
        None => {
            info!("📂 Reading settings from the environment");
            Arc::new(EnvStore)
        }
    };

    // The blocking Slack client must be built outside the async runtime.
    let client: Arc<dyn MessagingClient> = if cli.dry_run {
        info!("🧪 Dry run: nothing will be posted");
        Arc::new(dry_run_client())
    } else {
        Arc::new(SlackClient::new(Duration::from_secs(cli.timeout))?)
    };

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(client, store),
    });

    tokio::runtime::Runtime::new()?.block_on(serve(&cli.addr, app(state)))
}

async fn serve(addr: &str, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Server running at http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MemoryStore;
    use common::config::{BEARER_TOKEN_KEY, SLACK_CHANNEL_KEY, SLACK_WORKSPACE_KEY};
    use common::record::FORM_LABELS;

    fn state_with(store: MemoryStore) -> Arc<AppState> {
        let client = Arc::new(DryRunClient::replying("C123", "1700000000.123456"));
        Arc::new(AppState {
            pipeline: Pipeline::new(client, Arc::new(store)),
        })
    }

    fn configured_state() -> Arc<AppState> {
        state_with(MemoryStore::with(&[
            (BEARER_TOKEN_KEY, "xoxb-test"),
            (SLACK_CHANNEL_KEY, "#jobs"),
            (SLACK_WORKSPACE_KEY, "acme"),
        ]))
    }

    fn full_submission() -> FormSubmission {
        FormSubmission {
            named_values: FORM_LABELS
                .iter()
                .map(|label| (label.to_string(), vec![format!("{label} value")]))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_submit_returns_link() {
        let Json(response) = submit_handler(State(configured_state()), Json(full_submission()))
            .await
            .unwrap();

        assert_eq!(
            response.link,
            "https://acme.slack.com/archives/C123/p1700000000123456"
        );
    }

    #[tokio::test]
    async fn test_submit_missing_field_is_unprocessable() {
        let mut event = full_submission();
        event.named_values.remove("Contact");

        let err = submit_handler(State(configured_state()), Json(event))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_submit_without_settings_is_server_error() {
        let state = state_with(MemoryStore::default());

        let err = submit_handler(State(state), Json(full_submission()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_preview_renders_slack_text() {
        let Json(response) = preview_handler(State(configured_state()), Json(full_submission()))
            .await
            .unwrap();

        assert!(response.text.starts_with("*Company*: Company value\n"));
    }

    #[test]
    fn test_send_failure_is_bad_gateway() {
        let err = ApiError::from(PipelineError::SendFailure {
            status: Some(200),
            error: Some("not_in_channel".to_string()),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_dry_run_client_keeps_no_requests() {
        let client = Arc::new(dry_run_client());
        let state = Arc::new(AppState {
            pipeline: Pipeline::new(
                client.clone(),
                Arc::new(MemoryStore::with(&[
                    (BEARER_TOKEN_KEY, "xoxb-test"),
                    (SLACK_CHANNEL_KEY, "#jobs"),
                ])),
            ),
        });

        for _ in 0..50 {
            submit_handler(State(state.clone()), Json(full_submission()))
                .await
                .unwrap();
        }
        assert!(client.sent().is_empty());
    }

    // Environment-dependent parsing stays in one test so nothing races on the variables.
    #[test]
    fn test_cli_flags_and_env() {
        let cli = Cli::try_parse_from(["server"]).unwrap();
        assert_eq!(cli.addr, "127.0.0.1:3000");
        assert!(!cli.dry_run);

        assert!(Cli::try_parse_from(["server", "--dry-run"]).unwrap().dry_run);

        for (value, expected) in [("1", true), ("yes", true), ("true", true), ("0", false), ("no", false)] {
            unsafe { std::env::set_var("JOB_POSTER_DRY_RUN", value) };
            let cli = Cli::try_parse_from(["server"]).unwrap();
            assert_eq!(cli.dry_run, expected, "JOB_POSTER_DRY_RUN={value}");
        }
        unsafe { std::env::remove_var("JOB_POSTER_DRY_RUN") };
    }
}
