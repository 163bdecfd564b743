//! One pass from a submission to a message permalink.

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::MessagingClient;
use crate::config::{ConfigStore, load_slack_settings};
use crate::error::Result;
use crate::format::MessageFormat;
use crate::link::resolve_link;
use crate::record::{JobRecord, NamedValues};
use crate::request::build_request;

/// Posts jobs through an injected client, using settings from an injected store.
#[derive(Clone)]
pub struct Pipeline {
    client: Arc<dyn MessagingClient>,
    store: Arc<dyn ConfigStore>,
}

impl Pipeline {
    pub fn new(client: Arc<dyn MessagingClient>, store: Arc<dyn ConfigStore>) -> Self {
        Self { client, store }
    }

    /// Posts the job and returns the permalink of the new message.
    pub fn post_record(&self, job: &JobRecord) -> Result<String> {
        let settings = load_slack_settings(self.store.as_ref())?;
        let request = build_request(job, &settings.slack)?;

        info!(
            "📋 Posting {} at {} to {}",
            job.role(),
            job.company(),
            settings.slack.channel
        );

        let response = self.client.send(&request).inspect_err(|e| {
            warn!("❌ Slack rejected {} at {}: {}", job.role(), job.company(), e);
        })?;

        let link = resolve_link(&response, &settings.workspace)?;
        info!("✅ Posted: {}", link);
        Ok(link)
    }

    pub fn post_form(&self, submission: &NamedValues) -> Result<String> {
        let job = JobRecord::from_form(submission)?;
        self.post_record(&job)
    }

    pub fn post_row<S: AsRef<str>>(&self, rows: &[Vec<S>]) -> Result<String> {
        let job = JobRecord::from_row(rows)?;
        self.post_record(&job)
    }

    pub fn preview(&self, job: &JobRecord, format: MessageFormat) -> String {
        format.render(job)
    }
}
