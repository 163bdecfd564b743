//! Turns job submissions into Slack posts and links back to them.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod link;
pub mod pipeline;
pub mod record;
pub mod request;

pub use client::{DryRunClient, MessagingClient, SlackClient};
pub use config::{ConfigStore, EnvStore, MemoryStore, PropertiesStore, SlackSettings};
pub use error::{PipelineError, Result};
pub use format::{MessageFormat, format_job};
pub use link::{PostMessageResponse, check_response, resolve_link};
pub use pipeline::Pipeline;
pub use record::{FormSubmission, JobRecord, NamedValues};
pub use request::{RequestDescriptor, SlackConfig, build_request};
