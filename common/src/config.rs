//! Where the Slack settings live.
//!
//! Settings are read fresh on every post; nothing here caches a value.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::request::SlackConfig;

pub const BEARER_TOKEN_KEY: &str = "BEARER_TOKEN";
pub const SLACK_CHANNEL_KEY: &str = "SLACK_CHANNEL";
pub const SLACK_WORKSPACE_KEY: &str = "SLACK_WORKSPACE";

/// Workspace used for permalinks when `SLACK_WORKSPACE` is unset.
pub const DEFAULT_WORKSPACE: &str = "climate-tech";

pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Settings for one pass through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackSettings {
    pub slack: SlackConfig,
    pub workspace: String,
}

pub fn load_slack_settings(store: &dyn ConfigStore) -> Result<SlackSettings> {
    let required = |key: &str| -> Result<String> {
        store
            .get(key)?
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| PipelineError::Configuration(format!("{key} is not set")))
    };

    let token = required(BEARER_TOKEN_KEY)?;
    let channel = required(SLACK_CHANNEL_KEY)?;
    let workspace = store
        .get(SLACK_WORKSPACE_KEY)?
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_WORKSPACE.to_string());

    debug!("Loaded settings for channel {} in workspace {}", channel, workspace);

    Ok(SlackSettings {
        slack: SlackConfig { token, channel },
        workspace,
    })
}

/// Settings kept in a TOML file of string keys.
#[derive(Debug, Clone)]
pub struct PropertiesStore {
    path: PathBuf,
}

impl PropertiesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            PipelineError::Configuration(format!(
                "failed to read settings file {}: {e}",
                self.path.display()
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            PipelineError::Configuration(format!(
                "failed to parse settings file {}: {e}",
                self.path.display()
            ))
        })
    }
}

impl ConfigStore for PropertiesStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut settings = self.read_all()?;
        settings.insert(key.to_string(), value.to_string());

        let content = toml::to_string(&settings).map_err(|e| {
            PipelineError::Configuration(format!("failed to encode settings: {e}"))
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                PipelineError::Configuration(format!(
                    "failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }

        fs::write(&self.path, content).map_err(|e| {
            PipelineError::Configuration(format!(
                "failed to write settings file {}: {e}",
                self.path.display()
            ))
        })
    }
}

/// Settings taken from the process environment. Read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvStore;

impl ConfigStore for EnvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(PipelineError::Configuration(format!("{key}: {e}"))),
        }
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(PipelineError::Configuration(format!(
            "cannot store {key}: environment settings are read-only"
        )))
    }
}

/// In-process settings, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: Mutex::new(
                pairs
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            ),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| PipelineError::Configuration("settings lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| PipelineError::Configuration("settings lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
