//! Runtime configuration
//!
//! Values come from an optional TOML file, then environment overrides.

use crate::util::errors::{MasonError, MasonResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

const ENV_RUNTIME: &str = "MASON_ENV";
const ENV_BASE_URL: &str = "MASON_BASE_URL";
const ENV_ORIGIN: &str = "MASON_ORIGIN";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Requests go to the explicit `base_url`
    Development,
    /// Requests go to `origin` + [`COMPLETIONS_PATH`]
    #[default]
    Production,
}

impl RuntimeEnvironment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => RuntimeEnvironment::Development,
            _ => RuntimeEnvironment::Production,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasonConfig {
    pub environment: RuntimeEnvironment,
    pub base_url: Option<String>,
    pub origin: String,
    /// Snapshot publishes are merged within this window
    pub coalesce_window_ms: u64,
    pub idle_timeout_secs: u64,
    /// Initial state of the web search toggle
    pub network: bool,
}

impl Default for MasonConfig {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            base_url: None,
            origin: "http://127.0.0.1:8088".to_string(),
            coalesce_window_ms: 50,
            idle_timeout_secs: 600,
            network: true,
        }
    }
}

impl MasonConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mason").join("config.toml"))
    }

    /// Loads the file at `path`, or the default location when it exists,
    /// then applies `MASON_*` environment overrides.
    pub fn load(path: Option<&Path>) -> MasonResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|path| path.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_overrides(std::env::vars());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> MasonResult<Self> {
        debug!("Loading config: path={}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> MasonResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_RUNTIME => self.environment = RuntimeEnvironment::parse(&value),
                ENV_BASE_URL => self.base_url = Some(value),
                ENV_ORIGIN => self.origin = value,
                _ => {}
            }
        }
    }

    /// Completion URL for the selected environment.
    pub fn endpoint(&self) -> MasonResult<String> {
        match self.environment {
            RuntimeEnvironment::Development => self
                .base_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    MasonError::Config(format!(
                        "{} must be set in the development environment",
                        ENV_BASE_URL
                    ))
                }),
            RuntimeEnvironment::Production => Ok(format!(
                "{}{}",
                self.origin.trim_end_matches('/'),
                COMPLETIONS_PATH
            )),
        }
    }

    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
