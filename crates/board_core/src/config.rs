use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::{client::ScrumClient, session::FailurePolicy};

pub const DEFAULT_CONFIG_FILE: &str = "scrum.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_url: String,
    pub token: Option<String>,
    pub failure_policy: FailurePolicy,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000".into(),
            token: None,
            failure_policy: FailurePolicy::Notify,
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    token: Option<String>,
    failure_policy: Option<FailurePolicy>,
    request_timeout_secs: Option<u64>,
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn build_client(&self) -> Result<ScrumClient> {
        Ok(ScrumClient::with_timeout(&self.api_url, self.request_timeout())?
            .with_token(self.token.clone()))
    }
}

/// Defaults, then `scrum.toml` in the working directory, then environment.
pub fn load_settings() -> Result<ClientSettings> {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from<F>(path: &Path, env: F) -> Result<ClientSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = ClientSettings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        if let Some(v) = file_cfg.api_url {
            settings.api_url = v;
        }
        if file_cfg.token.is_some() {
            settings.token = file_cfg.token;
        }
        if let Some(v) = file_cfg.failure_policy {
            settings.failure_policy = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = v;
        }
    }

    apply_env(&mut settings, env)?;
    if settings.request_timeout_secs == 0 {
        return Err(anyhow!("request_timeout_secs must be at least 1"));
    }
    Ok(settings)
}

fn apply_env<F>(settings: &mut ClientSettings, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = env("SCRUM_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("SCRUM_TOKEN") {
        settings.token = Some(v);
    }
    if let Some(v) = env("APP__TOKEN") {
        settings.token = Some(v);
    }

    if let Some(v) = env("APP__FAILURE_POLICY") {
        settings.failure_policy = v.parse()?;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = v
            .trim()
            .parse()
            .with_context(|| format!("invalid APP__REQUEST_TIMEOUT_SECS '{v}'"))?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
