use crate::infrastructure::error::InfraError;
use std::fmt;
use url::Url;

const API_KEY_KEYS: &[&str] = &["WEEKPLAN_OPENAI_API_KEY", "OPENAI_API_KEY"];
const MODEL_KEYS: &[&str] = &["WEEKPLAN_OPENAI_MODEL", "OPENAI_MODEL"];
const BASE_URL_KEYS: &[&str] = &["WEEKPLAN_OPENAI_BASE_URL", "OPENAI_BASE_URL"];
pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

#[derive(Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
}

impl SchedulerConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: &str) -> Result<Self, InfraError> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: parse_base_url(base_url)?,
        })
    }
}

impl fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// `Ok(None)` means no credential is configured and the scheduler stays
/// unavailable for the session.
pub fn load_scheduler_config_from_env() -> Result<Option<SchedulerConfig>, InfraError> {
    load_scheduler_config_from_lookup(|key| std::env::var(key).ok())
}

pub fn load_scheduler_config_from_lookup<F>(lookup: F) -> Result<Option<SchedulerConfig>, InfraError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(api_key) = optional_lookup_value(&lookup, API_KEY_KEYS) else {
        return Ok(None);
    };
    let model = optional_lookup_value(&lookup, MODEL_KEYS)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let base_url = optional_lookup_value(&lookup, BASE_URL_KEYS)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    SchedulerConfig::new(api_key, model, &base_url).map(Some)
}

fn optional_lookup_value<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(value) = lookup(key) {
            let normalized = value.trim();
            if !normalized.is_empty() {
                return Some(normalized.to_string());
            }
        }
    }
    None
}

// Joining relative paths onto a base without a trailing slash drops its last
// segment, so the slash is always added.
fn parse_base_url(raw: &str) -> Result<Url, InfraError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|error| InfraError::Configuration(format!("invalid base url {trimmed}: {error}")))?;
    if url.cannot_be_a_base() {
        return Err(InfraError::Configuration(format!(
            "base url cannot be a base: {trimmed}"
        )));
    }
    Ok(url)
}
