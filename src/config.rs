use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::util::{is_local_endpoint_url, non_empty_env};

pub const DEFAULT_API_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url =
            non_empty_env("INSIGHTFORGE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_key =
            non_empty_env("INSIGHTFORGE_API_KEY").or_else(|| non_empty_env("LOVABLE_API_KEY"));
        let model =
            non_empty_env("INSIGHTFORGE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_secs = match non_empty_env("INSIGHTFORGE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().with_context(|| {
                format!("INSIGHTFORGE_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'")
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            model,
            api_url,
            timeout_secs,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid INSIGHTFORGE_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if !self.is_local_endpoint() && self.api_key.is_none() {
            bail!(
                "INSIGHTFORGE_API_KEY (or LOVABLE_API_KEY) must be set for non-local endpoints (url: '{}')",
                self.api_url
            );
        }

        if self.model.trim().is_empty() {
            bail!("INSIGHTFORGE_MODEL must not be empty");
        }

        if self.timeout_secs == 0 {
            bail!("INSIGHTFORGE_TIMEOUT_SECS must be greater than zero");
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }
}
