use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Retrieval collection a cited source came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceType {
    CompetitorDiscovery,
    FrameworkAnalysis,
    ChatAnalysis,
    Other(String),
}

impl SourceType {
    pub fn as_str(&self) -> &str {
        match self {
            SourceType::CompetitorDiscovery => "competitor_discovery",
            SourceType::FrameworkAnalysis => "framework_analysis",
            SourceType::ChatAnalysis => "chat_analysis",
            SourceType::Other(raw) => raw,
        }
    }

    /// Display label; unknown types show their raw identifier.
    pub fn label(&self) -> &str {
        match self {
            SourceType::CompetitorDiscovery => "Competitor Intel",
            SourceType::FrameworkAnalysis => "Framework",
            SourceType::ChatAnalysis => "Research",
            SourceType::Other(raw) => raw,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SourceType::CompetitorDiscovery => "database",
            SourceType::FrameworkAnalysis | SourceType::Other(_) => "file-text",
            SourceType::ChatAnalysis => "message-square",
        }
    }
}

impl From<String> for SourceType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "competitor_discovery" => SourceType::CompetitorDiscovery,
            "framework_analysis" => SourceType::FrameworkAnalysis,
            "chat_analysis" => SourceType::ChatAnalysis,
            _ => SourceType::Other(raw),
        }
    }
}

impl From<&str> for SourceType {
    fn from(raw: &str) -> Self {
        SourceType::from(raw.to_string())
    }
}

impl From<SourceType> for String {
    fn from(value: SourceType) -> Self {
        match value {
            SourceType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub source: String,
    pub source_type: SourceType,
    pub similarity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Full retrieved passage, when the retrieval service returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Source {
    pub fn new(source: impl Into<String>, source_type: impl Into<SourceType>, similarity: f64) -> Self {
        Self {
            source: source.into(),
            source_type: source_type.into(),
            similarity,
            preview: None,
            content: None,
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Passage text handed to the model: the full content, else the preview.
    pub fn passage(&self) -> &str {
        self.content
            .as_deref()
            .or(self.preview.as_deref())
            .unwrap_or_default()
    }

    /// Build a source from loosely-typed JSON, failing loudly on a missing or
    /// non-numeric similarity instead of defaulting it.
    pub fn from_value(value: Value) -> Result<Self> {
        let name = value
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();
        match value.get("similarity") {
            None | Some(Value::Null) => {
                bail!("source '{name}' has no similarity score")
            }
            Some(Value::Number(number)) => {
                let similarity = number
                    .as_f64()
                    .ok_or_else(|| anyhow!("source '{name}' has an unrepresentable similarity"))?;
                if !similarity.is_finite() {
                    bail!("source '{name}' has a non-finite similarity");
                }
            }
            Some(other) => {
                bail!("source '{name}' has a non-numeric similarity: {other}")
            }
        }
        serde_json::from_value(value).with_context(|| format!("invalid source '{name}'"))
    }
}

/// Parse a JSON array of sources as returned by the retrieval service.
pub fn parse_sources(json: &str) -> Result<Vec<Source>> {
    let values: Vec<Value> =
        serde_json::from_str(json).context("source list must be a JSON array")?;
    values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            Source::from_value(value).with_context(|| format!("source #{} is invalid", idx + 1))
        })
        .collect()
}
