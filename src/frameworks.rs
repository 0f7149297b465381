//! Templated strategy analyses: SWOT, Porter's Five Forces, TAM/SAM/SOM.

use crate::api::{GatewayClient, ToolRequest};
use crate::types::ChatCompletion;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const SYSTEM_PROMPT: &str = "You are a strategic analysis AI. Return ONLY valid JSON, no markdown formatting or code blocks. Be specific and data-driven.";
const TOOL_NAME: &str = "deliver_analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkKind {
    Porters,
    Swot,
    Tam,
}

impl FrameworkKind {
    pub const ALL: [FrameworkKind; 3] = [FrameworkKind::Porters, FrameworkKind::Swot, FrameworkKind::Tam];

    pub fn id(self) -> &'static str {
        match self {
            FrameworkKind::Porters => "porters",
            FrameworkKind::Swot => "swot",
            FrameworkKind::Tam => "tam",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FrameworkKind::Porters => "Porter's Five Forces",
            FrameworkKind::Swot => "SWOT Analysis",
            FrameworkKind::Tam => "TAM/SAM/SOM",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FrameworkKind::Porters => "Analyze competitive forces shaping an industry",
            FrameworkKind::Swot => "Strengths, Weaknesses, Opportunities, Threats",
            FrameworkKind::Tam => "Total, Serviceable, and Obtainable market sizing",
        }
    }

    /// Input fields the prompt template reads, in display order.
    pub fn fields(self) -> [&'static str; 2] {
        match self {
            FrameworkKind::Porters => ["Industry/Market", "Key Players"],
            FrameworkKind::Swot => ["Company/Product", "Market Context"],
            FrameworkKind::Tam => ["Market/Niche", "Geography"],
        }
    }

    fn field_defaults(self) -> [&'static str; 2] {
        match self {
            FrameworkKind::Porters => ["the industry", "major players"],
            FrameworkKind::Swot => ["the company", "their market"],
            FrameworkKind::Tam => ["the market", "Global"],
        }
    }

    /// Fill the analysis prompt. Missing or blank inputs fall back to generic
    /// wording rather than failing.
    pub fn prompt(self, inputs: &BTreeMap<String, String>) -> String {
        let [first, second] = self.fields();
        let [first_default, second_default] = self.field_defaults();
        let value = |field: &str, default: &'static str| -> String {
            inputs
                .get(field)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let a = value(first, first_default);
        let b = value(second, second_default);

        match self {
            FrameworkKind::Swot => format!(
                "Perform a comprehensive SWOT analysis for: {a} in the context of: {b}. Return a JSON object with keys: strengths, weaknesses, opportunities, threats. Each key should have an array of 4-6 specific, data-informed bullet points. Be concrete with market data where possible."
            ),
            FrameworkKind::Porters => format!(
                "Analyze Porter's Five Forces for the industry: {a} with key players: {b}. Return a JSON object with keys: supplier_power, buyer_power, competitive_rivalry, threat_of_substitution, threat_of_new_entry. Each should have: rating (1-5), analysis (2-3 sentences), key_factors (array of strings)."
            ),
            FrameworkKind::Tam => format!(
                "Estimate TAM/SAM/SOM for: {a} in geography: {b}. Return a JSON object with keys: tam (total addressable market), sam (serviceable addressable market), som (serviceable obtainable market). Each should have: value (dollar amount string), methodology (1-2 sentences on how estimated), growth_rate (annual %), confidence (high/medium/low)."
            ),
        }
    }

    pub fn tool_request(self, inputs: &BTreeMap<String, String>) -> ToolRequest {
        ToolRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: self.prompt(inputs),
            tool_name: TOOL_NAME,
            tool_description: "Return the structured framework analysis result",
            parameters: json!({
                "type": "object",
                "properties": {
                    "result": {
                        "type": "object",
                        "description": "The framework analysis result object"
                    }
                },
                "required": ["result"]
            }),
        }
    }
}

impl fmt::Display for FrameworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FrameworkKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "swot" => Ok(FrameworkKind::Swot),
            "porters" | "porter" | "five-forces" => Ok(FrameworkKind::Porters),
            "tam" | "tam-sam-som" => Ok(FrameworkKind::Tam),
            other => {
                let known: Vec<&str> = FrameworkKind::ALL.iter().map(|kind| kind.id()).collect();
                bail!("Unknown framework: {other} (expected one of: {})", known.join(", "))
            }
        }
    }
}

/// Reshape a gateway completion into the analysis payload.
///
/// Prefers the forced tool call's `result`; otherwise tries the message text
/// as JSON, and finally returns the text itself.
pub fn extract_result(completion: &ChatCompletion) -> Result<Value> {
    let Some(message) = completion.first_message() else {
        return Ok(Value::String(String::new()));
    };

    if let Some(call) = message.tool_calls.first() {
        let arguments: Value = serde_json::from_str(&call.function.arguments)
            .with_context(|| format!("tool call '{}' returned invalid JSON arguments", call.function.name))?;
        return Ok(arguments.get("result").cloned().unwrap_or(Value::Null));
    }

    let content = message.content.clone().unwrap_or_default();
    Ok(serde_json::from_str::<Value>(&content).unwrap_or(Value::String(content)))
}

pub async fn analyze(
    client: &GatewayClient,
    kind: FrameworkKind,
    inputs: &BTreeMap<String, String>,
) -> Result<Value> {
    let completion = client.complete_with_tool(&kind.tool_request(inputs)).await?;
    extract_result(&completion)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwotAnalysis {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub threats: Vec<String>,
}

impl SwotAnalysis {
    /// Quadrant names paired with their items, in display order.
    pub fn quadrants(&self) -> [(&'static str, &[String]); 4] {
        [
            ("strengths", &self.strengths),
            ("weaknesses", &self.weaknesses),
            ("opportunities", &self.opportunities),
            ("threats", &self.threats),
        ]
    }

    /// Interpret an analysis payload as SWOT, if it has that shape.
    pub fn from_result(result: &Value) -> Option<Self> {
        if !result.is_object() {
            return None;
        }
        serde_json::from_value(result.clone()).ok()
    }
}

/// Canned SWOT shown when the gateway is unreachable.
pub fn demo_swot() -> SwotAnalysis {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    SwotAnalysis {
        strengths: owned(&[
            "Strong brand recognition",
            "Proprietary technology",
            "Experienced leadership team",
        ]),
        weaknesses: owned(&[
            "High customer acquisition cost",
            "Limited international presence",
            "Dependency on single revenue stream",
        ]),
        opportunities: owned(&[
            "Emerging markets expansion",
            "AI integration potential",
            "Strategic partnerships",
        ]),
        threats: owned(&[
            "Increasing competition",
            "Regulatory changes",
            "Economic downturn risk",
        ]),
    }
}
