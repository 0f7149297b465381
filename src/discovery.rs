//! Competitor discovery through a forced `deliver_competitors` tool call.

use crate::api::{GatewayClient, ToolRequest};
use crate::segment::Confidence;
use crate::types::ChatCompletion;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

const SYSTEM_PROMPT: &str = "You are a competitive intelligence analyst. Discover and analyze competitors in a given market. Be specific with real company names, funding amounts, and data points where possible.";
const TOOL_NAME: &str = "deliver_competitors";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub funding: String,
    pub headcount: String,
    pub pricing: String,
    pub positioning: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    /// Estimated share of the market covered, 0-100.
    #[serde(default)]
    pub coverage: f64,
}

impl DiscoveryReport {
    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }
}

pub fn tool_request(query: &str) -> ToolRequest {
    ToolRequest {
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt: format!(
            "Discover the top 6-8 competitors in this market: \"{query}\". For each competitor provide: company name, estimated funding stage/amount, approximate headcount range, pricing model/range, market positioning, and your confidence level (high/medium/low) in the data accuracy."
        ),
        tool_name: TOOL_NAME,
        tool_description: "Return discovered competitors with structured data",
        parameters: json!({
            "type": "object",
            "properties": {
                "competitors": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "funding": { "type": "string" },
                            "headcount": { "type": "string" },
                            "pricing": { "type": "string" },
                            "positioning": { "type": "string" },
                            "confidence": { "type": "string", "enum": ["high", "medium", "low"] }
                        },
                        "required": ["name", "funding", "headcount", "pricing", "positioning", "confidence"]
                    }
                },
                "coverage": {
                    "type": "number",
                    "description": "Estimated discovery coverage percentage (0-100)"
                }
            },
            "required": ["competitors", "coverage"]
        }),
    }
}

/// Read the report out of the tool call. A completion without one yields an
/// empty report with zero coverage.
pub fn parse_report(completion: &ChatCompletion) -> Result<DiscoveryReport> {
    let Some(call) = completion
        .first_message()
        .and_then(|message| message.tool_calls.first())
    else {
        return Ok(DiscoveryReport::default());
    };

    serde_json::from_str(&call.function.arguments)
        .with_context(|| format!("tool call '{}' returned an invalid competitor report", call.function.name))
}

pub async fn discover(client: &GatewayClient, query: &str) -> Result<DiscoveryReport> {
    let completion = client.complete_with_tool(&tool_request(query)).await?;
    parse_report(&completion)
}
