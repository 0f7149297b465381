use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: Role,
    pub content: String,
}

impl ApiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Research context a chat conversation runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    #[default]
    General,
    Competitive,
    Industry,
}

impl ChatMode {
    pub const ALL: [ChatMode; 3] = [ChatMode::General, ChatMode::Competitive, ChatMode::Industry];

    pub fn id(self) -> &'static str {
        match self {
            ChatMode::General => "general",
            ChatMode::Competitive => "competitive",
            ChatMode::Industry => "industry",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChatMode::General => "Market Research",
            ChatMode::Competitive => "Competitive Intel",
            ChatMode::Industry => "Industry Deep-Dive",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            ChatMode::General => {
                "You are InsightForge AI, an expert market research analyst. \
Provide data-driven, concise market insights with specific numbers, trends, \
and actionable intelligence. Structure responses with clear headers and bullet points. \
Always cite reasoning and note confidence levels (high/medium/low) for claims."
            }
            ChatMode::Competitive => {
                "You are InsightForge AI in Competitive Intelligence mode. \
Focus on competitor analysis, market positioning, competitive advantages, \
pricing strategies, and market share dynamics. Be specific with company names, \
funding data, and strategic moves. Rate confidence on each claim."
            }
            ChatMode::Industry => {
                "You are InsightForge AI in Industry Deep-Dive mode. \
Provide comprehensive industry analysis including market size, growth rates, \
key trends, regulatory landscape, technology shifts, and value chain analysis. \
Use frameworks like Porter's Five Forces where relevant. Include confidence levels."
            }
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ChatMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "general" | "market" | "research" => Ok(ChatMode::General),
            "competitive" | "competitors" | "intel" => Ok(ChatMode::Competitive),
            "industry" | "deep-dive" | "deepdive" => Ok(ChatMode::Industry),
            other => Err(anyhow::anyhow!(
                "unknown chat mode '{other}' (expected general, competitive or industry)"
            )),
        }
    }
}

/// Non-streaming chat completion body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl ChatCompletion {
    pub fn first_message(&self) -> Option<&CompletionMessage> {
        self.choices.first().map(|choice| &choice.message)
    }
}

/// One `data:` frame of a streamed chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Decoded unit of a streamed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_message_serializes_lowercase_role() {
        let msg = ApiMessage::user("Hello");
        let serialized = serde_json::to_value(&msg).unwrap();
        assert_eq!(serialized["role"], "user");
        assert_eq!(serialized["content"], "Hello");
    }

    #[test]
    fn test_chat_mode_parses_ids_and_aliases() {
        assert_eq!("competitive".parse::<ChatMode>().unwrap(), ChatMode::Competitive);
        assert_eq!(" Industry ".parse::<ChatMode>().unwrap(), ChatMode::Industry);
        assert_eq!("market".parse::<ChatMode>().unwrap(), ChatMode::General);
        assert!("sales".parse::<ChatMode>().is_err());
    }

    #[test]
    fn test_every_mode_prompt_asks_for_confidence() {
        for mode in ChatMode::ALL {
            assert!(mode.system_prompt().to_lowercase().contains("confidence"));
        }
    }

    #[test]
    fn test_completion_tolerates_missing_tool_calls() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{}"}}]}"#;
        let completion: ChatCompletion = serde_json::from_str(body).unwrap();
        let message = completion.first_message().unwrap();
        assert!(message.tool_calls.is_empty());
        assert_eq!(message.content.as_deref(), Some("{}"));
    }
}
