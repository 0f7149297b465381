use serde_json::Value;

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Non-success answer from the chat-completion gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Rate limit exceeded, try again shortly")]
    RateLimited,

    #[error("AI credits depleted (payment required)")]
    PaymentRequired,

    #[error("AI gateway error (HTTP {status}): {message}")]
    Status { status: u16, message: String },
}

impl GatewayError {
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => GatewayError::RateLimited,
            402 => GatewayError::PaymentRequired,
            _ => GatewayError::Status {
                status,
                message: error_message_from_body(body),
            },
        }
    }
}

/// Pull a readable message out of `{"error": "..."}`,
/// `{"error": {"message": "..."}}` or a plain-text body.
fn error_message_from_body(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        let error = value.get("error")?;
        error
            .as_str()
            .or_else(|| error.get("message").and_then(Value::as_str))
            .map(str::to_string)
    });

    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return "no error details".to_string();
    }
    if message.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = message.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return format!("{truncated}…");
    }
    message
}
