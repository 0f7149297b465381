use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};

use crate::util::{env_flag, non_empty_env};

const DEFAULT_API_LOG_PATH: &str = "/tmp/insightforge-debug.log";
const DEBUG_PAYLOAD_ENV: &str = "INSIGHTFORGE_DEBUG_PAYLOAD";
const API_LOG_PATH_ENV: &str = "INSIGHTFORGE_LOG_PATH";

pub fn debug_payload_enabled() -> bool {
    env_flag(DEBUG_PAYLOAD_ENV)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    let message = format!(
        "INSIGHTFORGE DEBUG payload_request url={request_url}\npayload:\n{formatted_payload}\n"
    );
    emit_log_message(&message);
}

pub fn emit_sse_parse_error(json_data: &str, parse_error: &serde_json::Error) {
    let message =
        format!("INSIGHTFORGE ERROR sse_parse_failed error={parse_error}\ndata:\n{json_data}\n");
    emit_log_message(&message);
}

pub fn emit_gateway_error(request_url: &str, status: u16, body: &str) {
    let message =
        format!("INSIGHTFORGE ERROR gateway_status url={request_url} status={status}\nbody:\n{body}\n");
    emit_log_message(&message);
}

fn emit_log_message(message: &str) {
    if let Some(path) = resolve_log_path() {
        if append_log_file(&path, message).is_ok() {
            return;
        }
    }

    eprintln!("{message}");
}

fn resolve_log_path() -> Option<String> {
    non_empty_env(API_LOG_PATH_ENV).or_else(|| {
        // Keep an interactive terminal clean; piped stderr gets the raw log.
        if std::io::stderr().is_terminal() {
            Some(DEFAULT_API_LOG_PATH.to_string())
        } else {
            None
        }
    })
}

fn append_log_file(path: &str, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_payload_enabled_accepts_true_variants() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(DEBUG_PAYLOAD_ENV, "1");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "TRUE");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "off");
        assert!(!debug_payload_enabled());
        std::env::remove_var(DEBUG_PAYLOAD_ENV);
    }

    #[test]
    fn test_resolve_log_path_uses_env_override() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(API_LOG_PATH_ENV, "/tmp/test-insightforge.log");
        assert_eq!(
            resolve_log_path().as_deref(),
            Some("/tmp/test-insightforge.log")
        );
        std::env::remove_var(API_LOG_PATH_ENV);
    }

    #[test]
    fn test_log_messages_append_to_file() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("api.log");
        std::env::set_var(API_LOG_PATH_ENV, &path);

        emit_gateway_error("http://localhost:8000/v1/chat/completions", 500, "boom");
        emit_gateway_error("http://localhost:8000/v1/chat/completions", 502, "bad");

        let written = std::fs::read_to_string(&path).expect("log file");
        assert!(written.contains("status=500"));
        assert!(written.contains("status=502"));
        std::env::remove_var(API_LOG_PATH_ENV);
    }
}
