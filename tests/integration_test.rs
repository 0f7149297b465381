use insightforge::config::{Config, DEFAULT_API_URL, DEFAULT_MODEL};

fn remote_config(api_key: Option<&str>) -> Config {
    Config {
        api_key: api_key.map(str::to_string),
        model: DEFAULT_MODEL.to_string(),
        api_url: DEFAULT_API_URL.to_string(),
        timeout_secs: 120,
    }
}

#[test]
fn test_config_validation_requires_key_for_remote_gateway() {
    assert!(remote_config(None).validate().is_err());
    assert!(remote_config(Some("test-key")).validate().is_ok());
}

#[test]
fn test_config_validation_allows_local_endpoint_without_api_key() {
    let config = Config {
        api_key: None,
        model: "local/llama3.3".to_string(),
        api_url: "http://localhost:8000/v1/chat/completions".to_string(),
        timeout_secs: 30,
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_rejects_non_http_urls_and_zero_timeout() {
    let mut config = remote_config(Some("test-key"));
    config.api_url = "ftp://gateway.example/v1".to_string();
    assert!(config.validate().is_err());

    let mut config = remote_config(Some("test-key"));
    config.timeout_secs = 0;
    assert!(config.validate().is_err());
}
