use super::*;

fn settings(provider: Provider) -> Settings {
    Settings {
        api_provider: provider,
        api_key: "sk-test".to_string(),
        ..Settings::default()
    }
}

fn custom(url: &str, openai_compatible: bool) -> Settings {
    Settings {
        api_provider: Provider::Custom,
        api_key: "sk-test".to_string(),
        model: Some("llama3".to_string()),
        custom_url: Some(url.to_string()),
        openai_compatible,
        ..Settings::default()
    }
}

// ===== SETTINGS =====

#[test]
fn test_settings_from_popup_json() {
    let json = r#"{
        "apiProvider": "anthropic",
        "apiKey": "key",
        "model": "claude-3-5-haiku-20241022",
        "temperature": "0.3",
        "maxTokens": "512"
    }"#;
    let s: Settings = serde_json::from_str(json).unwrap();
    assert_eq!(s.api_provider, Provider::Anthropic);
    assert_eq!(s.api_key, "key");
    assert_eq!(s.model.as_deref(), Some("claude-3-5-haiku-20241022"));
    assert_eq!(s.temperature, 0.3);
    assert_eq!(s.max_tokens, 512);
    assert!(!s.openai_compatible);
}

#[test]
fn test_settings_defaults() {
    let s: Settings = serde_json::from_str(r#"{"apiKey": "k"}"#).unwrap();
    assert_eq!(s.api_provider, Provider::OpenAi);
    assert_eq!(s.temperature, DEFAULT_TEMPERATURE);
    assert_eq!(s.max_tokens, DEFAULT_MAX_TOKENS);
}

#[test]
fn test_settings_unparseable_numbers_fall_back() {
    let s: Settings =
        serde_json::from_str(r#"{"apiKey": "k", "temperature": "warm", "maxTokens": null}"#)
            .unwrap();
    assert_eq!(s.temperature, DEFAULT_TEMPERATURE);
    assert_eq!(s.max_tokens, DEFAULT_MAX_TOKENS);
}

#[test]
fn test_settings_zero_max_tokens_is_rejected() {
    let s: Settings = serde_json::from_str(r#"{"apiKey": "k", "maxTokens": "0"}"#).unwrap();
    assert_eq!(s.max_tokens, 0);
    assert_eq!(s.validate(), Err(ConfigError::InvalidMaxTokens(0)));
}

#[test]
fn test_settings_numeric_json() {
    let s: Settings =
        serde_json::from_str(r#"{"apiKey": "k", "temperature": 0, "maxTokens": 4096}"#).unwrap();
    assert_eq!(s.temperature, 0.0);
    assert_eq!(s.max_tokens, 4096);
    assert!(s.validate().is_ok());
}

#[test]
fn test_validate_missing_key() {
    let s = Settings::default();
    assert_eq!(s.validate(), Err(ConfigError::MissingApiKey));
}

#[test]
fn test_validate_custom_requirements() {
    let mut s = custom("http://localhost:11434/v1", true);
    assert!(s.validate().is_ok());

    s.model = None;
    assert_eq!(s.validate(), Err(ConfigError::MissingModel));

    s.model = Some("m".to_string());
    s.custom_url = Some("  ".to_string());
    assert_eq!(s.validate(), Err(ConfigError::MissingCustomUrl));

    s.custom_url = Some("localhost:11434".to_string());
    assert_eq!(
        s.validate(),
        Err(ConfigError::InvalidUrl("localhost:11434".to_string()))
    );
}

#[test]
fn test_validate_ranges() {
    let mut s = settings(Provider::OpenAi);
    s.temperature = 1.5;
    assert_eq!(s.validate(), Err(ConfigError::InvalidTemperature(1.5)));
    s.temperature = 1.0;
    s.max_tokens = 0;
    assert_eq!(s.validate(), Err(ConfigError::InvalidMaxTokens(0)));
    s.max_tokens = 5000;
    assert_eq!(s.validate(), Err(ConfigError::InvalidMaxTokens(5000)));
}

#[test]
fn test_model_default() {
    assert_eq!(settings(Provider::Grok).model_or_default(), "grok-beta");
    let mut s = settings(Provider::Gemini);
    s.model = Some("gemini-2.0-flash".to_string());
    assert_eq!(s.model_or_default(), "gemini-2.0-flash");
}

// ===== CUSTOM URL COMPLETION =====

#[test]
fn test_complete_url_compatible() {
    assert_eq!(
        complete_custom_url("http://localhost:11434/v1", true),
        "http://localhost:11434/v1/chat/completions"
    );
    assert_eq!(
        complete_custom_url("http://localhost:8080/", true),
        "http://localhost:8080/v1/chat/completions"
    );
    assert_eq!(
        complete_custom_url("https://host/v1/chat/completions/", true),
        "https://host/v1/chat/completions/"
    );
}

#[test]
fn test_complete_url_generic() {
    assert_eq!(
        complete_custom_url("http://localhost:1234", false),
        "http://localhost:1234/v1/completions"
    );
    assert_eq!(
        complete_custom_url("http://localhost:1234/v1/completions", false),
        "http://localhost:1234/v1/completions"
    );
}

// ===== REQUEST SHAPING =====

#[test]
fn test_openai_request() {
    let req = build_request(&settings(Provider::OpenAi), Task::Explain, "ls -la").unwrap();
    assert_eq!(req.method, "POST");
    assert_eq!(req.url, "https://api.openai.com/v1/chat/completions");
    assert_eq!(req.headers["Authorization"], "Bearer sk-test");
    assert_eq!(req.headers["Content-Type"], "application/json");
    assert_eq!(req.timeout_secs, None);

    let body = serde_json::to_value(&req.body).unwrap();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["messages"][0]["role"], "user");
    let content = body["messages"][0]["content"].as_str().unwrap();
    assert!(content.ends_with("ls -la"));
    assert!(content.starts_with("你是一位專業的資安分析師"));
    assert_eq!(body["max_tokens"], 1000);
    assert_eq!(body["temperature"], 0.7);
}

#[test]
fn test_anthropic_request() {
    let req = build_request(&settings(Provider::Anthropic), Task::Regex, "a@b.c").unwrap();
    assert_eq!(req.url, "https://api.anthropic.com/v1/messages");
    assert_eq!(req.headers["x-api-key"], "sk-test");
    assert_eq!(req.headers["anthropic-version"], "2023-06-01");
    assert!(!req.headers.contains_key("Authorization"));
    let body = serde_json::to_value(&req.body).unwrap();
    assert_eq!(body["model"], "claude-3-sonnet-20240229");
    let content = body["messages"][0]["content"].as_str().unwrap();
    assert!(content.contains("正則表達式"));
    assert!(content.ends_with("文本：a@b.c"));
}

#[test]
fn test_gemini_and_grok_endpoints() {
    let req = build_request(&settings(Provider::Gemini), Task::Explain, "x").unwrap();
    assert_eq!(
        req.url,
        "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
    );
    let req = build_request(&settings(Provider::Grok), Task::Explain, "x").unwrap();
    assert_eq!(req.url, "https://api.x.ai/v1/chat/completions");
}

#[test]
fn test_custom_generic_request() {
    let req = build_request(&custom("http://localhost:1234", false), Task::Explain, "x").unwrap();
    assert_eq!(req.url, "http://localhost:1234/v1/completions");
    assert_eq!(req.headers["User-Agent"], "CircleAI-Extension/1.0");
    assert_eq!(req.timeout_secs, Some(CUSTOM_TIMEOUT_SECS));
    let body = serde_json::to_value(&req.body).unwrap();
    assert_eq!(body["model"], "llama3");
    assert!(body.get("messages").is_none());
    assert!(body["prompt"].as_str().unwrap().ends_with('x'));
}

#[test]
fn test_custom_compatible_request() {
    let req = build_request(&custom("http://localhost:11434/v1", true), Task::Regex, "x").unwrap();
    assert_eq!(req.url, "http://localhost:11434/v1/chat/completions");
    assert!(matches!(req.body, RequestBody::Chat { .. }));
}

#[test]
fn test_connection_test_ignores_text() {
    let req = build_request(&settings(Provider::OpenAi), Task::ConnectionTest, "ignored").unwrap();
    let body = serde_json::to_value(&req.body).unwrap();
    let content = body["messages"][0]["content"].as_str().unwrap();
    assert!(content.ends_with("Hello"));
}

#[test]
fn test_build_rejects_invalid_settings() {
    let s = Settings::default();
    assert_eq!(
        build_request(&s, Task::Explain, "x"),
        Err(ConfigError::MissingApiKey)
    );
}

#[test]
fn test_redacted() {
    let req = build_request(&settings(Provider::OpenAi), Task::Explain, "x").unwrap();
    let red = req.redacted();
    assert_eq!(red.headers["Authorization"], "Bearer ***");
    let req = build_request(&settings(Provider::Anthropic), Task::Explain, "x").unwrap();
    assert_eq!(req.redacted().headers["x-api-key"], "***");
}

// ===== RESPONSES =====

#[test]
fn test_chat_response() {
    let body = r#"{"id":"1","choices":[{"index":0,"message":{"role":"assistant","content":"列出檔案"}}]}"#;
    let text = response_text(&settings(Provider::OpenAi), body).unwrap();
    assert_eq!(text, "列出檔案");
}

#[test]
fn test_anthropic_response() {
    let body = r#"{"content":[{"type":"text","text":"^\\w+$"}],"role":"assistant"}"#;
    let parsed = ProviderResponse::parse(&settings(Provider::Anthropic), body).unwrap();
    assert!(matches!(parsed, ProviderResponse::Anthropic(_)));
    assert_eq!(parsed.into_text(Provider::Anthropic).unwrap(), "^\\w+$");
}

#[test]
fn test_anthropic_response_skips_non_text_blocks() {
    let body = r#"{"content":[
        {"type":"tool_use","id":"t1","name":"lookup","input":{},"text":"not this"},
        {"type":"text","text":"this one"}
    ]}"#;
    let text = response_text(&settings(Provider::Anthropic), body).unwrap();
    assert_eq!(text, "this one");

    let body = r#"{"content":[{"type":"tool_use","id":"t1","name":"lookup","input":{}}]}"#;
    let err = response_text(&settings(Provider::Anthropic), body).unwrap_err();
    assert!(matches!(err, ResponseError::Empty { provider: "Anthropic" }));
}

#[test]
fn test_completion_response() {
    let body = r#"{"choices":[{"text":"done"}]}"#;
    assert_eq!(
        response_text(&custom("http://h", false), body).unwrap(),
        "done"
    );
}

#[test]
fn test_shape_is_not_guessed() {
    // A chat-shaped reply from a generic server is rejected, not sniffed.
    let body = r#"{"choices":[{"message":{"content":"hi"}}]}"#;
    let err = response_text(&custom("http://h", false), body).unwrap_err();
    assert!(matches!(err, ResponseError::Malformed { provider: "Custom", .. }));
}

#[test]
fn test_empty_response() {
    let err = response_text(&settings(Provider::Gemini), r#"{"choices":[]}"#).unwrap_err();
    assert!(matches!(err, ResponseError::Empty { provider: "Gemini" }));
    assert_eq!(err.to_string(), "Invalid response from Gemini API: no content");
}

#[test]
fn test_api_error_hosted() {
    let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
    let err = api_error(Provider::OpenAi, 401, "Unauthorized", body);
    assert_eq!(
        err.to_string(),
        "OpenAI API error: 401 - Incorrect API key provided"
    );
    let err = api_error(Provider::Grok, 502, "Bad Gateway", "<html>");
    assert_eq!(err.to_string(), "Grok API error: 502 - Bad Gateway");
}

#[test]
fn test_api_error_custom() {
    let err = api_error(Provider::Custom, 404, "Not Found", r#"{"detail":"no such model"}"#);
    assert_eq!(
        err.to_string(),
        "Custom API error: HTTP 404: Not Found - no such model"
    );
    let err = api_error(Provider::Custom, 500, "Internal Server Error", "");
    assert_eq!(
        err.to_string(),
        "Custom API error: HTTP 500: Internal Server Error"
    );
}

#[test]
fn test_provider_names() {
    assert_eq!(
        serde_json::to_string(&Provider::OpenAi).unwrap(),
        "\"openai\""
    );
    use clap::ValueEnum;
    assert_eq!(
        Provider::from_str("openai", false).unwrap(),
        Provider::OpenAi
    );
    assert_eq!(
        Task::from_str("connection-test", false).unwrap(),
        Task::ConnectionTest
    );
}
