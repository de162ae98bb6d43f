use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::error::ConfigError;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const MAX_TOKENS_LIMIT: u32 = 4096;

/// Seconds a custom endpoint gets before the caller should abort.
pub const CUSTOM_TIMEOUT_SECS: u64 = 30;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const USER_AGENT: &str = "CircleAI-Extension/1.0";

const EXPLAIN_PROMPT: &str =
    "你是一位專業的資安分析師，請用繁體中文簡潔地解釋這個指令或文本的含義和功能（限制在100字以內）：";

const REGEX_PROMPT: &str = "請分析以下文本並生成對應的正則表達式。文本可能包含命令行、文件路徑、URL、電子郵件地址或其他模式。請提供：
1. 匹配該模式的正則表達式
2. 簡短的解釋說明
3. 如果可能，提供一個測試示例

文本：";

/// Text sent when checking that a provider answers at all.
const CONNECTION_TEST_TEXT: &str = "Hello";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[value(name = "openai")]
    OpenAi,
    Gemini,
    Anthropic,
    Grok,
    Custom,
}

impl Provider {
    /// Display name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
            Provider::Anthropic => "Anthropic",
            Provider::Grok => "Grok",
            Provider::Custom => "Custom",
        }
    }

    /// Fixed endpoint; `None` for custom providers.
    pub fn endpoint(self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            // OpenAI compatibility endpoint.
            Provider::Gemini => {
                Some("https://generativelanguage.googleapis.com/v1beta/openai/chat/completions")
            }
            Provider::Anthropic => Some("https://api.anthropic.com/v1/messages"),
            Provider::Grok => Some("https://api.x.ai/v1/chat/completions"),
            Provider::Custom => None,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-3.5-turbo",
            Provider::Gemini => "gemini-2.5-flash",
            Provider::Anthropic => "claude-3-sonnet-20240229",
            Provider::Grok => "grok-beta",
            Provider::Custom => "custom-model",
        }
    }
}

/// What the user asked the model to do with the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Task {
    #[default]
    Explain,
    Regex,
    /// Explain prompt over a fixed greeting, to check credentials.
    ConnectionTest,
}

impl Task {
    pub fn prompt(self, text: &str) -> String {
        match self {
            Task::Explain => format!("{EXPLAIN_PROMPT}{text}"),
            Task::Regex => format!("{REGEX_PROMPT}{text}"),
            Task::ConnectionTest => format!("{EXPLAIN_PROMPT}{CONNECTION_TEST_TEXT}"),
        }
    }
}

/// Provider settings as stored by the settings popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub api_provider: Provider,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub custom_url: Option<String>,
    #[serde(default)]
    pub openai_compatible: bool,
    #[serde(default = "default_temperature", deserialize_with = "lenient_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens", deserialize_with = "lenient_max_tokens")]
    pub max_tokens: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_provider: Provider::default(),
            api_key: String::new(),
            model: None,
            custom_url: None,
            openai_compatible: false,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Form inputs arrive as either JSON numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Num(f64),
    Text(String),
}

fn lenient_temperature<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(match Option::<NumOrText>::deserialize(d)? {
        Some(NumOrText::Num(n)) => n,
        Some(NumOrText::Text(s)) => s.trim().parse().unwrap_or(DEFAULT_TEMPERATURE),
        None => DEFAULT_TEMPERATURE,
    })
}

/// Unparseable or missing values fall back to the default; an explicit 0 is
/// kept and rejected by [`Settings::validate`].
fn lenient_max_tokens<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(match Option::<NumOrText>::deserialize(d)? {
        Some(NumOrText::Num(n)) if n >= 0.0 => n as u32,
        Some(NumOrText::Text(s)) => s.trim().parse().unwrap_or(DEFAULT_MAX_TOKENS),
        _ => DEFAULT_MAX_TOKENS,
    })
}

/// `scheme://host...` with a non-empty scheme and authority.
fn looks_like_url(s: &str) -> bool {
    let Some((scheme, rest)) = s.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    let scheme_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    scheme_ok && !rest.is_empty() && !rest.starts_with('/') && !rest.contains(char::is_whitespace)
}

impl Settings {
    /// Check the settings the same way the settings form does before saving.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.api_provider == Provider::Custom {
            let url = self
                .custom_url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .ok_or(ConfigError::MissingCustomUrl)?;
            if self.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
                return Err(ConfigError::MissingModel);
            }
            if !looks_like_url(url) {
                return Err(ConfigError::InvalidUrl(url.to_string()));
            }
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }
        if !(1..=MAX_TOKENS_LIMIT).contains(&self.max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(self.max_tokens));
        }
        Ok(())
    }

    /// Configured model, or the provider's default.
    pub fn model_or_default(&self) -> &str {
        match self.model.as_deref() {
            Some(m) if !m.trim().is_empty() => m,
            _ => self.api_provider.default_model(),
        }
    }
}

/// Append the endpoint path a custom base URL is missing.
///
/// OpenAI-compatible servers get `/chat/completions`, others `/completions`;
/// `/v1` is inserted unless the base already ends with it.
pub fn complete_custom_url(url: &str, openai_compatible: bool) -> String {
    let suffix = if openai_compatible {
        "/chat/completions"
    } else {
        "/completions"
    };
    if url.ends_with(suffix) || url.strip_suffix('/').is_some_and(|u| u.ends_with(suffix)) {
        return url.to_string();
    }
    let mut full = url.strip_suffix('/').unwrap_or(url).to_string();
    if !full.ends_with("/v1") {
        full.push_str("/v1");
    }
    full.push_str(suffix);
    full
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// JSON body of a provider call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// Chat-style body (OpenAI, Gemini, Grok, Anthropic, compatible servers).
    Chat {
        model: String,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: f64,
    },
    /// Plain completion body for generic servers.
    Completion {
        model: String,
        prompt: String,
        max_tokens: u32,
        temperature: f64,
    },
}

/// An HTTP call ready for whatever transport the caller uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderRequest {
    /// Copy with credentials masked, for printing.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        for (name, value) in out.headers.iter_mut() {
            match name.as_str() {
                "Authorization" => *value = "Bearer ***".to_string(),
                "x-api-key" => *value = "***".to_string(),
                _ => {}
            }
        }
        out
    }
}

/// Shape the request for `task` over `text` under `settings`.
pub fn build_request(
    settings: &Settings,
    task: Task,
    text: &str,
) -> Result<ProviderRequest, ConfigError> {
    settings.validate()?;

    let provider = settings.api_provider;
    let model = settings.model_or_default().to_string();
    let prompt = task.prompt(text);

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    let url = match provider.endpoint() {
        Some(url) => url.to_string(),
        None => {
            let base = settings
                .custom_url
                .as_deref()
                .ok_or(ConfigError::MissingCustomUrl)?;
            complete_custom_url(base.trim(), settings.openai_compatible)
        }
    };

    if provider == Provider::Anthropic {
        headers.insert("x-api-key".to_string(), settings.api_key.clone());
        headers.insert(
            "anthropic-version".to_string(),
            ANTHROPIC_VERSION.to_string(),
        );
    } else {
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", settings.api_key),
        );
    }

    let generic = provider == Provider::Custom && !settings.openai_compatible;
    let body = if generic {
        RequestBody::Completion {
            model,
            prompt,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    } else {
        RequestBody::Chat {
            model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    };

    let timeout_secs = if provider == Provider::Custom {
        headers.insert("User-Agent".to_string(), USER_AGENT.to_string());
        Some(CUSTOM_TIMEOUT_SECS)
    } else {
        None
    };

    debug!(provider = provider.name(), ?task, %url, "built provider request");
    Ok(ProviderRequest {
        method: "POST",
        url,
        headers,
        body,
        timeout_secs,
    })
}
