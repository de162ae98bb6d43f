//! Provider replies as tagged variants, normalized to text at the boundary.

use serde::Deserialize;

use super::core::{Provider, Settings};
use super::error::ResponseError;

/// `choices[].message.content` replies (OpenAI, Gemini, Grok, compatible servers).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatChoice {
    pub message: ChatReply,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub content: Option<String>,
}

/// Anthropic Messages API reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnthropicMessage {
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// `choices[].text` replies from plain completion servers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextCompletion {
    pub choices: Vec<TextChoice>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextChoice {
    pub text: String,
}

/// Which reply shape a provider speaks. Chosen from configuration, never
/// guessed from the reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Chat,
    Anthropic,
    Completion,
}

impl ResponseShape {
    pub fn for_provider(provider: Provider, openai_compatible: bool) -> Self {
        match provider {
            Provider::Anthropic => ResponseShape::Anthropic,
            Provider::Custom if !openai_compatible => ResponseShape::Completion,
            _ => ResponseShape::Chat,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    Chat(ChatCompletion),
    Anthropic(AnthropicMessage),
    Completion(TextCompletion),
}

impl ProviderResponse {
    /// Parse a reply body according to `settings`.
    pub fn parse(settings: &Settings, body: &str) -> Result<Self, ResponseError> {
        let provider = settings.api_provider;
        let shape = ResponseShape::for_provider(provider, settings.openai_compatible);
        let malformed = |source| ResponseError::Malformed {
            provider: provider.name(),
            source,
        };
        Ok(match shape {
            ResponseShape::Chat => {
                ProviderResponse::Chat(serde_json::from_str(body).map_err(malformed)?)
            }
            ResponseShape::Anthropic => {
                ProviderResponse::Anthropic(serde_json::from_str(body).map_err(malformed)?)
            }
            ResponseShape::Completion => {
                ProviderResponse::Completion(serde_json::from_str(body).map_err(malformed)?)
            }
        })
    }

    /// The reply text: first choice, or the first `text` block for Anthropic.
    pub fn into_text(self, provider: Provider) -> Result<String, ResponseError> {
        let text = match self {
            ProviderResponse::Chat(c) => c.choices.into_iter().next().and_then(|c| c.message.content),
            ProviderResponse::Anthropic(m) => m
                .content
                .into_iter()
                .filter(|b| b.kind.as_deref() == Some("text"))
                .find_map(|b| b.text),
            ProviderResponse::Completion(c) => c.choices.into_iter().next().map(|c| c.text),
        };
        text.ok_or(ResponseError::Empty {
            provider: provider.name(),
        })
    }
}

/// Parse and normalize a successful reply in one step.
pub fn response_text(settings: &Settings, body: &str) -> Result<String, ResponseError> {
    ProviderResponse::parse(settings, body)?.into_text(settings.api_provider)
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Render a non-success HTTP reply.
///
/// Hosted providers report `error.message` (or the status reason); custom
/// servers also get `message` and `detail` checked, after the status line.
pub fn api_error(provider: Provider, status: u16, reason: &str, body: &str) -> ResponseError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let nested = parsed.error.and_then(|e| e.message);

    let message = if provider == Provider::Custom {
        let mut msg = format!("HTTP {status}: {reason}");
        if let Some(detail) = nested.or(parsed.message).or(parsed.detail) {
            msg.push_str(" - ");
            msg.push_str(&detail);
        }
        format!("Custom API error: {msg}")
    } else {
        let detail = nested.unwrap_or_else(|| reason.to_string());
        format!("{} API error: {status} - {detail}", provider.name())
    };
    ResponseError::Api(message)
}
