mod core;
mod error;
mod response;

#[cfg(test)]
mod tests;

pub use self::core::{
    CUSTOM_TIMEOUT_SECS, ChatMessage, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, MAX_TOKENS_LIMIT,
    Provider, ProviderRequest, RequestBody, Settings, Task, build_request, complete_custom_url,
};
pub use self::error::{ConfigError, ResponseError};
pub use self::response::{
    AnthropicMessage, ChatCompletion, ProviderResponse, ResponseShape, TextCompletion, api_error,
    response_text,
};
