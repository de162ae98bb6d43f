use thiserror::Error;

/// Settings that cannot produce a request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("API key not configured. Please set it in the extension popup.")]
    MissingApiKey,
    #[error("API URL is required for custom provider")]
    MissingCustomUrl,
    #[error("Model name is required for custom provider")]
    MissingModel,
    #[error("Invalid API URL format: {0}")]
    InvalidUrl(String),
    #[error("Temperature must be between 0 and 1 (got {0})")]
    InvalidTemperature(f64),
    #[error("Max tokens must be between 1 and 4096 (got {0})")]
    InvalidMaxTokens(u32),
}

/// A provider reply that could not be turned into text.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("Invalid response from {provider} API: {source}")]
    Malformed {
        provider: &'static str,
        source: serde_json::Error,
    },
    #[error("Invalid response from {provider} API: no content")]
    Empty { provider: &'static str },
    /// Non-success HTTP status, already rendered for display.
    #[error("{0}")]
    Api(String),
}
