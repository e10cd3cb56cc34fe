use axum::http::StatusCode;

/// Provider failure categories surfaced to users instead of raw provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    InvalidApiKey,
    RateLimited,
    InsufficientQuota,
    ServerError,
    InvalidModel,
    Unknown,
}

impl ProviderFailure {
    /// Classifies a provider error from its HTTP status (if any) and message.
    /// Quota is checked before rate limiting: providers report exhausted credit as a 429.
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("insufficient_quota") || lower.contains("billing") {
            return ProviderFailure::InsufficientQuota;
        }
        if status == Some(401)
            || lower.contains("invalid_api_key")
            || lower.contains("incorrect api key")
        {
            return ProviderFailure::InvalidApiKey;
        }
        if status == Some(429) || lower.contains("rate_limit") {
            return ProviderFailure::RateLimited;
        }
        if lower.contains("model")
            && (lower.contains("not found")
                || lower.contains("does not exist")
                || lower.contains("invalid"))
        {
            return ProviderFailure::InvalidModel;
        }
        if status.is_some_and(|s| s >= 500) || lower.contains("internal_error") {
            return ProviderFailure::ServerError;
        }
        ProviderFailure::Unknown
    }

    pub fn status(self) -> StatusCode {
        match self {
            ProviderFailure::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ProviderFailure::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProviderFailure::InsufficientQuota => StatusCode::PAYMENT_REQUIRED,
            ProviderFailure::InvalidModel => StatusCode::BAD_REQUEST,
            ProviderFailure::ServerError | ProviderFailure::Unknown => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ProviderFailure::InvalidApiKey => "INVALID_API_KEY",
            ProviderFailure::RateLimited => "RATE_LIMITED",
            ProviderFailure::InsufficientQuota => "INSUFFICIENT_QUOTA",
            ProviderFailure::ServerError => "PROVIDER_SERVER_ERROR",
            ProviderFailure::InvalidModel => "INVALID_MODEL",
            ProviderFailure::Unknown => "LLM_ERROR",
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            ProviderFailure::InvalidApiKey => {
                "Invalid API key. Check that the full key was copied, or create a new one \
                 at https://platform.openai.com/account/api-keys"
            }
            ProviderFailure::RateLimited => {
                "Rate limit exceeded. Too many requests were made; wait a moment and try again."
            }
            ProviderFailure::InsufficientQuota => {
                "Insufficient credits. The provider account has no credit left; add credits \
                 at https://platform.openai.com/account/billing"
            }
            ProviderFailure::ServerError => {
                "The AI provider is having trouble. Try again in a few moments."
            }
            ProviderFailure::InvalidModel => {
                "The selected model is not available. Choose another model."
            }
            ProviderFailure::Unknown => "An error occurred while calling the AI provider.",
        }
    }
}
