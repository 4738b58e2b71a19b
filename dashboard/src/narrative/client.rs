//! @ai:module:intent Text-generation client contract and error classification
//! @ai:module:layer infrastructure
//! @ai:module:public_api TextGenerator, GenerationError, MockTextGenerator

use thiserror::Error;

/// @ai:intent Failure of a single text-generation call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("API error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Response contained no text")]
    EmptyResponse,
}

impl GenerationError {
    /// @ai:intent True for HTTP 429 or any message mentioning a quota
    /// @ai:effects pure
    pub fn is_rate_limit(&self) -> bool {
        match self {
            GenerationError::Http { status, message } => {
                *status == 429 || mentions_quota(message)
            }
            GenerationError::Transport(message) => mentions_quota(message),
            GenerationError::EmptyResponse => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GenerationError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn mentions_quota(message: &str) -> bool {
    message.to_lowercase().contains("quota")
}

/// @ai:intent Trait for a remote text-generation service
#[allow(async_fn_in_trait)]
pub trait TextGenerator: Send + Sync {
    /// @ai:intent Generate text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// @ai:intent Generator that always returns the same text
pub struct MockTextGenerator {
    response: String,
}

impl MockTextGenerator {
    /// @ai:intent Create a mock generator that returns a fixed response
    /// @ai:effects pure
    pub fn new(response: String) -> Self {
        Self { response }
    }
}

impl TextGenerator for MockTextGenerator {
    /// @ai:effects pure
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Ok(self.response.clone())
    }
}
