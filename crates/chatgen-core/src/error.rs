use chatgen_abi::{EngineFault, RenderFailure};
use thiserror::Error;

/// Failures of one generation call. None of them leave the engine unusable;
/// after an `Engine` error the caller clears sequence memory before reuse.
///
/// Caller-requested cancellation is not an error: it surfaces as
/// [`crate::FinishReason::Cancelled`].
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Empty or malformed chat-message input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Both the rich and the plain rendering attempt failed.
    #[error("prompt rendering failed (rich: {rich}; plain: {plain})")]
    Render {
        rich: RenderFailure,
        plain: RenderFailure,
    },

    /// Zero or otherwise unusable context/batch capacity.
    #[error("configuration error: {0}")]
    Config(String),

    /// Tokenize, prefill or sampler setup failed inside the engine.
    #[error("engine error: {0}")]
    Engine(#[from] EngineFault),
}

impl GenerationError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(e: serde_json::Error) -> Self {
        GenerationError::InvalidInput(format!("chat messages: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
