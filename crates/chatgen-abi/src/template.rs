//! Prompt-template renderer contract.

use thiserror::Error;

use crate::chat::ChatMessage;

/// How much of the template language a render attempt may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Full template-expression evaluation of the model's own chat template.
    Rich,
    /// Literal concatenation with role markers; no expression evaluation.
    Plain,
}

/// A rendered conversation, ready for tokenization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub prompt: String,
    /// Stop strings the template implies (end-of-turn markers and the like).
    pub additional_stops: Vec<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct RenderFailure(pub String);

impl RenderFailure {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

/// Renders a message list into a single prompt string.
///
/// Each call is one attempt in one mode; callers decide whether to retry in
/// another mode.
pub trait ChatTemplate {
    fn render(
        &self,
        messages: &[ChatMessage],
        mode: RenderMode,
    ) -> Result<RenderedPrompt, RenderFailure>;
}

impl<T: ChatTemplate + ?Sized> ChatTemplate for &T {
    fn render(
        &self,
        messages: &[ChatMessage],
        mode: RenderMode,
    ) -> Result<RenderedPrompt, RenderFailure> {
        (**self).render(messages, mode)
    }
}
