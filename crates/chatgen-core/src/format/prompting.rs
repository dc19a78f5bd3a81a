//! Prompt building with a rich → plain render fallback.

use chatgen_abi::{ChatMessage, ChatTemplate, RenderMode};
use tracing::{debug, warn};

use crate::error::{GenerationError, Result};
use crate::format::FormattedPrompt;

/// Render `messages` and merge the template's stops with `extra_stops`.
///
/// The rich render is tried first; on any failure the plain render is tried
/// once. Only when both fail does the call fail.
pub fn build_prompt<T, I, S>(
    template: &T,
    messages: &[ChatMessage],
    extra_stops: I,
) -> Result<FormattedPrompt>
where
    T: ChatTemplate + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    if messages.is_empty() {
        return Err(GenerationError::invalid_input("message list is empty"));
    }

    let (rendered, mode) = match template.render(messages, RenderMode::Rich) {
        Ok(r) => (r, RenderMode::Rich),
        Err(rich) => {
            warn!(error = %rich, "rich template render failed; retrying in plain mode");
            match template.render(messages, RenderMode::Plain) {
                Ok(r) => (r, RenderMode::Plain),
                Err(plain) => return Err(GenerationError::Render { rich, plain }),
            }
        }
    };

    let mut prompt = FormattedPrompt::new(rendered.prompt, mode);
    prompt.stops.extend(rendered.additional_stops);
    prompt.stops.extend(extra_stops);

    debug!(
        mode = ?prompt.mode,
        prompt_bytes = prompt.text.len(),
        stops = prompt.stops.len(),
        "prompt rendered"
    );
    Ok(prompt)
}

/// Prepend `system` unless the conversation already opens with a system turn.
pub fn with_system_prompt(messages: &[ChatMessage], system: Option<&str>) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    let opens_with_system = messages
        .first()
        .is_some_and(|m| m.role == chatgen_abi::Role::System);
    if !opens_with_system {
        if let Some(sys) = system {
            out.push(ChatMessage::system(sys));
        }
    }
    out.extend_from_slice(messages);
    out
}
