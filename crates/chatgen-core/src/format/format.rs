//! Prompt carrier handed from the builder to tokenization and the decode loop.

use chatgen_abi::RenderMode;

use crate::stop::StopSet;

#[derive(Debug, Clone)]
pub struct FormattedPrompt {
    pub text: String,
    /// Template defaults merged with caller-supplied stops.
    pub stops: StopSet,
    /// Which render attempt produced `text`.
    pub mode: RenderMode,
}

impl FormattedPrompt {
    pub fn new<T: Into<String>>(text: T, mode: RenderMode) -> Self {
        Self {
            text: text.into(),
            stops: StopSet::new(),
            mode,
        }
    }

    /// True when the rich render failed and the plain fallback was used.
    pub fn is_fallback(&self) -> bool {
        self.mode == RenderMode::Plain
    }
}
