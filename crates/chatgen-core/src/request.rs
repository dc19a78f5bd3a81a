use chatgen_abi::{ChatMessage, SamplingParams};
use serde::{Deserialize, Serialize};

/// Caller-facing options. Zero/unset numeric fields fall back to defaults
/// through [`ChatOptions::normalized`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatOptions {
    pub max_tokens: i32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: i32,
    pub repeat_penalty: f32,
    pub stop: Vec<String>,
}

impl ChatOptions {
    /// Fill unset fields: max_tokens ≤ 0 → 512, temperature 0 → 0.7,
    /// top_p 0 → 0.95, top_k 0 → 40, repeat_penalty 0 → 1.1.
    pub fn normalized(&self) -> Self {
        let d = SamplingParams::default();
        let mut o = self.clone();
        if o.max_tokens <= 0 {
            o.max_tokens = d.max_tokens;
        }
        if o.temperature == 0.0 {
            o.temperature = d.temperature;
        }
        if o.top_p == 0.0 {
            o.top_p = d.top_p;
        }
        if o.top_k == 0 {
            o.top_k = d.top_k;
        }
        if o.repeat_penalty == 0.0 {
            o.repeat_penalty = d.repeat_penalty;
        }
        o
    }

    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            repeat_penalty: self.repeat_penalty,
        }
    }
}

/// Everything one generation call needs. Immutable for the call's duration.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub messages: Vec<ChatMessage>,
    pub extra_stop_strings: Vec<String>,
    pub sampling: SamplingParams,
}

impl PromptRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            extra_stop_strings: Vec::new(),
            sampling: SamplingParams::default(),
        }
    }

    /// Build from caller options, defaulting unset fields.
    pub fn with_options(messages: Vec<ChatMessage>, options: &ChatOptions) -> Self {
        let o = options.normalized();
        Self {
            messages,
            sampling: o.sampling(),
            extra_stop_strings: o.stop,
        }
    }

    pub fn stop<S: Into<String>>(mut self, stop: S) -> Self {
        self.extra_stop_strings.push(stop.into());
        self
    }

    pub fn max_tokens(mut self, n: i32) -> Self {
        self.sampling.max_tokens = n;
        self
    }
}
