//! Orchestration settings: file/JSON config with environment overrides.

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Knobs that apply to every generation call made through a [`crate::ChatEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Injected as the first turn unless the conversation already has one.
    pub system_prompt: Option<String>,
    /// Prefill chunk size. Clamped to the engine's batch capacity.
    pub batch_size: Option<usize>,
    /// Hard ceiling applied on top of each request's `max_tokens`.
    pub max_tokens_cap: Option<i32>,
}

impl GenerationConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| GenerationError::config(format!("generation config: {e}")))
    }

    /// Apply `CHATGEN_SYSTEM_PROMPT`, `CHATGEN_BATCH_SIZE` and
    /// `CHATGEN_MAX_DECODE_TOKENS` where set. Unparseable numbers are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(sys) = std::env::var("CHATGEN_SYSTEM_PROMPT") {
            if !sys.trim().is_empty() {
                self.system_prompt = Some(sys);
            }
        }
        if let Some(n) = env_parse::<usize>("CHATGEN_BATCH_SIZE") {
            self.batch_size = Some(n);
        }
        if let Some(n) = env_parse::<i32>("CHATGEN_MAX_DECODE_TOKENS") {
            self.max_tokens_cap = Some(n.max(0));
        }
        self
    }

    /// Chunk size for prefill given the engine's per-call ceiling.
    pub fn effective_batch_size(&self, engine_batch_capacity: usize) -> Result<usize> {
        let size = match self.batch_size {
            Some(n) => n.min(engine_batch_capacity),
            None => engine_batch_capacity,
        };
        if size == 0 {
            return Err(GenerationError::config("prefill batch size is zero"));
        }
        Ok(size)
    }

    /// Request limit after applying the cap. An unbounded request (negative)
    /// becomes the cap itself.
    pub fn effective_max_tokens(&self, requested: i32) -> i32 {
        match self.max_tokens_cap {
            Some(cap) if requested < 0 => cap,
            Some(cap) => requested.min(cap),
            None => requested,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
