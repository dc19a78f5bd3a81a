//! chatgen engine: one generation call over a borrowed inference engine.

use std::time::Instant;

use chatgen_abi::{ChatTemplate, InferenceEngine, PRIMARY_SEQ, SamplingParams};
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::{GenerationError, Result};
use crate::fit::fit_to_context;
use crate::format::{build_prompt, with_system_prompt};
use crate::request::PromptRequest;
use crate::stream::{StreamEmitter, StreamSink};

mod decode;
mod prefill;
pub(crate) mod utils;

pub use decode::{Completion, FinishReason};
pub use prefill::prefill_chunked;

/// Generation facade = {borrowed engine} + {chat template} + {config}.
///
/// Holds the engine exclusively for its lifetime, so at most one generation
/// runs on a context at a time.
pub struct ChatEngine<'e, E: InferenceEngine> {
    engine: &'e mut E,
    template: &'e dyn ChatTemplate,
    config: GenerationConfig,
}

impl<'e, E: InferenceEngine> ChatEngine<'e, E> {
    pub fn new(engine: &'e mut E, template: &'e dyn ChatTemplate) -> Self {
        Self {
            engine,
            template,
            config: GenerationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate the full reply and return it once the loop halts.
    pub fn chat(&mut self, request: &PromptRequest) -> Result<Completion> {
        self.run(request, None)
    }

    /// Generate while pushing safe deltas into `sink`. A `false` from the sink
    /// ends generation with [`FinishReason::Cancelled`].
    pub fn chat_stream(
        &mut self,
        request: &PromptRequest,
        sink: &mut dyn StreamSink,
    ) -> Result<Completion> {
        self.run(request, Some(sink))
    }

    fn run(
        &mut self,
        request: &PromptRequest,
        sink: Option<&mut dyn StreamSink>,
    ) -> Result<Completion> {
        let started = Instant::now();

        let messages = with_system_prompt(&request.messages, self.config.system_prompt.as_deref());
        let prompt = build_prompt(
            self.template,
            &messages,
            request.extra_stop_strings.iter().cloned(),
        )?;

        let tokens = self.engine.tokenize(&prompt.text, true)?;
        if tokens.is_empty() {
            return Err(GenerationError::invalid_input("prompt produced no tokens"));
        }
        let n_ctx = self.engine.context_capacity();
        let tokens = fit_to_context(tokens, n_ctx)?;
        let batch_size = self
            .config
            .effective_batch_size(self.engine.batch_capacity())?;

        let sampling = SamplingParams {
            max_tokens: self.config.effective_max_tokens(request.sampling.max_tokens),
            ..request.sampling.normalized()
        };
        let mut sampler = self.engine.new_sampler(&sampling)?;

        info!(
            messages = messages.len(),
            prompt_tokens = tokens.len(),
            n_ctx,
            batch_size,
            max_tokens = sampling.max_tokens,
            streaming = sink.is_some(),
            "generation start"
        );

        self.engine.clear_sequence(PRIMARY_SEQ);
        let n_past = prefill_chunked(&mut *self.engine, &tokens, batch_size)?;
        debug!(n_past, "prefill complete");

        let mut emitter = sink.map(StreamEmitter::new);
        let completion = decode::generate(
            &mut *self.engine,
            &mut sampler,
            &prompt.stops,
            decode::Limits {
                max_tokens: sampling.max_tokens,
                n_ctx,
            },
            n_past,
            emitter.as_mut(),
        );

        info!(
            finish = ?completion.finish_reason,
            tokens = completion.tokens_generated,
            bytes = completion.text.len(),
            deltas = emitter.as_ref().map_or(0, StreamEmitter::deltas),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation finished"
        );
        Ok(completion)
    }
}
