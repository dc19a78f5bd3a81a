//! Owned engine resource: load once, generate many times, release on drop.

use chatgen_abi::{EngineLoader, LoadParams, PRIMARY_SEQ};
use tracing::info;

use crate::config::GenerationConfig;
use crate::engine::{ChatEngine, Completion};
use crate::error::Result;
use crate::format::JinjaTemplate;
use crate::request::PromptRequest;
use crate::stream::StreamSink;

/// A loaded engine together with the chat template it ships.
///
/// Generation calls borrow the handle mutably, so a context never sees two
/// concurrent generations.
pub struct EngineHandle<E: EngineLoader> {
    engine: E,
    template: JinjaTemplate,
    config: GenerationConfig,
}

impl<E: EngineLoader> EngineHandle<E> {
    /// Load the engine and pick up its native chat template.
    pub fn open(params: &LoadParams) -> Result<Self> {
        info!(
            model = %params.model_path.display(),
            n_ctx = params.n_ctx,
            n_batch = params.n_batch,
            n_threads = params.effective_threads(),
            n_gpu_layers = params.n_gpu_layers,
            "loading engine"
        );
        let engine = E::load(params)?;
        Ok(Self::from_engine(engine))
    }

    /// Wrap an engine that was loaded elsewhere.
    pub fn from_engine(engine: E) -> Self {
        let template = JinjaTemplate::from_engine(&engine);
        info!(
            n_ctx = engine.context_capacity(),
            n_batch = engine.batch_capacity(),
            native_template = template.has_native_source(),
            "engine ready"
        );
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

    pub fn template(&self) -> &JinjaTemplate {
        &self.template
    }

    /// Borrow the engine for direct calls between generations.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Drop conversational memory, e.g. after a failed generation.
    pub fn reset(&mut self) {
        self.engine.clear_sequence(PRIMARY_SEQ);
    }

    /// Generation facade over this handle's engine and template.
    pub fn session(&mut self) -> ChatEngine<'_, E> {
        ChatEngine::new(&mut self.engine, &self.template).with_config(self.config.clone())
    }

    pub fn chat(&mut self, request: &PromptRequest) -> Result<Completion> {
        self.session().chat(request)
    }

    pub fn chat_stream(
        &mut self,
        request: &PromptRequest,
        sink: &mut dyn StreamSink,
    ) -> Result<Completion> {
        self.session().chat_stream(request, sink)
    }

    /// Release the engine now instead of at end of scope.
    pub fn close(self) {
        drop(self);
    }
}

impl<E: EngineLoader> Drop for EngineHandle<E> {
    fn drop(&mut self) {
        info!("engine released");
    }
}
