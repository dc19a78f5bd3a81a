//! chatgen core: streaming chat-completion orchestration over an
//! [`InferenceEngine`](chatgen_abi::InferenceEngine).
//!
//! messages → prompt (rich, then plain) → tokens → fit to context →
//! chunked prefill → sample/stop/emit loop → [`Completion`].

pub mod config;
pub mod engine;
pub mod error;
pub mod fit;
pub mod format;
pub mod handle;
pub mod request;
pub mod stop;
pub mod stream;
pub mod wire;

mod utils;

pub use config::GenerationConfig;
pub use engine::{ChatEngine, Completion, FinishReason, prefill_chunked};
pub use error::{GenerationError, Result};
pub use fit::fit_to_context;
pub use format::{FormattedPrompt, JinjaTemplate, build_prompt, with_system_prompt};
pub use handle::EngineHandle;
pub use request::{ChatOptions, PromptRequest};
pub use stop::{StopScan, StopSet, scan as scan_stops};
pub use stream::{Cancellable, StopHandle, StreamEmitter, StreamSink};
pub use wire::{join_stop_blob, parse_messages_json, split_stop_blob};

pub use chatgen_abi as abi;
