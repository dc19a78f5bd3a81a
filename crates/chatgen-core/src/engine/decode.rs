use chatgen_abi::{DecodeBatch, InferenceEngine, Pos, TokenSampler};
use serde::Serialize;
use tracing::{debug, trace, warn};

use super::utils::lossy;
use crate::stop::{StopSet, scan};
use crate::stream::StreamEmitter;
use crate::utils::debug::dump_bytes;

/// Why the decode loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The sampler produced an end-of-generation token.
    EndOfGeneration,
    /// A stop string occurred; the text is cut at its first occurrence.
    StopSequence,
    MaxTokens,
    ContextFull,
    /// The stream receiver asked to stop.
    Cancelled,
    /// A single-token decode failed; the text is what was produced before it.
    DecodeFailed,
}

/// Result of one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub text: String,
    pub finish_reason: FinishReason,
    pub tokens_generated: usize,
    /// Prompt tokens actually fed, after fitting to the context window.
    pub prompt_tokens: usize,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Limits {
    /// Negative means unbounded.
    pub max_tokens: i32,
    pub n_ctx: usize,
}

impl Limits {
    fn exhausted(&self, generated: usize) -> bool {
        self.max_tokens >= 0 && generated >= self.max_tokens as usize
    }
}

/// Mutable state of one call; dropped when the call returns.
struct GenerationState {
    text: Vec<u8>,
    position: usize,
    generated: usize,
}

/// Sample → append → stop check → (emit) → feed back, until something halts.
///
/// Starts right after a successful prefill of `n_past` tokens, whose last
/// entry carried logits. Never fails: engine trouble mid-loop ends the call
/// with [`FinishReason::DecodeFailed`] and keeps the partial text.
pub(super) fn generate<E>(
    engine: &mut E,
    sampler: &mut E::Sampler,
    stops: &StopSet,
    limits: Limits,
    n_past: usize,
    mut emitter: Option<&mut StreamEmitter<'_>>,
) -> Completion
where
    E: InferenceEngine + ?Sized,
{
    let mut st = GenerationState {
        text: Vec::with_capacity(256),
        position: n_past,
        generated: 0,
    };
    let mut batch = DecodeBatch::new(1);

    let finish = loop {
        if limits.exhausted(st.generated) {
            break FinishReason::MaxTokens;
        }
        if st.position >= limits.n_ctx {
            break FinishReason::ContextFull;
        }

        let token = match engine.output_logits() {
            Ok(logits) => sampler.sample(logits),
            Err(e) => {
                warn!(error = %e, position = st.position, "no distribution to sample from");
                break FinishReason::DecodeFailed;
            }
        };
        sampler.accept(token);

        if engine.is_end_of_generation(token) {
            debug!(%token, "end of generation");
            break FinishReason::EndOfGeneration;
        }

        let piece = engine.token_to_piece(token);
        dump_bytes("piece", &piece);
        st.text.extend_from_slice(&piece);
        st.generated += 1;
        trace!(%token, piece_len = piece.len(), text_len = st.text.len(), "token appended");

        let found = scan(&st.text, stops);
        let mut halt = found.halt.then_some(FinishReason::StopSequence);

        if let Some(em) = emitter.as_deref_mut() {
            if !em.emit(&st.text, found.safe_len) && halt.is_none() {
                halt = Some(FinishReason::Cancelled);
            }
        }

        if let Some(reason) = halt {
            // never cut into bytes the receiver already holds; after a
            // cancellation the text is exactly what was delivered
            let keep = match emitter.as_deref() {
                Some(em) if em.is_cancelled() => em.emitted_len(),
                Some(em) => found.safe_len.max(em.emitted_len()),
                None => found.safe_len,
            };
            st.text.truncate(keep);
            debug!(?reason, kept = keep, "halting");
            break reason;
        }

        batch.clear();
        let fed = batch
            .add(token, st.position as Pos, true)
            .and_then(|()| engine.decode(&batch));
        if let Err(e) = fed {
            warn!(error = %e, position = st.position, "incremental decode failed; keeping partial output");
            break FinishReason::DecodeFailed;
        }
        st.position += 1;
    };

    if let Some(em) = emitter {
        em.finish(&st.text);
    }

    Completion {
        text: lossy(&st.text).into_owned(),
        finish_reason: finish,
        tokens_generated: st.generated,
        prompt_tokens: n_past,
    }
}
