use chatgen_abi::{DecodeBatch, InferenceEngine, Pos, Token};
use tracing::debug;

use crate::error::{GenerationError, Result};

/// Feed `tokens` to the engine in chunks of at most `batch_size`.
///
/// Positions run contiguously from 0. Only the final token of the final chunk
/// asks for an output distribution. Returns the number of positions filled.
/// A failed chunk aborts the whole prefill; the engine's sequence memory is
/// then unusable until cleared.
pub fn prefill_chunked<E>(engine: &mut E, tokens: &[Token], batch_size: usize) -> Result<usize>
where
    E: InferenceEngine + ?Sized,
{
    if tokens.is_empty() {
        return Err(GenerationError::invalid_input("nothing to prefill"));
    }
    if batch_size == 0 {
        return Err(GenerationError::config("prefill batch size is zero"));
    }

    let n_chunks = tokens.len().div_ceil(batch_size);
    let mut batch = DecodeBatch::new(batch_size);
    let mut n_past = 0usize;

    for (i, chunk) in tokens.chunks(batch_size).enumerate() {
        batch.clear();
        for &token in chunk {
            batch.add(token, n_past as Pos, false)?;
            n_past += 1;
        }
        let last = i + 1 == n_chunks;
        if last {
            batch.mark_last_for_logits();
        }

        debug!(chunk = i, len = chunk.len(), n_past, last, "prefill chunk");
        engine.decode(&batch)?;
    }

    Ok(n_past)
}
