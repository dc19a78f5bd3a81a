//! Fit a prompt into a fixed context window.

use chatgen_abi::Token;
use tracing::debug;

use crate::error::{GenerationError, Result};

/// Trim `tokens` to at most `capacity` entries.
///
/// Sequences that already fit come back unchanged. Otherwise the first token
/// (the BOS anchor) is kept together with the most recent `capacity - 1`
/// tokens and the middle is dropped.
pub fn fit_to_context(mut tokens: Vec<Token>, capacity: usize) -> Result<Vec<Token>> {
    if capacity == 0 {
        return Err(GenerationError::config("context capacity is zero"));
    }
    if tokens.len() <= capacity {
        return Ok(tokens);
    }

    let original = tokens.len();
    let tail_start = original - (capacity - 1);
    // anchor stays at index 0; the tail slides down right after it
    tokens.drain(1..tail_start);

    debug!(
        original,
        capacity,
        dropped = original - tokens.len(),
        "prompt trimmed to fit context"
    );
    Ok(tokens)
}
