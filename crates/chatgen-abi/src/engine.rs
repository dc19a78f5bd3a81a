use thiserror::Error;

use crate::params::LoadParams;
use crate::sampling::SamplingParams;
use crate::token::{PRIMARY_SEQ, Pos, SeqId, Token};

/// Failure reported by an engine call. Carries the engine's own message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineFault {
    #[error("engine load failed: {0}")]
    Load(String),

    #[error("tokenization failed: {0}")]
    Tokenize(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("batch full: capacity {capacity}")]
    BatchFull { capacity: usize },

    #[error("no output distribution available: {0}")]
    NoLogits(String),

    #[error("sampler init failed: {0}")]
    Sampler(String),
}

/// One entry of a decode batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchEntry {
    pub token: Token,
    pub pos: Pos,
    pub seq_id: SeqId,
    /// Whether the engine should compute an output distribution for this entry.
    pub logits: bool,
}

/// Capacity-bounded token buffer handed to [`InferenceEngine::decode`].
///
/// Entries are appended in order on the primary sequence; the buffer is
/// reused across calls via [`DecodeBatch::clear`].
#[derive(Debug, Clone)]
pub struct DecodeBatch {
    entries: Vec<BatchEntry>,
    capacity: usize,
}

impl DecodeBatch {
    /// Create a batch that accepts up to `capacity` tokens.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one token at `pos`. Rejected once the batch is at capacity.
    pub fn add(&mut self, token: Token, pos: Pos, logits: bool) -> Result<(), EngineFault> {
        if self.entries.len() >= self.capacity {
            return Err(EngineFault::BatchFull {
                capacity: self.capacity,
            });
        }
        self.entries.push(BatchEntry {
            token,
            pos,
            seq_id: PRIMARY_SEQ,
            logits,
        });
        Ok(())
    }

    /// Ensure only the last entry requests an output distribution.
    pub fn mark_last_for_logits(&mut self) {
        let n = self.entries.len();
        for (i, e) in self.entries.iter_mut().enumerate() {
            e.logits = i + 1 == n;
        }
    }

    /// Drop all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter()
    }
}

/// Picks the next token from an output distribution.
///
/// The sampling algorithm (temperature, top-k, top-p, penalties) lives entirely
/// behind this trait. `accept` feeds the chosen token back so history-dependent
/// corrections see it.
pub trait TokenSampler {
    fn sample(&mut self, logits: &[f32]) -> Token;

    fn accept(&mut self, token: Token);
}

impl<S: TokenSampler + ?Sized> TokenSampler for Box<S> {
    fn sample(&mut self, logits: &[f32]) -> Token {
        (**self).sample(logits)
    }

    fn accept(&mut self, token: Token) {
        (**self).accept(token)
    }
}

/// Model-agnostic interface over one loaded model + one inference context.
///
/// Owned by the caller; generation only borrows it. A context supports one
/// in-flight generation at a time.
pub trait InferenceEngine {
    type Sampler: TokenSampler;

    /// Tokenize `text`; `add_special` prepends BOS and parses special tokens.
    fn tokenize(&self, text: &str, add_special: bool) -> Result<Vec<Token>, EngineFault>;

    /// Run one engine call over the whole batch.
    fn decode(&mut self, batch: &DecodeBatch) -> Result<(), EngineFault>;

    /// Distribution for the last logits-flagged entry of the last decoded batch.
    fn output_logits(&self) -> Result<&[f32], EngineFault>;

    /// Raw bytes of one token. May be a partial UTF-8 sequence.
    fn token_to_piece(&self, token: Token) -> Vec<u8>;

    /// End-of-generation marker (EOS, EOT, ...).
    fn is_end_of_generation(&self, token: Token) -> bool;

    /// Active context window (n_ctx).
    fn context_capacity(&self) -> usize;

    /// Per-call batch ceiling (n_batch).
    fn batch_capacity(&self) -> usize;

    /// Drop cached conversational memory for `seq_id` while keeping the model loaded.
    fn clear_sequence(&mut self, seq_id: SeqId);

    /// Build a fresh sampler for one generation call.
    fn new_sampler(&self, params: &SamplingParams) -> Result<Self::Sampler, EngineFault>;

    /// Native chat template shipped with the model, if any.
    fn chat_template_source(&self) -> Option<String> {
        None
    }

    /// Begin-of-sequence text as the template should see it.
    fn bos_text(&self) -> String {
        String::new()
    }

    /// End-of-sequence text as the template should see it.
    fn eos_text(&self) -> String {
        String::new()
    }
}

/// Engines that can bring themselves up from [`LoadParams`]. Dropping frees them.
pub trait EngineLoader: InferenceEngine + Sized {
    fn load(params: &LoadParams) -> Result<Self, EngineFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_rejects_tokens_past_capacity() {
        let mut b = DecodeBatch::new(2);
        b.add(Token(1), 0, false).unwrap();
        b.add(Token(2), 1, false).unwrap();
        assert_eq!(
            b.add(Token(3), 2, false),
            Err(EngineFault::BatchFull { capacity: 2 })
        );
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn mark_last_leaves_single_logits_flag() {
        let mut b = DecodeBatch::new(4);
        for i in 0..3 {
            b.add(Token(i), i, true).unwrap();
        }
        b.mark_last_for_logits();
        let flags: Vec<bool> = b.iter().map(|e| e.logits).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut b = DecodeBatch::new(3);
        b.add(Token(7), 0, true).unwrap();
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), 3);
        assert_eq!(b.entries()[..].len(), 0);
    }
}
