//! Scripted engine for driving the orchestration layer without a model.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use chatgen_abi::{
    BatchEntry, DecodeBatch, EngineFault, EngineLoader, InferenceEngine, LoadParams,
    SamplingParams, SeqId, Token, TokenSampler,
};

pub const BOS: Token = Token(1);
pub const EOG: Token = Token(2);

/// Ids at or above this are generated tokens; `id - FIRST_GENERATED` indexes the script.
const FIRST_GENERATED: i32 = 1000;

/// Engine that "generates" a fixed list of pieces, then end-of-generation.
///
/// The distribution after each decode is one-hot on the next scripted token,
/// so an argmax sampler replays the script exactly.
pub struct MockEngine {
    pub script: Vec<Vec<u8>>,
    pub n_ctx: usize,
    pub n_batch: usize,
    /// Tokenize to exactly this many tokens (BOS included) instead of one per byte.
    pub prompt_len: Option<usize>,
    /// Fail the decode call with this zero-based index.
    pub fail_decode_at: Option<usize>,
    pub fail_tokenize: bool,
    pub fail_sampler: bool,
    pub template_source: Option<String>,

    pub batches: Vec<Vec<BatchEntry>>,
    pub cleared: Vec<SeqId>,
    pub accepted: Rc<RefCell<Vec<Token>>>,
    pub last_prompt: RefCell<Option<String>>,
    fed_generated: usize,
    logits: Vec<f32>,
}

impl MockEngine {
    pub fn new<I, P>(pieces: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Self {
            script: pieces.into_iter().map(|p| p.as_ref().to_vec()).collect(),
            n_ctx: 4096,
            n_batch: 512,
            prompt_len: None,
            fail_decode_at: None,
            fail_tokenize: false,
            fail_sampler: false,
            template_source: None,
            batches: Vec::new(),
            cleared: Vec::new(),
            accepted: Rc::new(RefCell::new(Vec::new())),
            last_prompt: RefCell::new(None),
            fed_generated: 0,
            logits: Vec::new(),
        }
    }

    pub fn decode_calls(&self) -> usize {
        self.batches.len()
    }

    /// Decode calls that fed generated tokens back (everything after prefill).
    pub fn feedback_calls(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.iter().all(|e| e.token.id() >= FIRST_GENERATED))
            .count()
    }

    /// Every token handed to the engine during prefill, in order.
    pub fn prefilled(&self) -> Vec<Token> {
        self.batches
            .iter()
            .flatten()
            .filter(|e| e.token.id() < FIRST_GENERATED)
            .map(|e| e.token)
            .collect()
    }

    pub fn prompt_text(&self) -> String {
        self.last_prompt.borrow().clone().unwrap_or_default()
    }

    fn next_token(&self) -> Token {
        if self.fed_generated < self.script.len() {
            Token(FIRST_GENERATED + self.fed_generated as i32)
        } else {
            EOG
        }
    }
}

impl InferenceEngine for MockEngine {
    type Sampler = ArgmaxSampler;

    fn tokenize(&self, text: &str, add_special: bool) -> Result<Vec<Token>, EngineFault> {
        if self.fail_tokenize {
            return Err(EngineFault::Tokenize("vocab mismatch".into()));
        }
        *self.last_prompt.borrow_mut() = Some(text.to_string());

        let mut out = Vec::new();
        if add_special {
            out.push(BOS);
        }
        match self.prompt_len {
            Some(n) => out.extend((out.len()..n).map(|i| Token(3 + i as i32))),
            None => out.extend(text.bytes().map(|b| Token(3 + b as i32))),
        }
        Ok(out)
    }

    fn decode(&mut self, batch: &DecodeBatch) -> Result<(), EngineFault> {
        if self.fail_decode_at == Some(self.batches.len()) {
            return Err(EngineFault::Decode("compute graph failed".into()));
        }
        self.batches.push(batch.entries().to_vec());
        self.fed_generated += batch
            .iter()
            .filter(|e| e.token.id() >= FIRST_GENERATED)
            .count();

        if batch.iter().any(|e| e.logits) {
            let vocab = FIRST_GENERATED as usize + self.script.len() + 1;
            let hot = self.next_token().id() as usize;
            self.logits = vec![0.0; vocab];
            self.logits[hot] = 1.0;
        }
        Ok(())
    }

    fn output_logits(&self) -> Result<&[f32], EngineFault> {
        if self.logits.is_empty() {
            return Err(EngineFault::NoLogits("nothing decoded yet".into()));
        }
        Ok(&self.logits)
    }

    fn token_to_piece(&self, token: Token) -> Vec<u8> {
        let idx = token.id() - FIRST_GENERATED;
        if idx < 0 {
            return Vec::new();
        }
        self.script.get(idx as usize).cloned().unwrap_or_default()
    }

    fn is_end_of_generation(&self, token: Token) -> bool {
        token == EOG
    }

    fn context_capacity(&self) -> usize {
        self.n_ctx
    }

    fn batch_capacity(&self) -> usize {
        self.n_batch
    }

    fn clear_sequence(&mut self, seq_id: SeqId) {
        self.cleared.push(seq_id);
        self.fed_generated = 0;
        self.logits.clear();
    }

    fn new_sampler(&self, _params: &SamplingParams) -> Result<ArgmaxSampler, EngineFault> {
        if self.fail_sampler {
            return Err(EngineFault::Sampler("unsupported sampler chain".into()));
        }
        Ok(ArgmaxSampler {
            accepted: Rc::clone(&self.accepted),
        })
    }

    fn chat_template_source(&self) -> Option<String> {
        self.template_source.clone()
    }

    fn bos_text(&self) -> String {
        "<s>".into()
    }

    fn eos_text(&self) -> String {
        "</s>".into()
    }
}

impl EngineLoader for MockEngine {
    fn load(params: &LoadParams) -> Result<Self, EngineFault> {
        if !params.model_path.to_string_lossy().ends_with(".gguf") {
            return Err(EngineFault::Load(format!(
                "unrecognized model file: {}",
                params.model_path.display()
            )));
        }
        let mut e = MockEngine::new(["Hi", "!"]);
        e.n_ctx = params.n_ctx as usize;
        e.n_batch = params.n_batch as usize;
        Ok(e)
    }
}

/// Greedy pick; records what it is told to accept.
pub struct ArgmaxSampler {
    accepted: Rc<RefCell<Vec<Token>>>,
}

impl TokenSampler for ArgmaxSampler {
    fn sample(&mut self, logits: &[f32]) -> Token {
        let best = logits
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        Token(best as i32)
    }

    fn accept(&mut self, token: Token) {
        self.accepted.borrow_mut().push(token);
    }
}

/// Sink that keeps every delta and cancels after `limit` of them.
#[derive(Default)]
pub struct Collect {
    pub deltas: Vec<String>,
    pub limit: Option<usize>,
}

impl Collect {
    pub fn cancel_after(n: usize) -> Self {
        Self {
            deltas: Vec::new(),
            limit: Some(n),
        }
    }

    pub fn joined(&self) -> String {
        self.deltas.concat()
    }
}

impl chatgen_core::StreamSink for Collect {
    fn deliver(&mut self, delta: &str) -> bool {
        self.deltas.push(delta.to_string());
        self.limit.is_none_or(|n| self.deltas.len() < n)
    }
}
