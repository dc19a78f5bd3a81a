use std::fmt;

use serde::{Deserialize, Serialize};

/// Vocabulary id produced by an engine's tokenizer or sampler.
///
/// `i32` matches the `llama_token` width; engines with unsigned ids convert
/// at their own boundary so the core only ever sees this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub i32);

impl Token {
    #[inline]
    pub fn id(self) -> i32 {
        self.0
    }
}

impl From<i32> for Token {
    #[inline]
    fn from(id: i32) -> Self {
        Token(id)
    }
}

impl From<Token> for i32 {
    #[inline]
    fn from(token: Token) -> i32 {
        token.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a token inside the engine's working context (0-based).
pub type Pos = i32;

/// Identifier of an engine-side sequence. Generation only ever uses [`PRIMARY_SEQ`].
pub type SeqId = i32;

pub const PRIMARY_SEQ: SeqId = 0;
