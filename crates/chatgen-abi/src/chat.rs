use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of a conversation. Owned by the caller; the core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
    #[inline]
    pub fn system<S: Into<String>>(s: S) -> Self {
        Self::new(Role::System, s)
    }
    #[inline]
    pub fn user<S: Into<String>>(s: S) -> Self {
        Self::new(Role::User, s)
    }
    #[inline]
    pub fn assistant<S: Into<String>>(s: S) -> Self {
        Self::new(Role::Assistant, s)
    }
    #[inline]
    pub fn tool<S: Into<String>>(s: S) -> Self {
        Self::new(Role::Tool, s)
    }
}
