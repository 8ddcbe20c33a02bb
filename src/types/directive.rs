//! Finalized directive types

use serde::{Deserialize, Serialize};

/// Directive category, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveKind {
    EndConversation,
    RevealNode,
    Unknown,
}

/// A directive parsed once per turn, consumed once by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Directive {
    /// `stop_conversation()`
    EndConversation,
    /// `reveal_node(node_id=...)`
    RevealNode { node_id: String },
    /// Anything else; the raw cleaned text is kept for logs
    Unknown { raw: String },
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::EndConversation => DirectiveKind::EndConversation,
            Directive::RevealNode { .. } => DirectiveKind::RevealNode,
            Directive::Unknown { .. } => DirectiveKind::Unknown,
        }
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Directive::EndConversation => write!(f, "stop_conversation()"),
            Directive::RevealNode { node_id } => write!(f, "reveal_node(node_id={})", node_id),
            Directive::Unknown { raw } => write!(f, "unknown({})", raw),
        }
    }
}
