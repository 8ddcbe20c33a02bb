//! Directive accumulator: the best-known directive text of a turn
//!
//! Snapshots are full resends, so every update replaces the stored text
//! instead of appending to it.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{DelimiterKind, Directive};
use crate::{VERB_REVEAL_NODE, VERB_STOP_CONVERSATION};

lazy_static! {
    /// `node_id=<value>` up to the closing parenthesis or end of text
    static ref RE_NODE_ID: Regex = Regex::new(r"(?i)node_id\s*=\s*([^)]*)").unwrap();
}

const VERBS: [&str; 2] = [VERB_REVEAL_NODE, VERB_STOP_CONVERSATION];

/// Holds the cleaned directive text between delimiter and completion
#[derive(Debug, Default)]
pub struct DirectiveAccumulator {
    value: String,
    finalized: Option<Directive>,
}

impl DirectiveAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored directive with the cleaned `raw_suffix`
    ///
    /// Ignored once the directive has been finalized.
    pub fn update(&mut self, raw_suffix: &str) -> &str {
        if self.finalized.is_none() {
            self.value = clean(raw_suffix);
        }
        &self.value
    }

    /// Current cleaned directive text
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Freeze the buffer and parse it
    ///
    /// Calling again returns the same directive.
    pub fn finalize(&mut self) -> Directive {
        self.finalized
            .get_or_insert_with(|| parse_directive(&self.value))
            .clone()
    }

    /// Discard everything
    pub fn reset(&mut self) {
        self.value.clear();
        self.finalized = None;
    }
}

/// Strip delimiter fragments re-sent inside the suffix
pub fn clean(raw: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with `raw`
    let lower = raw.to_ascii_lowercase();

    let verb_positions: Vec<usize> = VERBS
        .iter()
        .flat_map(|verb| lower.match_indices(verb).map(|(at, _)| at))
        .collect();
    if verb_positions.len() >= 2 {
        if let Some(&last) = verb_positions.iter().max() {
            return raw[last..].trim().to_string();
        }
    }

    let last_delimiter = DelimiterKind::ALL
        .iter()
        .filter_map(|kind| raw.rfind(kind.as_str()).map(|at| (at, kind.as_str().len())))
        .max_by_key(|&(at, _)| at);
    if let Some((at, len)) = last_delimiter {
        return raw[at + len..].trim().to_string();
    }

    raw.trim().to_string()
}

/// Parse cleaned directive text; anything unrecognized is `Unknown`
pub fn parse_directive(text: &str) -> Directive {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    let unknown = || Directive::Unknown {
        raw: text.to_string(),
    };

    if lower.starts_with(VERB_STOP_CONVERSATION.trim_end_matches('(')) {
        return Directive::EndConversation;
    }

    if lower.starts_with(VERB_REVEAL_NODE.trim_end_matches('(')) {
        let node_id = RE_NODE_ID
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().trim_matches(|c| c == '"' || c == '\'').trim())
            .unwrap_or("");
        if node_id.is_empty() {
            return unknown();
        }
        return Directive::RevealNode {
            node_id: node_id.to_string(),
        };
    }

    unknown()
}

// =============================================================================
// TESTS
// =============================================================================
