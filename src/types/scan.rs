//! Marker scan results

use serde::{Deserialize, Serialize};

use crate::{DELIMITER_BRACKET, DELIMITER_LINE};

/// The two recognized directive delimiters, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterKind {
    /// `[/ACTION]:`
    Bracket,
    /// `\nACTION:`
    Line,
}

impl DelimiterKind {
    /// All delimiters, highest priority first
    pub const ALL: [DelimiterKind; 2] = [DelimiterKind::Bracket, DelimiterKind::Line];

    /// The literal delimiter text
    pub fn as_str(&self) -> &'static str {
        match self {
            DelimiterKind::Bracket => DELIMITER_BRACKET,
            DelimiterKind::Line => DELIMITER_LINE,
        }
    }
}

/// Classification of one full-response snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan<'a> {
    /// No delimiter and no suspicious tail; all of it is narrative
    NoMarker { text: &'a str },
    /// Tail could be the start of a delimiter; only `safe_prefix` may be shown
    PartialTail { safe_prefix: &'a str, held: &'a str },
    /// Delimiter confirmed
    Marker {
        prefix: &'a str,
        suffix: &'a str,
        kind: DelimiterKind,
    },
}

impl<'a> Scan<'a> {
    /// Text that is safe to show the player
    pub fn narrative(&self) -> &'a str {
        match self {
            Scan::NoMarker { text } => text,
            Scan::PartialTail { safe_prefix, .. } => safe_prefix,
            Scan::Marker { prefix, .. } => prefix,
        }
    }

    /// Raw directive text after a confirmed delimiter
    pub fn suffix(&self) -> Option<&'a str> {
        match self {
            Scan::Marker { suffix, .. } => Some(suffix),
            _ => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Scan::Marker { .. })
    }
}
