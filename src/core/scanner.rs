//! Marker scanner: splits a snapshot into narrative and directive
//!
//! Pure string logic. A tail that might grow into a delimiter is held back
//! before the delimiter is confirmed, so the player never sees `[/ACT` flash
//! on screen.

use crate::types::{DelimiterKind, Scan};

/// Finds directive delimiters in full-response snapshots
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerScanner;

impl MarkerScanner {
    /// Create new scanner
    pub fn new() -> Self {
        Self
    }

    /// Classify a snapshot
    pub fn scan<'a>(&self, text: &'a str) -> Scan<'a> {
        if let Some((at, kind)) = self.find_delimiter(text) {
            return Scan::Marker {
                prefix: &text[..at],
                suffix: &text[at + kind.as_str().len()..],
                kind,
            };
        }

        let held = self.partial_tail_len(text);
        if held > 0 {
            let split = text.len() - held;
            Scan::PartialTail {
                safe_prefix: &text[..split],
                held: &text[split..],
            }
        } else {
            Scan::NoMarker { text }
        }
    }

    /// Byte offset and kind of the earliest delimiter
    ///
    /// On equal offsets the higher-priority delimiter wins.
    pub fn find_delimiter(&self, text: &str) -> Option<(usize, DelimiterKind)> {
        let mut best: Option<(usize, DelimiterKind)> = None;
        for kind in DelimiterKind::ALL {
            if let Some(at) = text.find(kind.as_str()) {
                if best.map_or(true, |(best_at, _)| at < best_at) {
                    best = Some((at, kind));
                }
            }
        }
        best
    }

    /// Length in bytes of the longest tail that is a strict, non-empty
    /// prefix of some delimiter
    pub fn partial_tail_len(&self, text: &str) -> usize {
        DelimiterKind::ALL
            .iter()
            .filter_map(|kind| {
                let delimiter = kind.as_str();
                (1..delimiter.len())
                    .rev()
                    .find(|&n| text.ends_with(&delimiter[..n]))
            })
            .max()
            .unwrap_or(0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
