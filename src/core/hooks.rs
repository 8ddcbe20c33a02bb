//! Collaborator interfaces and in-memory implementations
//!
//! The core never reaches for UI objects or game singletons. Everything it
//! touches comes in through these traits at construction.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::types::AudioCue;

/// Where revealed text and voice cues go
pub trait PresentationSink: Send + Sync {
    /// Replace the visible text
    fn set_displayed_text(&self, text: &str);
    /// Fire-and-forget playback
    fn play_cue(&self, cue: &AudioCue);
}

/// Whoever owns the conversation UI
pub trait SessionOwner: Send + Sync {
    /// Close the dialogue
    fn end_conversation(&self);
    /// Let the player type (or not)
    fn set_input_enabled(&self, enabled: bool);
}

/// Game world state that directives mutate
pub trait WorldState: Send + Sync {
    /// Mark a clue node discovered; already discovered is still success
    fn reveal_node(&self, node_id: &str) -> bool;
}

// =============================================================================
// IN-MEMORY IMPLEMENTATIONS
// =============================================================================

/// World backed by a set of discovered node ids
#[derive(Debug, Default)]
pub struct NodeLedger {
    /// Ids that exist; `None` accepts any id
    known: Option<HashSet<String>>,
    discovered: Mutex<BTreeSet<String>>,
}

impl NodeLedger {
    /// Ledger accepting any node id
    pub fn open() -> Self {
        Self::default()
    }

    /// Ledger that only knows the given ids
    pub fn with_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: Some(nodes.into_iter().map(Into::into).collect()),
            discovered: Mutex::new(BTreeSet::new()),
        }
    }

    /// Discovered ids, sorted
    pub fn discovered(&self) -> Vec<String> {
        self.discovered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn is_discovered(&self, node_id: &str) -> bool {
        self.discovered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(node_id)
    }
}

impl WorldState for NodeLedger {
    fn reveal_node(&self, node_id: &str) -> bool {
        if let Some(known) = &self.known {
            if !known.contains(node_id) {
                return false;
            }
        }
        self.discovered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(node_id.to_string());
        true
    }
}

/// Conversation open/closed and input gate as plain flags
#[derive(Debug)]
pub struct ConversationFlags {
    open: AtomicBool,
    input_enabled: AtomicBool,
}

impl Default for ConversationFlags {
    fn default() -> Self {
        Self {
            open: AtomicBool::new(true),
            input_enabled: AtomicBool::new(true),
        }
    }
}

impl ConversationFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled.load(Ordering::SeqCst)
    }
}

impl SessionOwner for ConversationFlags {
    fn end_conversation(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.input_enabled.store(false, Ordering::SeqCst);
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.input_enabled.store(enabled, Ordering::SeqCst);
    }
}

/// Sink that remembers what it was given
#[derive(Debug, Default)]
pub struct RecordingSink {
    displayed: Mutex<String>,
    updates: AtomicUsize,
    cues: Mutex<Vec<AudioCue>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text set
    pub fn displayed(&self) -> String {
        self.displayed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of `set_displayed_text` calls
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.cues.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PresentationSink for RecordingSink {
    fn set_displayed_text(&self, text: &str) {
        let mut displayed = self.displayed.lock().unwrap_or_else(|e| e.into_inner());
        displayed.clear();
        displayed.push_str(text);
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn play_cue(&self, cue: &AudioCue) {
        self.cues
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(cue.clone());
    }
}

// =============================================================================
// TESTS
// =============================================================================
