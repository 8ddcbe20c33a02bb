//! Reveal progress types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::AudioCue;

/// Progress of a character-by-character reveal
///
/// `committed` is always the first `cursor` chars of `target`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealState {
    /// Text already shown
    pub committed: String,
    /// Text to reveal
    pub target: String,
    /// Units (chars) of `target` already shown
    pub cursor: usize,
}

/// One emitted unit
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// The revealed character
    pub unit: char,
    /// Voice cue fired on a syllable boundary
    pub cue: Option<AudioCue>,
    /// Pause before the next unit
    pub delay: Duration,
}

/// Result of one pacer step
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// A unit was revealed
    Emitted(Tick),
    /// Caught up with a target that may still grow
    Waiting,
    /// Final target fully revealed; reported once
    Completed,
    /// Nothing left to do
    Idle,
}
