//! murmur: streaming dialogue directive extraction and paced voice reveal
//!
//! Snapshot → MarkerScanner → DialogueSession → RevealPacer / DirectiveAccumulator
//! → DirectiveDispatcher

pub mod core;
pub mod error;
pub mod types;

pub use error::MurmurError;

// =============================================================================
// WIRE SYNTAX [C] - Directive delimiters and verbs
// =============================================================================

/// Inline delimiter, checked first
pub const DELIMITER_BRACKET: &str = "[/ACTION]:";

/// Line delimiter, checked second
pub const DELIMITER_LINE: &str = "\nACTION:";

/// Known directive verbs (matched case-insensitively)
pub const VERB_REVEAL_NODE: &str = "reveal_node(";
pub const VERB_STOP_CONVERSATION: &str = "stop_conversation(";

/// Tag appended to player input when evidence is presented
pub const EVIDENCE_TAG: &str = "PLAYER_SHOWS";

// =============================================================================
// CADENCE [C] - Reveal pauses (seconds), not configurable per call
// =============================================================================

/// Extra pause after `.`, `?`, `!`
pub const SENTENCE_PAUSE_SECS: f32 = 0.3;

/// Extra pause after `,`, `;`, `:`
pub const CLAUSE_PAUSE_SECS: f32 = 0.2;

/// Longest pause the pacer will ever ask for after one unit
pub const MAX_UNIT_DELAY_SECS: f32 = 30.0;

// =============================================================================
// DISPATCH BOUNDS [C] - Wait for reveal completion before executing a directive
// =============================================================================

/// Lower bound of the presentation wait (seconds)
pub const DISPATCH_TIMEOUT_MIN_SECS: f64 = 3.0;

/// Upper bound of the presentation wait (seconds)
pub const DISPATCH_TIMEOUT_MAX_SECS: f64 = 20.0;

/// Per-unit allowance for punctuation pauses (seconds)
pub const DISPATCH_PAUSE_ALLOWANCE_SECS: f64 = 0.2;

/// Cap on the total punctuation allowance (seconds)
pub const DISPATCH_PAUSE_ALLOWANCE_CAP_SECS: f64 = 4.0;

// =============================================================================
// VOICE DEFAULTS [C]
// =============================================================================

pub const DEFAULT_VOICE_ID: u32 = 100_000;
pub const DEFAULT_BASE_PITCH: f32 = 1.0;
pub const DEFAULT_PITCH_VARIANCE: f32 = 0.1;
pub const DEFAULT_BASE_VOLUME: f32 = 1.0;
pub const DEFAULT_VOLUME_VARIANCE: f32 = 0.1;
pub const DEFAULT_BASE_INTERVAL: f32 = 0.05;
pub const DEFAULT_INTERVAL_VARIANCE: f32 = 0.01;

/// Upper bound for `base_interval` and `interval_variance` (seconds)
pub const MAX_VOICE_INTERVAL_SECS: f32 = 5.0;

/// Upper bound for `pitch_variance` and `volume_variance`
pub const MAX_VOICE_VARIANCE: f32 = 1.0;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.3.0";
