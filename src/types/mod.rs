//! Core types for murmur

mod directive;
mod output;
mod reason;
mod reveal;
mod scan;
mod state;
mod turn;
mod voice;

pub use directive::{Directive, DirectiveKind};
pub use output::SessionReport;
pub use reason::ReasonCode;
pub use reveal::{Advance, RevealState, Tick};
pub use scan::{DelimiterKind, Scan};
pub use state::SessionState;
pub use turn::{PlayerInput, SnapshotOutcome, TurnCompletion};
pub use voice::{AudioCue, PunctuationScope, VoiceProfile};
