//! Core modules for murmur

pub mod syllable;
pub mod audio;
pub mod pacer;
pub mod scanner;
pub mod accumulator;
pub mod session;
pub mod hooks;
pub mod reveal;
pub mod dispatcher;
pub mod driver;
pub mod api;

pub use syllable::{is_syllable_start, syllable_starts};
pub use audio::AudioSelector;
pub use pacer::RevealPacer;
pub use scanner::MarkerScanner;
pub use accumulator::{DirectiveAccumulator, parse_directive};
pub use session::DialogueSession;
pub use hooks::{PresentationSink, SessionOwner, WorldState, NodeLedger, ConversationFlags, RecordingSink};
pub use reveal::RevealHandle;
pub use dispatcher::{DirectiveDispatcher, DispatchOutcome, DispatchReport, presentation_timeout};
pub use driver::{DialogueDriver, TurnResult};
pub use api::{create_router, run_server};
