//! Dialogue session: state machine for one streamed reply at a time
//!
//! State transitions:
//! - IDLE → STREAMING: begin_turn()
//! - STREAMING → ACCUMULATING_DIRECTIVE: delimiter confirmed in a snapshot
//! - STREAMING | ACCUMULATING_DIRECTIVE → FINALIZING: on_turn_complete()
//! - FINALIZING → IDLE: finish_turn()
//!
//! Protocol violations never fail; they force the session back to IDLE.

use tracing::{debug, info, warn};

use crate::core::accumulator::DirectiveAccumulator;
use crate::core::scanner::MarkerScanner;
use crate::types::{
    DelimiterKind, Directive, ReasonCode, Scan, SessionReport, SessionState, SnapshotOutcome,
    TurnCompletion,
};

/// Sole owner of the narrative and directive buffers
#[derive(Debug, Default)]
pub struct DialogueSession {
    state: SessionState,
    scanner: MarkerScanner,
    accumulator: DirectiveAccumulator,
    /// Text safe to show, replaced wholesale per snapshot
    narrative: String,
    /// Delimiter that froze the narrative this turn
    delimiter: Option<DelimiterKind>,
    /// Turns started so far, for log correlation
    turn: u64,
    last_reason: Option<ReasonCode>,
}

impl DialogueSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a turn; an in-flight turn is discarded first
    pub fn begin_turn(&mut self) -> ReasonCode {
        let reason = if self.state.is_active() {
            warn!(
                turn = self.turn,
                state = %self.state,
                reason = ReasonCode::D004_FORCED_RESET.code(),
                "begin_turn while a turn is active, discarding it"
            );
            ReasonCode::D004_FORCED_RESET
        } else {
            ReasonCode::D001_TURN_BEGUN
        };

        self.clear_buffers();
        self.turn += 1;
        self.state = SessionState::Streaming;
        self.last_reason = Some(reason);
        info!(turn = self.turn, reason = reason.code(), "turn begun");
        reason
    }

    /// Ingest the whole response generated so far
    pub fn on_snapshot(&mut self, text: &str) -> SnapshotOutcome {
        let outcome = if self.state == SessionState::AccumulatingDirective {
            self.accumulate_snapshot(text)
        } else if self.state.accepts_snapshots() {
            self.stream_snapshot(text)
        } else {
            warn!(
                turn = self.turn,
                state = %self.state,
                reason = ReasonCode::D004_OUT_OF_ORDER_SNAPSHOT.code(),
                "snapshot outside a streaming turn, resetting"
            );
            self.force_idle();
            SnapshotOutcome::Ignored {
                reason: ReasonCode::D004_OUT_OF_ORDER_SNAPSHOT,
            }
        };
        self.last_reason = Some(outcome.reason());
        outcome
    }

    fn stream_snapshot(&mut self, text: &str) -> SnapshotOutcome {
        match self.scanner.scan(text) {
            Scan::NoMarker { text } => {
                self.replace_narrative(text);
                SnapshotOutcome::Narrative {
                    text: self.narrative.clone(),
                    reason: ReasonCode::D002_NARRATIVE_UPDATED,
                }
            }
            Scan::PartialTail { safe_prefix, held } => {
                debug!(turn = self.turn, held = ?held, "holding possible delimiter");
                self.replace_narrative(safe_prefix);
                SnapshotOutcome::Narrative {
                    text: self.narrative.clone(),
                    reason: ReasonCode::D002_TAIL_HELD,
                }
            }
            Scan::Marker {
                prefix,
                suffix,
                kind,
            } => {
                self.replace_narrative(prefix.trim_end());
                self.delimiter = Some(kind);
                self.accumulator.reset();
                let directive = self.accumulator.update(suffix).to_string();
                self.state = SessionState::AccumulatingDirective;
                info!(
                    turn = self.turn,
                    delimiter = ?kind,
                    narrative_len = self.narrative.len(),
                    reason = ReasonCode::D003_DIRECTIVE_DETECTED.code(),
                    "directive detected, narrative frozen"
                );
                SnapshotOutcome::DirectiveStarted {
                    narrative: self.narrative.clone(),
                    kind,
                    directive,
                }
            }
        }
    }

    fn accumulate_snapshot(&mut self, text: &str) -> SnapshotOutcome {
        match self.scanner.scan(text).suffix() {
            Some(suffix) => {
                let directive = self.accumulator.update(suffix).to_string();
                debug!(turn = self.turn, directive = %directive, "directive updated");
                SnapshotOutcome::DirectiveUpdated { directive }
            }
            None => {
                debug!(
                    turn = self.turn,
                    reason = ReasonCode::D003_SNAPSHOT_IGNORED.code(),
                    "snapshot lost its marker, narrative stays frozen"
                );
                SnapshotOutcome::Ignored {
                    reason: ReasonCode::D003_SNAPSHOT_IGNORED,
                }
            }
        }
    }

    /// The model finished generating; no more snapshots this turn
    pub fn on_turn_complete(&mut self) -> Option<TurnCompletion> {
        let completion = match self.state {
            SessionState::Streaming => TurnCompletion::Narrative {
                narrative: self.narrative.clone(),
            },
            SessionState::AccumulatingDirective => {
                let directive = self.accumulator.finalize();
                if let Directive::Unknown { raw } = &directive {
                    warn!(
                        turn = self.turn,
                        raw = %raw,
                        reason = ReasonCode::D003_DIRECTIVE_UNKNOWN.code(),
                        "directive not recognized"
                    );
                }
                TurnCompletion::Directive {
                    narrative: self.narrative.clone(),
                    directive,
                }
            }
            SessionState::Idle | SessionState::Finalizing => {
                warn!(
                    turn = self.turn,
                    state = %self.state,
                    reason = ReasonCode::D004_OUT_OF_ORDER_COMPLETE.code(),
                    "completion outside a streaming turn, resetting"
                );
                self.force_idle();
                self.last_reason = Some(ReasonCode::D004_OUT_OF_ORDER_COMPLETE);
                return None;
            }
        };

        self.state = SessionState::Finalizing;
        self.last_reason = Some(ReasonCode::D001_TURN_COMPLETED);
        info!(
            turn = self.turn,
            directive = ?completion.directive(),
            reason = ReasonCode::D001_TURN_COMPLETED.code(),
            "turn complete"
        );
        Some(completion)
    }

    /// Dispatcher or reveal signalled done; back to IDLE
    ///
    /// Returns false if the session was not finalizing.
    pub fn finish_turn(&mut self) -> bool {
        if self.state != SessionState::Finalizing {
            debug!(turn = self.turn, state = %self.state, "finish_turn ignored");
            return false;
        }
        self.state = SessionState::Idle;
        self.last_reason = Some(ReasonCode::D001_TURN_FINISHED);
        info!(turn = self.turn, reason = ReasonCode::D001_TURN_FINISHED.code(), "turn finished");
        true
    }

    /// Discard the turn in flight
    pub fn abort(&mut self) {
        if self.state.is_active() {
            info!(
                turn = self.turn,
                state = %self.state,
                reason = ReasonCode::D001_TURN_ABORTED.code(),
                "turn aborted"
            );
        }
        self.force_idle();
        self.last_reason = Some(ReasonCode::D001_TURN_ABORTED);
    }

    fn force_idle(&mut self) {
        self.clear_buffers();
        self.state = SessionState::Idle;
    }

    fn clear_buffers(&mut self) {
        self.narrative.clear();
        self.accumulator.reset();
        self.delimiter = None;
    }

    fn replace_narrative(&mut self, text: &str) {
        self.narrative.clear();
        self.narrative.push_str(text);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Narrative buffer
    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    /// Directive buffer, present once a delimiter was seen
    pub fn directive_text(&self) -> Option<&str> {
        self.delimiter.map(|_| self.accumulator.value())
    }

    pub fn delimiter(&self) -> Option<DelimiterKind> {
        self.delimiter
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Snapshot of the session for display
    pub fn report(&self) -> SessionReport {
        SessionReport::new(
            self.state,
            self.narrative.clone(),
            self.directive_text().map(str::to_string),
            self.last_reason.unwrap_or(ReasonCode::D001_TURN_FINISHED),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        let session = DialogueSession::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.directive_text().is_none());
    }

    #[test]
    fn test_begin_turn_streams() {
        let mut session = DialogueSession::new();
        assert_eq!(session.begin_turn(), ReasonCode::D001_TURN_BEGUN);
        assert_eq!(session.state(), SessionState::Streaming);
    }

    #[test]
    fn test_narrative_replaced_not_appended() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        session.on_snapshot("I saw");
        session.on_snapshot("I saw him");
        assert_eq!(session.narrative(), "I saw him");
    }

    #[test]
    fn test_partial_tail_held() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        let outcome = session.on_snapshot("I saw him.[/AC");
        assert_eq!(outcome.reason(), ReasonCode::D002_TAIL_HELD);
        assert_eq!(session.narrative(), "I saw him.");
        assert_eq!(session.state(), SessionState::Streaming);
    }

    #[test]
    fn test_marker_freezes_narrative() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        let outcome = session.on_snapshot("I saw him.[/ACTION]:stop_");
        assert_eq!(
            outcome,
            SnapshotOutcome::DirectiveStarted {
                narrative: "I saw him.".to_string(),
                kind: DelimiterKind::Bracket,
                directive: "stop_".to_string(),
            }
        );
        assert_eq!(session.state(), SessionState::AccumulatingDirective);
    }

    #[test]
    fn test_markerless_snapshot_ignored_while_accumulating() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        session.on_snapshot("Go.\nACTION: stop_conversation()");
        let outcome = session.on_snapshot("Go. And another thing");
        assert_eq!(
            outcome,
            SnapshotOutcome::Ignored {
                reason: ReasonCode::D003_SNAPSHOT_IGNORED
            }
        );
        assert_eq!(session.narrative(), "Go.");
        assert_eq!(session.directive_text(), Some("stop_conversation()"));
    }

    #[test]
    fn test_complete_without_directive() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        session.on_snapshot("Nothing to add.");
        let done = session.on_turn_complete().unwrap();
        assert_eq!(
            done,
            TurnCompletion::Narrative {
                narrative: "Nothing to add.".to_string()
            }
        );
        assert_eq!(session.state(), SessionState::Finalizing);
        assert!(session.finish_turn());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_complete_with_unknown_directive() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        session.on_snapshot("Hm.[/ACTION]:whistle()");
        let done = session.on_turn_complete().unwrap();
        assert_eq!(done.directive().map(|d| d.kind()), Some(crate::types::DirectiveKind::Unknown));
    }

    #[test]
    fn test_snapshot_after_complete_resets() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        session.on_snapshot("Done.");
        session.on_turn_complete();
        let outcome = session.on_snapshot("Done. More");
        assert_eq!(outcome.reason(), ReasonCode::D004_OUT_OF_ORDER_SNAPSHOT);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.narrative(), "");
    }

    #[test]
    fn test_complete_while_idle() {
        let mut session = DialogueSession::new();
        assert!(session.on_turn_complete().is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_begin_turn_while_active_force_resets() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        session.on_snapshot("Half a thought.[/ACTION]:reveal_");
        assert_eq!(session.begin_turn(), ReasonCode::D004_FORCED_RESET);
        assert_eq!(session.state(), SessionState::Streaming);
        assert_eq!(session.narrative(), "");
        assert!(session.directive_text().is_none());
        assert_eq!(session.turn(), 2);
    }

    #[test]
    fn test_finish_turn_only_from_finalizing() {
        let mut session = DialogueSession::new();
        assert!(!session.finish_turn());
        session.begin_turn();
        assert!(!session.finish_turn());
        assert_eq!(session.state(), SessionState::Streaming);
    }

    #[test]
    fn test_abort() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        session.on_snapshot("Listen");
        session.abort();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.report().reason, ReasonCode::D001_TURN_ABORTED);
    }

    #[test]
    fn test_line_delimiter_trims_narrative() {
        let mut session = DialogueSession::new();
        session.begin_turn();
        session.on_snapshot("You should go.  \nACTION: stop_conversation()");
        assert_eq!(session.narrative(), "You should go.");
    }
}
