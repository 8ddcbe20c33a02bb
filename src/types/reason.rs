//! Reason codes for session outcomes and log lines

use serde::{Deserialize, Serialize};

/// Reason codes for every state change and decision in a dialogue turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // D001: Turn lifecycle
    // =========================================================================
    /// New turn started from Idle
    D001_TURN_BEGUN,
    /// Turn discarded by an explicit abort
    D001_TURN_ABORTED,
    /// Turn handed to finalization
    D001_TURN_COMPLETED,
    /// Turn fully finished, back to Idle
    D001_TURN_FINISHED,

    // =========================================================================
    // D002: Narrative
    // =========================================================================
    /// Narrative buffer replaced with the whole snapshot
    D002_NARRATIVE_UPDATED,
    /// Narrative buffer replaced, trailing partial delimiter held back
    D002_TAIL_HELD,

    // =========================================================================
    // D003: Directive
    // =========================================================================
    /// Delimiter confirmed, narrative frozen
    D003_DIRECTIVE_DETECTED,
    /// Directive buffer replaced from a resent snapshot
    D003_DIRECTIVE_UPDATED,
    /// Snapshot without a marker after the directive began
    D003_SNAPSHOT_IGNORED,
    /// Directive could not be parsed
    D003_DIRECTIVE_UNKNOWN,

    // =========================================================================
    // D004: Protocol violations
    // =========================================================================
    /// Snapshot arrived while no turn accepts snapshots
    D004_OUT_OF_ORDER_SNAPSHOT,
    /// Completion arrived while no turn is streaming
    D004_OUT_OF_ORDER_COMPLETE,
    /// begin_turn while another turn was in flight
    D004_FORCED_RESET,

    // =========================================================================
    // D005: Presentation
    // =========================================================================
    /// Reveal finished before the dispatcher's bound
    D005_REVEAL_COMPLETE,
    /// Reveal did not finish in time, forced to its end
    D005_REVEAL_TIMEOUT,
    /// Player skipped the typing animation
    D005_REVEAL_SKIPPED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::D001_TURN_BEGUN => "D001_TURN_BEGUN",
            Self::D001_TURN_ABORTED => "D001_TURN_ABORTED",
            Self::D001_TURN_COMPLETED => "D001_TURN_COMPLETED",
            Self::D001_TURN_FINISHED => "D001_TURN_FINISHED",
            Self::D002_NARRATIVE_UPDATED => "D002_NARRATIVE_UPDATED",
            Self::D002_TAIL_HELD => "D002_TAIL_HELD",
            Self::D003_DIRECTIVE_DETECTED => "D003_DIRECTIVE_DETECTED",
            Self::D003_DIRECTIVE_UPDATED => "D003_DIRECTIVE_UPDATED",
            Self::D003_SNAPSHOT_IGNORED => "D003_SNAPSHOT_IGNORED",
            Self::D003_DIRECTIVE_UNKNOWN => "D003_DIRECTIVE_UNKNOWN",
            Self::D004_OUT_OF_ORDER_SNAPSHOT => "D004_OUT_OF_ORDER_SNAPSHOT",
            Self::D004_OUT_OF_ORDER_COMPLETE => "D004_OUT_OF_ORDER_COMPLETE",
            Self::D004_FORCED_RESET => "D004_FORCED_RESET",
            Self::D005_REVEAL_COMPLETE => "D005_REVEAL_COMPLETE",
            Self::D005_REVEAL_TIMEOUT => "D005_REVEAL_TIMEOUT",
            Self::D005_REVEAL_SKIPPED => "D005_REVEAL_SKIPPED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::D001_TURN_BEGUN => "Turn started",
            Self::D001_TURN_ABORTED => "Turn aborted",
            Self::D001_TURN_COMPLETED => "Generation finished",
            Self::D001_TURN_FINISHED => "Turn finished",
            Self::D002_NARRATIVE_UPDATED => "Narrative updated",
            Self::D002_TAIL_HELD => "Possible delimiter held back",
            Self::D003_DIRECTIVE_DETECTED => "Directive detected",
            Self::D003_DIRECTIVE_UPDATED => "Directive updated",
            Self::D003_SNAPSHOT_IGNORED => "Snapshot ignored, narrative frozen",
            Self::D003_DIRECTIVE_UNKNOWN => "Directive not recognized",
            Self::D004_OUT_OF_ORDER_SNAPSHOT => "Snapshot outside a turn",
            Self::D004_OUT_OF_ORDER_COMPLETE => "Completion outside a turn",
            Self::D004_FORCED_RESET => "Previous turn force-reset",
            Self::D005_REVEAL_COMPLETE => "Reveal complete",
            Self::D005_REVEAL_TIMEOUT => "Reveal forced after timeout",
            Self::D005_REVEAL_SKIPPED => "Reveal skipped",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
