//! Output structures for terminal and API display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ReasonCode, SessionState};

/// Summary of the session after one input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Current state
    pub state: SessionState,
    /// Narrative buffer as it stands
    pub narrative: String,
    /// Directive buffer, if a delimiter was seen
    pub directive: Option<String>,
    /// Reason for the last change
    pub reason: ReasonCode,
}

impl SessionReport {
    pub fn new(
        state: SessionState,
        narrative: impl Into<String>,
        directive: Option<String>,
        reason: ReasonCode,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            state,
            narrative: narrative.into(),
            directive,
            reason,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        format!(
            "{}[{}] {} chars | directive={} | {}{}",
            self.state.color_code(),
            self.state,
            self.narrative.chars().count(),
            self.directive.as_deref().unwrap_or("-"),
            self.reason.code(),
            SessionState::color_reset()
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "state={} | narrative={:?} | directive={:?} | reason={}",
            self.state,
            self.narrative,
            self.directive.as_deref().unwrap_or(""),
            self.reason.code()
        )
    }
}
