//! Dialogue session state definitions

use serde::{Deserialize, Serialize};

/// The four possible states of a dialogue turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// No turn active
    #[default]
    Idle,
    /// Snapshots arriving, narrative forwarded to the reveal
    Streaming,
    /// Delimiter seen, narrative frozen, directive being rebuilt
    AccumulatingDirective,
    /// Model finished, waiting for reveal and dispatch
    Finalizing,
}

impl SessionState {
    /// Is a turn in flight?
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }

    /// Does this state accept snapshots?
    pub fn accepts_snapshots(&self) -> bool {
        matches!(
            self,
            SessionState::Streaming | SessionState::AccumulatingDirective
        )
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            SessionState::Idle => "\x1b[90m",                  // Gray
            SessionState::Streaming => "\x1b[36m",             // Cyan
            SessionState::AccumulatingDirective => "\x1b[33m", // Yellow
            SessionState::Finalizing => "\x1b[32m",            // Green
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Idle => "IDLE",
            SessionState::Streaming => "STREAMING",
            SessionState::AccumulatingDirective => "ACCUMULATING_DIRECTIVE",
            SessionState::Finalizing => "FINALIZING",
        };
        write!(f, "{}", name)
    }
}
