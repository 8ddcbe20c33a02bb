//! Turn model: what the player sends, what each snapshot produced,
//! and how a turn ends

use serde::{Deserialize, Serialize};

use crate::types::{DelimiterKind, Directive, ReasonCode};
use crate::EVIDENCE_TAG;

/// A player's line, optionally presenting a piece of evidence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub text: String,
    /// Evidence identifier shown alongside the line
    #[serde(default)]
    pub evidence: Option<String>,
}

impl PlayerInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            evidence: None,
        }
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// The message handed to the language model
    pub fn to_prompt(&self) -> String {
        let text = self.text.trim();
        match self.evidence.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => format!("{}\n[{}: {}]", text, EVIDENCE_TAG, id),
            _ => text.to_string(),
        }
    }
}

/// What one snapshot did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Narrative buffer replaced; forward to the reveal
    Narrative { text: String, reason: ReasonCode },
    /// Delimiter first seen; narrative is now frozen
    DirectiveStarted {
        narrative: String,
        kind: DelimiterKind,
        directive: String,
    },
    /// Directive buffer replaced
    DirectiveUpdated { directive: String },
    /// Snapshot dropped
    Ignored { reason: ReasonCode },
}

impl SnapshotOutcome {
    pub fn reason(&self) -> ReasonCode {
        match self {
            SnapshotOutcome::Narrative { reason, .. } => *reason,
            SnapshotOutcome::DirectiveStarted { .. } => ReasonCode::D003_DIRECTIVE_DETECTED,
            SnapshotOutcome::DirectiveUpdated { .. } => ReasonCode::D003_DIRECTIVE_UPDATED,
            SnapshotOutcome::Ignored { reason } => *reason,
        }
    }

    /// New narrative target for the reveal, if this snapshot changed it
    pub fn narrative(&self) -> Option<&str> {
        match self {
            SnapshotOutcome::Narrative { text, .. } => Some(text),
            SnapshotOutcome::DirectiveStarted { narrative, .. } => Some(narrative),
            _ => None,
        }
    }
}

/// How a finished generation is handed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnCompletion {
    /// Narrative followed by a directive to dispatch after the reveal
    Directive {
        narrative: String,
        directive: Directive,
    },
    /// Narrative only; input is re-enabled once the reveal ends
    Narrative { narrative: String },
}

impl TurnCompletion {
    pub fn narrative(&self) -> &str {
        match self {
            TurnCompletion::Directive { narrative, .. } => narrative,
            TurnCompletion::Narrative { narrative } => narrative,
        }
    }

    pub fn directive(&self) -> Option<&Directive> {
        match self {
            TurnCompletion::Directive { directive, .. } => Some(directive),
            TurnCompletion::Narrative { .. } => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_evidence() {
        let input = PlayerInput::new("  Where were you at midnight? ");
        assert_eq!(input.to_prompt(), "Where were you at midnight?");
    }

    #[test]
    fn test_prompt_with_evidence() {
        let input = PlayerInput::new("Explain this.").with_evidence("torn-ticket");
        assert_eq!(input.to_prompt(), "Explain this.\n[PLAYER_SHOWS: torn-ticket]");
    }

    #[test]
    fn test_blank_evidence_is_dropped() {
        let input = PlayerInput::new("Hello").with_evidence("   ");
        assert_eq!(input.to_prompt(), "Hello");
    }

    #[test]
    fn test_completion_accessors() {
        let done = TurnCompletion::Directive {
            narrative: "Fine.".to_string(),
            directive: Directive::EndConversation,
        };
        assert_eq!(done.narrative(), "Fine.");
        assert_eq!(done.directive(), Some(&Directive::EndConversation));

        let plain = TurnCompletion::Narrative {
            narrative: "Hm.".to_string(),
        };
        assert!(plain.directive().is_none());
    }
}
