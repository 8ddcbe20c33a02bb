//! Directive dispatcher: runs a finalized directive once the player has read
//! the line it came with
//!
//! The wait is bounded. Narration and directive are paced independently, and
//! a stalled reveal must not hold the game hostage.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::core::hooks::{SessionOwner, WorldState};
use crate::core::reveal::RevealHandle;
use crate::types::{Directive, ReasonCode};
use crate::{
    DISPATCH_PAUSE_ALLOWANCE_CAP_SECS, DISPATCH_PAUSE_ALLOWANCE_SECS, DISPATCH_TIMEOUT_MAX_SECS,
    DISPATCH_TIMEOUT_MIN_SECS,
};

/// Upper bound on how long to wait for a reveal of `target_len` units
pub fn presentation_timeout(target_len: usize, interval: f64, variance: f64) -> Duration {
    let len = target_len as f64;
    let typing = len * (interval + variance);
    let pauses = (len * DISPATCH_PAUSE_ALLOWANCE_SECS).min(DISPATCH_PAUSE_ALLOWANCE_CAP_SECS);
    let secs = (typing + pauses).clamp(DISPATCH_TIMEOUT_MIN_SECS, DISPATCH_TIMEOUT_MAX_SECS);
    Duration::from_secs_f64(secs)
}

/// What a directive did to the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DispatchOutcome {
    ConversationEnded,
    NodeRevealed { node_id: String, success: bool },
    Ignored { raw: String },
}

/// Dispatch result with how the presentation wait ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub directive: Directive,
    pub outcome: DispatchOutcome,
    /// `D005_REVEAL_COMPLETE` or `D005_REVEAL_TIMEOUT`
    pub presentation: ReasonCode,
}

/// Maps directives to collaborator calls
pub struct DirectiveDispatcher {
    owner: Arc<dyn SessionOwner>,
    world: Arc<dyn WorldState>,
}

impl std::fmt::Debug for DirectiveDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveDispatcher").finish_non_exhaustive()
    }
}

impl DirectiveDispatcher {
    pub fn new(owner: Arc<dyn SessionOwner>, world: Arc<dyn WorldState>) -> Self {
        Self { owner, world }
    }

    /// Wait (bounded) for the reveal, then apply the directive
    pub async fn dispatch(&self, directive: Directive, reveal: &RevealHandle) -> DispatchReport {
        let presentation = self.await_presentation(reveal).await;
        let outcome = self.apply(&directive);
        DispatchReport {
            directive,
            outcome,
            presentation,
        }
    }

    /// Wait for reveal completion; force it when the bound runs out
    pub async fn await_presentation(&self, reveal: &RevealHandle) -> ReasonCode {
        let voice = reveal.voice();
        let bound = presentation_timeout(
            reveal.target_len(),
            voice.base_interval as f64,
            voice.interval_variance as f64,
        );

        match tokio::time::timeout(bound, reveal.wait_complete()).await {
            Ok(()) => ReasonCode::D005_REVEAL_COMPLETE,
            Err(_) => {
                warn!(
                    bound_secs = bound.as_secs_f64(),
                    reason = ReasonCode::D005_REVEAL_TIMEOUT.code(),
                    "reveal did not finish in time, forcing it"
                );
                reveal.force_complete();
                ReasonCode::D005_REVEAL_TIMEOUT
            }
        }
    }

    /// Run the effect right away
    pub fn apply(&self, directive: &Directive) -> DispatchOutcome {
        match directive {
            Directive::EndConversation => {
                info!("ending conversation");
                self.owner.end_conversation();
                DispatchOutcome::ConversationEnded
            }
            Directive::RevealNode { node_id } => {
                let success = self.world.reveal_node(node_id);
                if success {
                    info!(node_id = %node_id, "node revealed");
                } else {
                    warn!(node_id = %node_id, "node reveal rejected");
                }
                // Conversation continues either way
                self.owner.set_input_enabled(true);
                DispatchOutcome::NodeRevealed {
                    node_id: node_id.clone(),
                    success,
                }
            }
            Directive::Unknown { raw } => {
                warn!(
                    raw = %raw,
                    reason = ReasonCode::D003_DIRECTIVE_UNKNOWN.code(),
                    "ignoring unknown directive"
                );
                self.owner.set_input_enabled(true);
                DispatchOutcome::Ignored { raw: raw.clone() }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
