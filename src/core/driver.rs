//! Dialogue driver: wires the session, the reveal loop and the dispatcher
//! onto a tokio runtime
//!
//! Snapshot ingestion stays synchronous. The reveal loop runs as its own task
//! for the driver's lifetime, and each completed turn gets a short-lived
//! finish task that waits on the reveal before acting.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::dispatcher::{DirectiveDispatcher, DispatchReport};
use crate::core::hooks::{PresentationSink, SessionOwner, WorldState};
use crate::core::pacer::RevealPacer;
use crate::core::reveal::RevealHandle;
use crate::core::session::DialogueSession;
use crate::types::{
    PlayerInput, ReasonCode, SessionReport, SessionState, SnapshotOutcome, TurnCompletion,
    VoiceProfile,
};

/// How a turn ended once its presentation settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnResult {
    pub narrative: String,
    pub dispatch: Option<DispatchReport>,
    /// `D005_REVEAL_COMPLETE` or `D005_REVEAL_TIMEOUT`
    pub presentation: ReasonCode,
}

/// One dialogue: session, reveal loop and dispatcher
///
/// Must be created inside a tokio runtime.
pub struct DialogueDriver {
    session: Arc<Mutex<DialogueSession>>,
    reveal: RevealHandle,
    dispatcher: Arc<DirectiveDispatcher>,
    owner: Arc<dyn SessionOwner>,
    reveal_task: JoinHandle<()>,
    finish_task: Option<JoinHandle<TurnResult>>,
}

impl std::fmt::Debug for DialogueDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueDriver")
            .field("state", &self.state())
            .field("reveal", &self.reveal)
            .field("finish_pending", &self.finish_task.is_some())
            .finish()
    }
}

impl DialogueDriver {
    pub fn new(
        voice: VoiceProfile,
        sink: Option<Arc<dyn PresentationSink>>,
        owner: Arc<dyn SessionOwner>,
        world: Arc<dyn WorldState>,
    ) -> Self {
        Self::with_pacer(RevealPacer::new(voice), sink, owner, world)
    }

    /// Same as `new` with a caller-built pacer (e.g. seeded)
    pub fn with_pacer(
        pacer: RevealPacer,
        sink: Option<Arc<dyn PresentationSink>>,
        owner: Arc<dyn SessionOwner>,
        world: Arc<dyn WorldState>,
    ) -> Self {
        let reveal = RevealHandle::new(pacer, sink);
        let reveal_task = tokio::spawn(reveal.clone().run());
        Self {
            session: Arc::new(Mutex::new(DialogueSession::new())),
            reveal,
            dispatcher: Arc::new(DirectiveDispatcher::new(owner.clone(), world)),
            owner,
            reveal_task,
            finish_task: None,
        }
    }

    fn session(&self) -> MutexGuard<'_, DialogueSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cancel_finish(&mut self) {
        if let Some(task) = self.finish_task.take() {
            if !task.is_finished() {
                debug!("cancelling pending finish task");
            }
            task.abort();
        }
    }

    /// Start a turn: clear the display and lock input until it settles
    pub fn begin_turn(&mut self) -> ReasonCode {
        self.cancel_finish();
        self.reveal.reset();
        self.owner.set_input_enabled(false);
        self.session().begin_turn()
    }

    /// Begin a turn for `input`; returns the message to send to the model
    pub fn submit(&mut self, input: &PlayerInput) -> (ReasonCode, String) {
        let reason = self.begin_turn();
        (reason, input.to_prompt())
    }

    /// Ingest a snapshot and hand any new narrative to the reveal loop
    pub fn on_snapshot(&mut self, text: &str) -> SnapshotOutcome {
        let outcome = self.session().on_snapshot(text);
        if let Some(narrative) = outcome.narrative() {
            self.reveal.set_target(narrative);
        }
        if outcome.reason() == ReasonCode::D004_OUT_OF_ORDER_SNAPSHOT {
            self.recover();
        }
        outcome
    }

    /// The model is done; settle the turn in the background
    pub fn on_turn_complete(&mut self) -> Option<TurnCompletion> {
        let completion = self.session().on_turn_complete();
        let Some(completion) = completion else {
            self.recover();
            return None;
        };

        let narrative = completion.narrative().to_string();
        self.reveal.finalize_target(&narrative);

        let directive = completion.directive().cloned();
        let session = Arc::clone(&self.session);
        let reveal = self.reveal.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        let owner = Arc::clone(&self.owner);

        self.cancel_finish();
        self.finish_task = Some(tokio::spawn(async move {
            let (dispatch, presentation) = match directive {
                Some(directive) => {
                    let report = dispatcher.dispatch(directive, &reveal).await;
                    let presentation = report.presentation;
                    (Some(report), presentation)
                }
                None => {
                    let presentation = dispatcher.await_presentation(&reveal).await;
                    owner.set_input_enabled(true);
                    (None, presentation)
                }
            };
            session
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .finish_turn();
            TurnResult {
                narrative,
                dispatch,
                presentation,
            }
        }));

        Some(completion)
    }

    /// Player skipped the typing
    pub fn stop_typing(&self) -> String {
        info!(
            state = %self.state(),
            reason = ReasonCode::D005_REVEAL_SKIPPED.code(),
            "typing skipped"
        );
        self.reveal.stop_typing()
    }

    /// Drop the turn in flight, including any pending directive
    pub fn abort(&mut self) {
        self.cancel_finish();
        self.session().abort();
        self.reveal.reset();
        self.owner.set_input_enabled(true);
    }

    /// Wait for the finish task of the last completed turn
    ///
    /// `None` when no turn is pending or it was cancelled.
    pub async fn wait_turn(&mut self) -> Option<TurnResult> {
        let task = self.finish_task.take()?;
        task.await.ok()
    }

    /// Out-of-order call: session already reset itself
    fn recover(&mut self) {
        self.cancel_finish();
        self.reveal.stop_typing();
        self.owner.set_input_enabled(true);
    }

    pub fn state(&self) -> SessionState {
        self.session().state()
    }

    pub fn report(&self) -> SessionReport {
        self.session().report()
    }

    /// Text revealed so far
    pub fn displayed(&self) -> String {
        self.reveal.committed()
    }

    pub fn reveal(&self) -> &RevealHandle {
        &self.reveal
    }

    pub fn voice(&self) -> VoiceProfile {
        self.reveal.voice()
    }
}

impl Drop for DialogueDriver {
    fn drop(&mut self) {
        self.cancel_finish();
        self.reveal_task.abort();
    }
}

// =============================================================================
// TESTS
// =============================================================================
