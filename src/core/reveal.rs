//! Reveal handle: a shared pacer, its tick loop, and the display it drives
//!
//! Snapshot ingestion only swaps the target under a short lock, so it never
//! waits on pacing. The tick loop paces from whatever target it last saw.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{watch, Notify};
use tracing::debug;

use crate::core::hooks::PresentationSink;
use crate::core::pacer::RevealPacer;
use crate::types::{Advance, VoiceProfile};

/// Cloneable handle to one pacer and its presentation sink
#[derive(Clone)]
pub struct RevealHandle {
    pacer: Arc<Mutex<RevealPacer>>,
    sink: Option<Arc<dyn PresentationSink>>,
    /// New target available
    wake: Arc<Notify>,
    /// Cut the current pause short
    interrupt: Arc<Notify>,
    /// Final target fully revealed
    done: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for RevealHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealHandle")
            .field("pacer", &self.pacer)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl RevealHandle {
    pub fn new(pacer: RevealPacer, sink: Option<Arc<dyn PresentationSink>>) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            pacer: Arc::new(Mutex::new(pacer)),
            sink,
            wake: Arc::new(Notify::new()),
            interrupt: Arc::new(Notify::new()),
            done: Arc::new(done),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RevealPacer> {
        self.pacer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Absent sink is a no-op
    fn display(&self, text: &str) {
        if let Some(sink) = &self.sink {
            sink.set_displayed_text(text);
        }
    }

    /// Streaming target update
    pub fn set_target(&self, text: &str) {
        self.lock().set_target(text);
        self.wake.notify_one();
    }

    /// Last target of the turn
    pub fn finalize_target(&self, text: &str) {
        self.lock().finalize_target(text);
        self.wake.notify_one();
    }

    /// Forced completion: everything shown now, completion signalled
    pub fn force_complete(&self) -> String {
        let mut pacer = self.lock();
        let text = pacer.finish_now().to_string();
        self.display(&text);
        if pacer.advance() == Advance::Completed {
            self.done.send_replace(true);
        }
        drop(pacer);
        self.interrupt.notify_waiters();
        text
    }

    /// Player skipped the typing: show the known target, keep following it
    pub fn stop_typing(&self) -> String {
        let mut pacer = self.lock();
        let text = pacer.finish_now().to_string();
        self.display(&text);
        drop(pacer);
        self.interrupt.notify_waiters();
        self.wake.notify_one();
        text
    }

    /// Clear for a new turn and blank the display
    pub fn reset(&self) {
        let mut pacer = self.lock();
        pacer.reset();
        self.display("");
        self.done.send_replace(false);
        drop(pacer);
        self.interrupt.notify_waiters();
    }

    /// Wait until the final target has been fully revealed
    pub async fn wait_complete(&self) {
        let mut rx = self.done.subscribe();
        // Sender lives as long as self
        let _ = rx.wait_for(|done| *done).await;
    }

    pub fn is_complete(&self) -> bool {
        self.lock().is_complete()
    }

    pub fn committed(&self) -> String {
        self.lock().committed().to_string()
    }

    pub fn target_len(&self) -> usize {
        self.lock().target_len()
    }

    pub fn voice(&self) -> VoiceProfile {
        self.lock().voice().clone()
    }

    /// Tick loop: run as a task for the lifetime of the session
    pub async fn run(self) {
        loop {
            let step = {
                let mut pacer = self.lock();
                let step = pacer.advance();
                if let Advance::Emitted(tick) = &step {
                    self.display(pacer.committed());
                    if let (Some(sink), Some(cue)) = (&self.sink, &tick.cue) {
                        sink.play_cue(cue);
                    }
                }
                step
            };

            match step {
                Advance::Emitted(tick) => {
                    tokio::select! {
                        _ = tokio::time::sleep(tick.delay) => {}
                        _ = self.interrupt.notified() => {}
                    }
                }
                Advance::Completed => {
                    debug!("reveal complete");
                    self.done.send_replace(true);
                }
                Advance::Waiting | Advance::Idle => self.wake.notified().await,
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hooks::RecordingSink;
    use std::time::Duration;

    fn handle() -> (RevealHandle, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let voice = VoiceProfile::with_clips(3, vec!["tick.wav".to_string()]);
        let handle = RevealHandle::new(RevealPacer::with_seed(voice, 9), Some(sink.clone()));
        (handle, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_loop_reveals_final_target() {
        let (handle, sink) = handle();
        let task = tokio::spawn(handle.clone().run());

        handle.finalize_target("Yes.");
        handle.wait_complete().await;

        assert_eq!(sink.displayed(), "Yes.");
        assert_eq!(sink.update_count(), 4);
        assert!(handle.is_complete());
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_growing_target() {
        let (handle, sink) = handle();
        let task = tokio::spawn(handle.clone().run());

        handle.set_target("No wa");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.displayed(), "No ");
        assert!(!handle.is_complete());

        handle.finalize_target("No way");
        handle.wait_complete().await;
        assert_eq!(sink.displayed(), "No way");
        task.abort();
    }

    #[test]
    fn test_force_complete_without_loop() {
        let (handle, sink) = handle();
        handle.finalize_target("Everything at once.");
        assert_eq!(handle.force_complete(), "Everything at once.");
        assert_eq!(sink.displayed(), "Everything at once.");
        assert!(handle.is_complete());
        assert!(*handle.done.borrow());
    }

    #[test]
    fn test_reset_blanks_display() {
        let (handle, sink) = handle();
        handle.set_target("Gone");
        handle.stop_typing();
        handle.reset();
        assert_eq!(sink.displayed(), "");
        assert_eq!(handle.target_len(), 0);
        assert!(!*handle.done.borrow());
    }
}
