//! Integration tests for the dialogue driver
//!
//! Timing runs on tokio's paused clock, so reveal pauses and the dispatcher
//! bound elapse instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use murmur::core::{
    ConversationFlags, DialogueDriver, DispatchOutcome, NodeLedger, RecordingSink, RevealPacer,
};
use murmur::types::{Directive, ReasonCode, SessionState, VoiceProfile};
use pretty_assertions::assert_eq;

struct Harness {
    driver: DialogueDriver,
    sink: Arc<RecordingSink>,
    owner: Arc<ConversationFlags>,
    world: Arc<NodeLedger>,
}

fn harness(voice: VoiceProfile) -> Harness {
    let sink = Arc::new(RecordingSink::new());
    let owner = Arc::new(ConversationFlags::new());
    let world = Arc::new(NodeLedger::with_nodes(["clue-7", "torn-ticket"]));
    let driver = DialogueDriver::with_pacer(
        RevealPacer::with_seed(voice, 11),
        Some(sink.clone()),
        owner.clone(),
        world.clone(),
    );
    Harness {
        driver,
        sink,
        owner,
        world,
    }
}

fn voice() -> VoiceProfile {
    VoiceProfile::with_clips(100_000, vec!["blip-a.wav".to_string(), "blip-b.wav".to_string()])
}

#[tokio::test(start_paused = true)]
async fn test_directive_waits_for_reveal() {
    let mut h = harness(voice());
    h.driver.begin_turn();
    h.driver.on_snapshot("Hello there.[/ACTION]:reveal_node(node_id=clue-7)");
    h.driver.on_turn_complete();

    // Directive must not run while the line is still being typed
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!h.world.is_discovered("clue-7"));
    assert_ne!(h.sink.displayed(), "Hello there.");

    let result = h.driver.wait_turn().await.unwrap();
    let dispatch = result.dispatch.unwrap();
    assert_eq!(dispatch.presentation, ReasonCode::D005_REVEAL_COMPLETE);
    assert_eq!(
        dispatch.outcome,
        DispatchOutcome::NodeRevealed {
            node_id: "clue-7".to_string(),
            success: true
        }
    );
    assert_eq!(h.sink.displayed(), "Hello there.");
    assert!(h.world.is_discovered("clue-7"));
    assert!(h.owner.input_enabled());
    assert_eq!(h.driver.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_reveal_emits_syllable_cues() {
    let mut h = harness(voice());
    h.driver.begin_turn();
    h.driver.on_snapshot("conductor");
    h.driver.on_turn_complete();
    h.driver.wait_turn().await.unwrap();

    // c-o-nd-u-ct-o-r: syllables start at 0, 1, 4, 7
    assert_eq!(h.sink.cues().len(), 4);
    assert_eq!(h.sink.displayed(), "conductor");
}

#[tokio::test(start_paused = true)]
async fn test_slow_reveal_is_forced_complete() {
    // One second per char: 40 chars cannot finish inside the 20 s bound
    let slow = VoiceProfile {
        base_interval: 1.0,
        interval_variance: 0.0,
        ..voice()
    };
    let mut h = harness(slow);
    let line = "This will take far too long to type out.";
    h.driver.begin_turn();
    h.driver.on_snapshot(&format!("{}[/ACTION]:stop_conversation()", line));
    h.driver.on_turn_complete();

    let result = h.driver.wait_turn().await.unwrap();
    let dispatch = result.dispatch.unwrap();
    assert_eq!(dispatch.presentation, ReasonCode::D005_REVEAL_TIMEOUT);
    assert_eq!(dispatch.directive, Directive::EndConversation);
    assert_eq!(h.sink.displayed(), line);
    assert!(h.driver.reveal().is_complete());
    assert!(!h.owner.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_stop_typing_shows_everything() {
    let mut h = harness(voice());
    h.driver.begin_turn();
    h.driver.on_snapshot("You again. What now?");

    assert_eq!(h.driver.stop_typing(), "You again. What now?");
    assert_eq!(h.sink.displayed(), "You again. What now?");

    // Later snapshots keep being followed after the skip
    h.driver.on_snapshot("You again. What now? Speak.");
    h.driver.on_turn_complete();
    let result = h.driver.wait_turn().await.unwrap();
    assert_eq!(result.presentation, ReasonCode::D005_REVEAL_COMPLETE);
    assert_eq!(h.sink.displayed(), "You again. What now? Speak.");
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_pending_directive() {
    let mut h = harness(voice());
    h.driver.begin_turn();
    h.driver.on_snapshot("Goodbye, detective.[/ACTION]:stop_conversation()");
    h.driver.on_turn_complete();

    h.driver.abort();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(h.owner.is_open());
    assert!(h.owner.input_enabled());
    assert_eq!(h.driver.state(), SessionState::Idle);
    assert_eq!(h.sink.displayed(), "");
    assert!(h.driver.wait_turn().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_directive_keeps_conversation() {
    let mut h = harness(voice());
    h.driver.begin_turn();
    h.driver.on_snapshot("Hmm.\nACTION: shrug()");
    let completion = h.driver.on_turn_complete().unwrap();
    assert_eq!(
        completion.directive(),
        Some(&Directive::Unknown {
            raw: "shrug()".to_string()
        })
    );

    let result = h.driver.wait_turn().await.unwrap();
    assert!(matches!(
        result.dispatch.unwrap().outcome,
        DispatchOutcome::Ignored { .. }
    ));
    assert!(h.owner.is_open());
    assert!(h.owner.input_enabled());
    assert!(h.world.discovered().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_no_sink_still_completes() {
    let owner = Arc::new(ConversationFlags::new());
    let world = Arc::new(NodeLedger::open());
    let mut driver = DialogueDriver::with_pacer(
        RevealPacer::with_seed(voice(), 5),
        None,
        owner.clone(),
        world.clone(),
    );
    driver.begin_turn();
    driver.on_snapshot("Quiet.[/ACTION]:reveal_node(node_id=\"cellar-key\")");
    driver.on_turn_complete();
    driver.wait_turn().await.unwrap();

    assert_eq!(driver.displayed(), "Quiet.");
    assert_eq!(world.discovered(), vec!["cellar-key".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_next_turn_after_directive() {
    let mut h = harness(voice());
    h.driver.begin_turn();
    h.driver.on_snapshot("Look.[/ACTION]:reveal_node(node_id=torn-ticket)");
    h.driver.on_turn_complete();
    h.driver.wait_turn().await.unwrap();

    assert_eq!(h.driver.begin_turn(), ReasonCode::D001_TURN_BEGUN);
    assert_eq!(h.sink.displayed(), "");
    h.driver.on_snapshot("Anything else?");
    h.driver.on_turn_complete();
    let result = h.driver.wait_turn().await.unwrap();
    assert_eq!(result.narrative, "Anything else?");
    assert!(result.dispatch.is_none());
}
