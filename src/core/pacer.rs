//! Reveal pacer: types a target string out one char per tick
//!
//! The pacer never sleeps. `advance()` returns the unit, an optional voice cue
//! and the pause before the next unit; whoever drives it does the waiting.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::audio::AudioSelector;
use crate::core::syllable::{is_syllable_start, syllable_starts};
use crate::types::{Advance, AudioCue, PunctuationScope, RevealState, Tick, VoiceProfile};
use crate::{CLAUSE_PAUSE_SECS, MAX_UNIT_DELAY_SECS, SENTENCE_PAUSE_SECS};

/// Character-by-character reveal with syllable-synchronized cues
#[derive(Debug)]
pub struct RevealPacer {
    voice: VoiceProfile,
    selector: AudioSelector,
    rng: StdRng,
    target: Vec<char>,
    committed: String,
    cursor: usize,
    /// No further target changes expected this turn
    target_final: bool,
    /// `Advance::Completed` already handed out
    completion_reported: bool,
}

impl RevealPacer {
    /// Create a pacer with entropy-seeded jitter
    pub fn new(voice: VoiceProfile) -> Self {
        Self::with_rng(voice, StdRng::from_entropy())
    }

    /// Create a pacer with repeatable jitter
    pub fn with_seed(voice: VoiceProfile, seed: u64) -> Self {
        Self::with_rng(voice, StdRng::seed_from_u64(seed))
    }

    fn with_rng(voice: VoiceProfile, rng: StdRng) -> Self {
        Self {
            voice,
            selector: AudioSelector::new(),
            rng,
            target: Vec::new(),
            committed: String::new(),
            cursor: 0,
            target_final: false,
            completion_reported: false,
        }
    }

    /// Replace the target while the model is still generating
    ///
    /// Returns false when the turn already completed and the call was ignored.
    pub fn set_target(&mut self, text: &str) -> bool {
        if self.completion_reported {
            return false;
        }
        self.replace_target(text);
        true
    }

    /// Replace the target for the last time this turn
    pub fn finalize_target(&mut self, text: &str) -> bool {
        if self.completion_reported {
            return false;
        }
        self.replace_target(text);
        self.target_final = true;
        true
    }

    fn replace_target(&mut self, text: &str) {
        self.target = text.chars().collect();
        // Upstream correction may shrink or rewrite the text
        self.cursor = self.cursor.min(self.target.len());
        let still_prefix = self
            .committed
            .chars()
            .eq(self.target[..self.cursor].iter().copied());
        if !still_prefix {
            self.committed = self.target[..self.cursor].iter().collect();
        }
    }

    /// Reveal one unit
    pub fn advance(&mut self) -> Advance {
        if self.cursor >= self.target.len() {
            return if self.completion_reported {
                Advance::Idle
            } else if self.target_final {
                self.completion_reported = true;
                Advance::Completed
            } else {
                Advance::Waiting
            };
        }

        // Cues hash the whole word, so a word still streaming in waits
        if self.word_may_grow() {
            return Advance::Waiting;
        }

        let unit = self.target[self.cursor];
        self.committed.push(unit);
        self.cursor += 1;

        Advance::Emitted(Tick {
            unit,
            cue: self.cue_for_last_unit(),
            delay: self.delay_after(unit),
        })
    }

    /// Does the rest of the target end mid-word in a target that may grow?
    fn word_may_grow(&self) -> bool {
        !self.target_final && !self.target[self.cursor..].iter().any(|c| c.is_whitespace())
    }

    /// Pause before the next unit: base ± jitter, plus punctuation cadence
    fn delay_after(&mut self, unit: char) -> Duration {
        let variance = self.voice.interval_variance;
        let jitter = if variance > 0.0 && variance.is_finite() {
            self.rng.gen_range(-variance..=variance)
        } else {
            0.0
        };
        let pause = match unit {
            '.' | '?' | '!' => SENTENCE_PAUSE_SECS,
            ',' | ';' | ':' => CLAUSE_PAUSE_SECS,
            _ => 0.0,
        };
        // Unvalidated profiles may carry huge or NaN values
        let secs = (self.voice.base_interval + jitter + pause)
            .max(0.0)
            .min(MAX_UNIT_DELAY_SECS);
        Duration::from_secs_f32(secs)
    }

    /// Fire the selector if the unit just revealed opens a syllable
    fn cue_for_last_unit(&self) -> Option<AudioCue> {
        let word_start = self
            .committed
            .rfind(char::is_whitespace)
            .map(|i| i + self.committed[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        let shown = &self.committed[word_start..];
        let index = shown.chars().count().checked_sub(1)?;
        if !is_syllable_start(shown, index) {
            return None;
        }

        // Rest of the word comes from the target, which knows where it ends
        let fragment: String = self.target[self.cursor - 1..]
            .iter()
            .take_while(|c| !c.is_whitespace())
            .collect();
        let full_word: String = shown.chars().take(index).chain(fragment.chars()).collect();

        let punctuation = full_word.chars().last().filter(|c| matches!(c, '.' | '?' | '!'));
        let last_syllable = syllable_starts(&full_word)
            .into_iter()
            .all(|start| start <= index);
        let scope = if punctuation.is_some() && last_syllable {
            PunctuationScope::Sentence
        } else {
            PunctuationScope::Word
        };

        self.selector
            .select_scoped(&self.voice, &fragment, punctuation, scope)
    }

    /// Forced completion: show everything now, no more delays
    pub fn finish_now(&mut self) -> &str {
        self.cursor = self.target.len();
        self.committed = self.target.iter().collect();
        &self.committed
    }

    /// Final target fully shown?
    pub fn is_complete(&self) -> bool {
        self.target_final && self.cursor >= self.target.len()
    }

    /// Text shown so far
    pub fn committed(&self) -> &str {
        &self.committed
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Target length in units
    pub fn target_len(&self) -> usize {
        self.target.len()
    }

    pub fn voice(&self) -> &VoiceProfile {
        &self.voice
    }

    /// Copy of the reveal progress
    pub fn state(&self) -> RevealState {
        RevealState {
            committed: self.committed.clone(),
            target: self.target.iter().collect(),
            cursor: self.cursor,
        }
    }

    /// Clear everything for a new turn
    pub fn reset(&mut self) {
        self.target.clear();
        self.committed.clear();
        self.cursor = 0;
        self.target_final = false;
        self.completion_reported = false;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_voice() -> VoiceProfile {
        VoiceProfile {
            interval_variance: 0.0,
            clip_set: vec!["beep.wav".to_string()],
            ..VoiceProfile::default()
        }
    }

    fn emitted(advance: Advance) -> Tick {
        match advance {
            Advance::Emitted(tick) => tick,
            other => panic!("expected a unit, got {:?}", other),
        }
    }

    #[test]
    fn test_reveals_successive_prefixes() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        let target = "I saw him.";
        pacer.finalize_target(target);

        for n in 1..=target.chars().count() {
            emitted(pacer.advance());
            let expected: String = target.chars().take(n).collect();
            assert_eq!(pacer.committed(), expected);
        }
        assert_eq!(pacer.committed(), target);
        assert_eq!(pacer.advance(), Advance::Completed);
    }

    #[test]
    fn test_completion_reported_once() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        pacer.finalize_target("No.");
        for _ in 0..3 {
            emitted(pacer.advance());
        }
        assert_eq!(pacer.advance(), Advance::Completed);
        assert_eq!(pacer.advance(), Advance::Idle);
        assert_eq!(pacer.advance(), Advance::Idle);
        assert!(!pacer.set_target("No. Wait"));
    }

    #[test]
    fn test_waits_for_growing_target() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        pacer.set_target("Hi th");
        for _ in 0..3 {
            emitted(pacer.advance());
        }
        assert_eq!(pacer.committed(), "Hi ");
        // "th" may still become a longer word
        assert_eq!(pacer.advance(), Advance::Waiting);
        assert!(!pacer.is_complete());

        pacer.set_target("Hi there ");
        assert_eq!(emitted(pacer.advance()).unit, 't');
    }

    #[test]
    fn test_streamed_word_cues_like_final_word() {
        let voice = VoiceProfile::with_clips(
            9,
            (0..50).map(|i| format!("clip{}.wav", i)).collect(),
        );
        let mut streamed = RevealPacer::with_seed(voice.clone(), 1);
        streamed.set_target("hi");
        assert_eq!(streamed.advance(), Advance::Waiting);
        streamed.set_target("him");
        assert_eq!(streamed.advance(), Advance::Waiting);
        streamed.finalize_target("him.");

        let mut whole = RevealPacer::with_seed(voice, 1);
        whole.finalize_target("him.");

        for _ in 0..4 {
            assert_eq!(emitted(streamed.advance()).cue, emitted(whole.advance()).cue);
        }
    }

    #[test]
    fn test_shrinking_target_clamps_cursor() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        pacer.set_target("Hello there");
        for _ in 0..8 {
            pacer.advance();
        }
        pacer.set_target("Hello");
        assert_eq!(pacer.cursor(), 5);
        assert_eq!(pacer.committed(), "Hello");
    }

    #[test]
    fn test_rewritten_target_rederives_committed() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        pacer.set_target("Hello there");
        for _ in 0..3 {
            pacer.advance();
        }
        pacer.set_target("Help me");
        assert_eq!(pacer.committed(), "Hel");
        pacer.set_target("Yes");
        assert_eq!(pacer.committed(), "Yes");
        assert_eq!(pacer.cursor(), 3);
    }

    #[test]
    fn test_punctuation_pauses() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        pacer.finalize_target("a,b.");
        let delays: Vec<f32> = (0..4)
            .map(|_| emitted(pacer.advance()).delay.as_secs_f32())
            .collect();
        assert!((delays[0] - 0.05).abs() < 1e-4);
        assert!((delays[1] - 0.25).abs() < 1e-4);
        assert!((delays[2] - 0.05).abs() < 1e-4);
        assert!((delays[3] - 0.35).abs() < 1e-4);
    }

    #[test]
    fn test_jitter_within_variance() {
        let voice = VoiceProfile {
            base_interval: 0.07,
            interval_variance: 0.01,
            ..VoiceProfile::default()
        };
        let mut pacer = RevealPacer::with_seed(voice, 42);
        pacer.finalize_target(&"x".repeat(200));
        while let Advance::Emitted(tick) = pacer.advance() {
            let secs = tick.delay.as_secs_f32();
            assert!((0.06 - 1e-4..=0.08 + 1e-4).contains(&secs), "delay {}", secs);
        }
    }

    #[test]
    fn test_unvalidated_voice_delay_is_capped() {
        let voice = VoiceProfile {
            base_interval: 1e20,
            interval_variance: f32::INFINITY,
            ..steady_voice()
        };
        let mut pacer = RevealPacer::with_seed(voice, 1);
        pacer.finalize_target("ok");
        let tick = emitted(pacer.advance());
        assert_eq!(tick.delay, Duration::from_secs_f32(MAX_UNIT_DELAY_SECS));

        let broken = VoiceProfile {
            base_interval: f32::NAN,
            ..steady_voice()
        };
        let mut pacer = RevealPacer::with_seed(broken, 1);
        pacer.finalize_target("ok");
        assert_eq!(emitted(pacer.advance()).delay, Duration::ZERO);
    }

    #[test]
    fn test_cue_on_syllable_start() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        pacer.finalize_target("go on");
        // g starts a word, o follows a consonant
        assert!(emitted(pacer.advance()).cue.is_some());
        assert!(emitted(pacer.advance()).cue.is_some());
        // whitespace ends the word, nothing to voice
        assert!(emitted(pacer.advance()).cue.is_none());
        // o opens "on"
        assert!(emitted(pacer.advance()).cue.is_some());
        // n follows a vowel
        assert!(emitted(pacer.advance()).cue.is_none());
    }

    #[test]
    fn test_cue_uses_rest_of_word() {
        let voice = VoiceProfile::with_clips(
            9,
            (0..50).map(|i| format!("clip{}.wav", i)).collect(),
        );
        let mut pacer = RevealPacer::with_seed(voice.clone(), 1);
        pacer.finalize_target("tomb");
        let cue = emitted(pacer.advance()).cue.unwrap();
        let expected = AudioSelector::new().select(&voice, "tomb", None).unwrap();
        assert_eq!(cue, expected);
    }

    #[test]
    fn test_final_syllable_uses_sentence_table() {
        let voice = VoiceProfile::with_clips(3, vec!["a.wav".into()]);
        let selector = AudioSelector::new();
        let mut pacer = RevealPacer::with_seed(voice.clone(), 1);
        pacer.finalize_target("ha?");
        let first = emitted(pacer.advance()).cue.unwrap();
        let second = emitted(pacer.advance()).cue.unwrap();

        let expected_first = selector
            .select_scoped(&voice, "ha?", Some('?'), PunctuationScope::Word)
            .unwrap();
        let expected_second = selector
            .select_scoped(&voice, "a?", Some('?'), PunctuationScope::Sentence)
            .unwrap();
        assert_eq!(first, expected_first);
        assert_eq!(second, expected_second);
    }

    #[test]
    fn test_silent_voice_never_cues() {
        let voice = VoiceProfile {
            clip_set: Vec::new(),
            ..steady_voice()
        };
        let mut pacer = RevealPacer::with_seed(voice, 1);
        pacer.finalize_target("Anything at all.");
        while let Advance::Emitted(tick) = pacer.advance() {
            assert!(tick.cue.is_none());
        }
    }

    #[test]
    fn test_finish_now() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        pacer.finalize_target("The conductor lied.");
        pacer.advance();
        assert_eq!(pacer.finish_now(), "The conductor lied.");
        assert!(pacer.is_complete());
        assert_eq!(pacer.advance(), Advance::Completed);
    }

    #[test]
    fn test_reset() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        pacer.finalize_target("Done.");
        pacer.finish_now();
        pacer.advance();
        pacer.reset();
        assert_eq!(pacer.state(), RevealState::default());
        assert_eq!(pacer.advance(), Advance::Waiting);
    }

    #[test]
    fn test_multibyte_target() {
        let mut pacer = RevealPacer::with_seed(steady_voice(), 1);
        pacer.finalize_target("¿Qué tal?");
        let mut count = 0;
        while let Advance::Emitted(_) = pacer.advance() {
            count += 1;
        }
        assert_eq!(count, 9);
        assert_eq!(pacer.committed(), "¿Qué tal?");
    }
}
