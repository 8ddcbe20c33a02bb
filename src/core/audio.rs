//! Deterministic audio selector
//!
//! A checksum of the syllable text picks the clip and nudges pitch and volume,
//! so one speaker always says the same word the same way.

use crate::types::{AudioCue, PunctuationScope, VoiceProfile};

/// (pitch, volume) offsets applied inside a punctuated word
const WORD_PERIOD: (f32, f32) = (-0.1, -0.05);
const WORD_QUESTION: (f32, f32) = (0.05, 0.0);
const WORD_EXCLAIM: (f32, f32) = (0.02, 0.1);

/// (pitch, volume) offsets applied on the syllable closing a sentence
const SENTENCE_PERIOD: (f32, f32) = (-0.2, -0.1);
const SENTENCE_QUESTION: (f32, f32) = (0.2, 0.0);
/// `!` is louder, not higher, at the end of a sentence too
const SENTENCE_EXCLAIM: (f32, f32) = (0.02, 0.1);

/// Picks clips and modulation for syllables
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioSelector;

impl AudioSelector {
    /// Create new selector
    pub fn new() -> Self {
        Self
    }

    /// Cue for `fragment` using the word-level punctuation table
    pub fn select(
        &self,
        voice: &VoiceProfile,
        fragment: &str,
        trailing_punctuation: Option<char>,
    ) -> Option<AudioCue> {
        self.select_scoped(voice, fragment, trailing_punctuation, PunctuationScope::Word)
    }

    /// Cue for `fragment` using the table for `scope`
    ///
    /// `fragment` runs from the syllable start to the end of its word.
    /// Returns `None` when the voice has no clips.
    pub fn select_scoped(
        &self,
        voice: &VoiceProfile,
        fragment: &str,
        trailing_punctuation: Option<char>,
        scope: PunctuationScope,
    ) -> Option<AudioCue> {
        if voice.clip_set.is_empty() {
            return None;
        }

        let seed = seed_for(voice.identity, fragment);
        let clip_index = (seed % voice.clip_set.len() as u64) as usize;
        let (pitch_offset, volume_offset) = punctuation_offset(trailing_punctuation, scope);

        Some(AudioCue {
            clip_index,
            clip: voice.clip_set[clip_index].clone(),
            pitch: voice.base_pitch + jitter(seed, voice.pitch_variance) + pitch_offset,
            volume: voice.base_volume + jitter(seed, voice.volume_variance) + volume_offset,
        })
    }
}

/// Voice identity plus the uppercased char codes of `fragment`
pub fn seed_for(identity: u32, fragment: &str) -> u64 {
    fragment
        .chars()
        .flat_map(char::to_uppercase)
        .fold(identity as u64, |acc, c| acc.wrapping_add(c as u64))
}

/// Repeatable offset within `±variance`
fn jitter(seed: u64, variance: f32) -> f32 {
    let window = variance as f64 * 200.0;
    if window.is_nan() || window <= 0.0 {
        return 0.0;
    }
    (((seed as f64) % window - variance as f64 * 100.0) / 100.0) as f32
}

/// Fixed (pitch, volume) shift for the punctuation that ends the word
fn punctuation_offset(punctuation: Option<char>, scope: PunctuationScope) -> (f32, f32) {
    match (scope, punctuation) {
        (PunctuationScope::Word, Some('.')) => WORD_PERIOD,
        (PunctuationScope::Word, Some('?')) => WORD_QUESTION,
        (PunctuationScope::Word, Some('!')) => WORD_EXCLAIM,
        (PunctuationScope::Sentence, Some('.')) => SENTENCE_PERIOD,
        (PunctuationScope::Sentence, Some('?')) => SENTENCE_QUESTION,
        (PunctuationScope::Sentence, Some('!')) => SENTENCE_EXCLAIM,
        _ => (0.0, 0.0),
    }
}

// =============================================================================
// TESTS
// =============================================================================
