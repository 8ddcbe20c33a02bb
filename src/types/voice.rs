//! Voice profile and audio cue types

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MurmurError;
use crate::{
    DEFAULT_BASE_INTERVAL, DEFAULT_BASE_PITCH, DEFAULT_BASE_VOLUME, DEFAULT_INTERVAL_VARIANCE,
    DEFAULT_PITCH_VARIANCE, DEFAULT_VOICE_ID, DEFAULT_VOLUME_VARIANCE, MAX_VOICE_INTERVAL_SECS,
    MAX_VOICE_VARIANCE,
};

/// How a character "sounds" while their text is typed out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceProfile {
    /// Seed offset, distinct per character
    pub identity: u32,
    pub base_pitch: f32,
    pub pitch_variance: f32,
    pub base_volume: f32,
    pub volume_variance: f32,
    /// Seconds between revealed characters
    pub base_interval: f32,
    pub interval_variance: f32,
    /// Ordered audio handles (clip names or paths)
    pub clip_set: Vec<String>,
    /// Mood tag, carried for presentation
    pub emotion: String,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            identity: DEFAULT_VOICE_ID,
            base_pitch: DEFAULT_BASE_PITCH,
            pitch_variance: DEFAULT_PITCH_VARIANCE,
            base_volume: DEFAULT_BASE_VOLUME,
            volume_variance: DEFAULT_VOLUME_VARIANCE,
            base_interval: DEFAULT_BASE_INTERVAL,
            interval_variance: DEFAULT_INTERVAL_VARIANCE,
            clip_set: Vec::new(),
            emotion: "neutral".to_string(),
        }
    }
}

impl VoiceProfile {
    /// Default profile with a given identity and clip set
    pub fn with_clips(identity: u32, clip_set: Vec<String>) -> Self {
        Self {
            identity,
            clip_set,
            ..Self::default()
        }
    }

    /// Load and validate a profile from a JSON file
    pub fn load(path: &Path) -> Result<Self, MurmurError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a profile from JSON text
    pub fn from_json(json: &str) -> Result<Self, MurmurError> {
        let profile: VoiceProfile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject values the pacer and selector cannot use
    pub fn validate(&self) -> Result<(), MurmurError> {
        let fields = [
            ("pitch_variance", self.pitch_variance, MAX_VOICE_VARIANCE),
            ("volume_variance", self.volume_variance, MAX_VOICE_VARIANCE),
            ("base_interval", self.base_interval, MAX_VOICE_INTERVAL_SECS),
            ("interval_variance", self.interval_variance, MAX_VOICE_INTERVAL_SECS),
        ];
        for (name, value, max) in fields {
            if !value.is_finite() || !(0.0..=max).contains(&value) {
                return Err(MurmurError::InvalidVoice(format!(
                    "{} must be between 0 and {}, got {}",
                    name, max, value
                )));
            }
        }
        Ok(())
    }
}

/// Which punctuation table shapes a cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunctuationScope {
    /// Syllable inside a punctuated word
    Word,
    /// Final syllable before the punctuation mark
    Sentence,
}

/// One audio playback request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioCue {
    /// Index into the voice's clip set
    pub clip_index: usize,
    /// The clip handle at that index
    pub clip: String,
    pub pitch: f32,
    pub volume: f32,
}

// =============================================================================
// TESTS
// =============================================================================
