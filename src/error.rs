use thiserror::Error;

/// Errors from the fallible edges of murmur (profile loading, serving).
///
/// The dialogue core itself never fails: malformed input degrades to a
/// finished turn instead.
#[derive(Debug, Error)]
pub enum MurmurError {
    /// File or socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A voice profile could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A voice profile decoded but carries unusable values.
    #[error("Invalid voice profile: {0}")]
    InvalidVoice(String),
}
