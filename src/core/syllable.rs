//! Syllable segmenter: coarse consonant→vowel heuristic
//!
//! Not linguistically accurate. It only has to be stable, so the same word
//! always "sounds" the same.

/// Vowels that open a syllable (matched case-insensitively)
const VOWELS: &str = "aeiouy";

fn is_vowel(c: char) -> bool {
    VOWELS.contains(c.to_ascii_lowercase())
}

/// Does a syllable start at char position `index` of `word`?
///
/// Position 0 always starts one. Past the end, nothing does.
pub fn is_syllable_start(word: &str, index: usize) -> bool {
    let mut chars = word.chars();
    if index == 0 {
        return chars.next().is_some();
    }
    match (chars.nth(index - 1), chars.next()) {
        (Some(previous), Some(current)) => is_vowel(current) && !is_vowel(previous),
        _ => false,
    }
}

/// Char positions of every syllable start in `word`
pub fn syllable_starts(word: &str) -> Vec<usize> {
    let chars: Vec<char> = word.chars().collect();
    (0..chars.len())
        .filter(|&i| i == 0 || (is_vowel(chars[i]) && !is_vowel(chars[i - 1])))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
