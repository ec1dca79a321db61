//! Slug generation for quizzes.
//!
//! A slug consists of a normalized version of the quiz title plus a random
//! numeric suffix, e.g. `animal-trivia-4817`. The suffix exists because
//! titles are not unique; uniqueness of the full slug is enforced by the
//! store when the quiz is inserted (see [`crate::store::Store::create_quiz`]),
//! so callers draw new candidates until the insert succeeds.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;


/// The exclusive upper bound for the random slug suffix.
pub(crate) const SUFFIX_SPACE: u32 = 10_000;

/// Derives the base slug from a quiz title: lowercase, every character that
/// is neither a word character nor a space is stripped, and runs of spaces
/// are collapsed into a single hyphen. Can be empty if the title contains no
/// word characters at all.
pub(crate) fn base(title: &str) -> String {
    static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_ ]+").unwrap());
    static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());

    let lowered = title.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    SPACES.replace_all(&stripped, "-").into_owned()
}

/// Returns a slug candidate `{base}-{n}` with a fresh random suffix.
pub(crate) fn candidate(base: &str) -> String {
    let n = rand::rng().random_range(0..SUFFIX_SPACE);
    format!("{base}-{n}")
}
