/// Chirp body moderation
///
/// Whole space-separated words on the profanity list are replaced with
/// `****`, matched case-insensitively. Punctuation attached to a word
/// prevents a match.

use lazy_static::lazy_static;
use std::collections::HashSet;

use crate::error::ValidationError;

pub const MAX_CHIRP_LENGTH: usize = 140;
const REPLACEMENT: &str = "****";

lazy_static! {
    static ref PROFANE_WORDS: HashSet<&'static str> =
        ["kerfuffle", "sharbert", "fornax"].into_iter().collect();
}

pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.contains(word.to_lowercase().as_str()) {
                REPLACEMENT
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clean a chirp body and enforce the length limit on the result
pub fn moderate_chirp(body: &str) -> Result<String, ValidationError> {
    let cleaned = clean_body(body);
    if cleaned.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ValidationError::TooLong("chirp".to_string(), MAX_CHIRP_LENGTH));
    }
    Ok(cleaned)
}
