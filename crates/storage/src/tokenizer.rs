//! Message tokens for the word index and text search
//!
//! A token is a maximal run of alphanumeric characters, lower-cased. Every
//! token is kept, single letters included, so phrase queries line up word
//! for word with the message.

use std::collections::BTreeSet;

/// Tokens of `message` in order, duplicates kept
///
/// # Example
///
/// ```
/// use logbook_storage::tokenizer::tokenize;
///
/// let tokens = tokenize("Failed to connect to a DB");
/// assert_eq!(tokens, vec!["failed", "to", "connect", "to", "a", "db"]);
/// ```
pub fn tokenize(message: &str) -> Vec<String> {
    words(message).map(str::to_lowercase).collect()
}

/// Distinct tokens of `message`, for posting lists
pub fn distinct_tokens(message: &str) -> BTreeSet<String> {
    words(message).map(str::to_lowercase).collect()
}

fn words(message: &str) -> impl Iterator<Item = &str> {
    message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases() {
        assert_eq!(tokenize("Request TIMEOUT"), vec!["request", "timeout"]);
    }

    #[test]
    fn test_tokenize_keeps_single_characters() {
        assert_eq!(tokenize("I am a test"), vec!["i", "am", "a", "test"]);
    }

    #[test]
    fn test_tokenize_identifiers() {
        let tokens = tokenize("server-1234 cache_node2");
        assert_eq!(tokens, vec!["server", "1234", "cache", "node2"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("...---...").is_empty());
    }

    #[test]
    fn test_distinct_tokens() {
        let tokens = distinct_tokens("Cache miss for key, cache MISS");
        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
        assert_eq!(tokens, vec!["cache", "for", "key", "miss"]);
    }
}
