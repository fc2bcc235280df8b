//! Query compilation for the durable store.
//!
//! Equality and time filters behave exactly like the in-memory store. The
//! message clause is a case-insensitive regex, optionally replaced by a
//! valid `regex_pattern`, and `full_text_search` is a token search.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use logbook_core::{Error, LogQuery, LogRecord, Result};

use crate::matcher::{matches_identity, matches_time};
use crate::tokenizer::tokenize;

/// A parsed `full_text_search` string.
///
/// - bare words: at least one must appear as a message token
/// - `-word`: the record is excluded if the token appears
/// - `"a phrase"`: the token sequence must appear contiguously; when any
///   phrase is given, bare words no longer decide the match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSearch {
    terms: Vec<String>,
    negated: Vec<String>,
    phrases: Vec<Vec<String>>,
}

impl TextSearch {
    /// Parse a search string.
    pub fn parse(input: &str) -> Self {
        let mut search = TextSearch::default();
        let mut rest = input;

        while let Some(open) = rest.find('"') {
            search.add_words(&rest[..open]);
            let after = &rest[open + 1..];
            let (phrase, remainder) = match after.find('"') {
                Some(close) => (&after[..close], &after[close + 1..]),
                None => (after, ""),
            };
            let tokens = tokenize(phrase);
            if !tokens.is_empty() {
                search.phrases.push(tokens);
            }
            rest = remainder;
        }
        search.add_words(rest);
        search
    }

    fn add_words(&mut self, text: &str) {
        for word in text.split_whitespace() {
            match word.strip_prefix('-') {
                Some(negated) if !negated.is_empty() => self.negated.extend(tokenize(negated)),
                _ => self.terms.extend(tokenize(word)),
            }
        }
    }

    /// Positive single-word terms
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Excluded terms
    pub fn negated(&self) -> &[String] {
        &self.negated
    }

    /// Required phrases, each as a token sequence
    pub fn phrases(&self) -> &[Vec<String>] {
        &self.phrases
    }

    /// Check a message against the search.
    pub fn matches(&self, message: &str) -> bool {
        let tokens = tokenize(message);
        if self.negated.iter().any(|n| tokens.contains(n)) {
            return false;
        }
        if !self.phrases.is_empty() {
            return self
                .phrases
                .iter()
                .all(|phrase| tokens.windows(phrase.len()).any(|w| w == phrase.as_slice()));
        }
        self.terms.iter().any(|t| tokens.contains(t))
    }
}

/// Message clause after `regex_pattern` resolution
#[derive(Debug, Clone)]
enum MessageClause {
    Any,
    Pattern(Regex),
}

/// A query ready to be evaluated against records.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    query: LogQuery,
    message: MessageClause,
    search: Option<TextSearch>,
}

impl CompiledQuery {
    /// Compile `query`.
    ///
    /// Fails with [`Error::InvalidQuery`] when `message` is not a valid
    /// pattern and no valid `regex_pattern` overrides it. An invalid
    /// `regex_pattern` is ignored.
    pub fn compile(query: &LogQuery) -> Result<Self> {
        let override_pattern = if query.regex_pattern.is_empty() {
            None
        } else {
            match case_insensitive(&query.regex_pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    debug!(pattern = %query.regex_pattern, error = %e, "Ignoring invalid regex");
                    None
                }
            }
        };

        let message = match override_pattern {
            Some(regex) => MessageClause::Pattern(regex),
            None if query.message.is_empty() => MessageClause::Any,
            None => {
                let regex = case_insensitive(&query.message).map_err(|e| {
                    Error::InvalidQuery(format!("message pattern {:?}: {}", query.message, e))
                })?;
                MessageClause::Pattern(regex)
            }
        };

        let search = if query.full_text_search.trim().is_empty() {
            None
        } else {
            Some(TextSearch::parse(&query.full_text_search))
        };

        Ok(CompiledQuery {
            query: query.clone(),
            message,
            search,
        })
    }

    /// Parsed text search, if one was given
    pub fn search(&self) -> Option<&TextSearch> {
        self.search.as_ref()
    }

    /// Evaluate every clause against `record`.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if !matches_identity(record, &self.query) || !matches_time(record, &self.query) {
            return false;
        }
        if let MessageClause::Pattern(regex) = &self.message {
            if !regex.is_match(&record.message) {
                return false;
            }
        }
        match &self.search {
            Some(search) => search.matches(&record.message),
            None => true,
        }
    }
}

/// Compiled program size cap for user-supplied patterns
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Maximum nesting depth for user-supplied patterns
const REGEX_NEST_LIMIT: u32 = 200;

fn case_insensitive(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .nest_limit(REGEX_NEST_LIMIT)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(message: &str) -> LogRecord {
        LogRecord::new("error", message, Utc::now())
    }

    #[test]
    fn test_parse_search() {
        let search = TextSearch::parse(r#"timeout -retry "connect to db" cache"#);
        assert_eq!(search.terms(), ["timeout", "cache"]);
        assert_eq!(search.negated(), ["retry"]);
        assert_eq!(search.phrases(), [vec!["connect", "to", "db"]]);
    }

    #[test]
    fn test_parse_unterminated_phrase() {
        let search = TextSearch::parse(r#"disk "out of space"#);
        assert_eq!(search.terms(), ["disk"]);
        assert_eq!(search.phrases(), [vec!["out", "of", "space"]]);
    }

    #[test]
    fn test_any_term_matches() {
        let search = TextSearch::parse("timeout refused");
        assert!(search.matches("Connection refused by peer"));
        assert!(search.matches("Request TIMEOUT"));
        assert!(!search.matches("All good"));
    }

    #[test]
    fn test_negation_excludes() {
        let search = TextSearch::parse("failed -retry");
        assert!(search.matches("Failed to connect"));
        assert!(!search.matches("Failed, will retry"));
    }

    #[test]
    fn test_only_negations_match_nothing() {
        let search = TextSearch::parse("-retry");
        assert!(!search.matches("Failed to connect"));
    }

    #[test]
    fn test_phrase_must_be_contiguous() {
        let search = TextSearch::parse(r#""connect to db""#);
        assert!(search.matches("Failed to connect to DB"));
        assert!(!search.matches("connect quickly to db"));
    }

    #[test]
    fn test_phrase_counts_single_letter_words() {
        let search = TextSearch::parse(r#""retry in a moment""#);
        assert!(search.matches("Will retry in a moment"));
        assert!(!search.matches("Will retry in moment"));
        assert!(!search.matches("Retry in b moment"));
    }

    #[test]
    fn test_message_is_case_insensitive_regex() {
        let query = LogQuery::default().with_message("fail.*db");
        let compiled = CompiledQuery::compile(&query).unwrap();
        assert!(compiled.matches(&record("Failed to connect to DB")));
        assert!(!compiled.matches(&record("Connected")));
    }

    #[test]
    fn test_invalid_message_is_rejected() {
        let query = LogQuery::default().with_message("(unclosed");
        let err = CompiledQuery::compile(&query).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_valid_regex_replaces_message() {
        let query = LogQuery::default()
            .with_message("(unclosed")
            .with_regex("^cache");
        let compiled = CompiledQuery::compile(&query).unwrap();
        assert!(compiled.matches(&record("Cache miss")));
        assert!(!compiled.matches(&record("Failed to connect")));
    }

    #[test]
    fn test_invalid_regex_is_ignored() {
        let query = LogQuery::default().with_message("cache").with_regex("[");
        let compiled = CompiledQuery::compile(&query).unwrap();
        assert!(compiled.matches(&record("Cache miss")));
        assert!(!compiled.matches(&record("Failed to connect")));
    }

    #[test]
    fn test_identity_filters_still_apply() {
        let query = LogQuery::default().with_level("info").with_search("db");
        let compiled = CompiledQuery::compile(&query).unwrap();
        assert!(!compiled.matches(&record("Failed to connect to DB")));
    }
}
