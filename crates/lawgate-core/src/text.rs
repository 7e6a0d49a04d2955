//! Text normalisation and keyword matching.
//!
//! Every keyword table in the workspace is matched through [`TextProbe`], so a
//! term means the same thing to the retrieval fallback, the cache key and the
//! agents.
//!
//! # Term syntax
//!
//! - `law` matches the whole word "law" (not "lawsuit" or "flaw")
//! - `age verification` matches the two words in sequence, ignoring
//!   punctuation and repeated whitespace between them
//! - `encrypt*` matches any word starting with "encrypt"
//! - `A/B test` is tokenised like the input, so it matches "a/b test" and
//!   "A B test" alike

use std::collections::HashSet;

/// Lowercase, trim, and collapse internal whitespace to single spaces.
///
/// Punctuation is preserved; use [`tokenize`] when only words matter.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split into lowercase alphanumeric words. Everything else is a separator.
pub fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// The set of distinct lowercase words in `s`.
pub fn word_set(s: &str) -> HashSet<String> {
    tokenize(s).collect()
}

/// Pre-tokenised text that answers "does this term occur?" cheaply.
pub struct TextProbe {
    /// Tokens joined by single spaces, padded with a space on both ends.
    padded: String,
    words: HashSet<String>,
}

impl TextProbe {
    pub fn new(text: &str) -> Self {
        let tokens: Vec<String> = tokenize(text).collect();
        let padded = format!(" {} ", tokens.join(" "));
        Self {
            padded,
            words: tokens.into_iter().collect(),
        }
    }

    /// Distinct words in the probed text.
    pub fn words(&self) -> &HashSet<String> {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Whether `term` occurs, using the term syntax described in the module docs.
    pub fn has(&self, term: &str) -> bool {
        let (term, prefix) = match term.strip_suffix('*') {
            Some(stem) => (stem, true),
            None => (term, false),
        };

        let tokens: Vec<String> = tokenize(term).collect();
        match tokens.as_slice() {
            [] => false,
            [word] if !prefix => self.words.contains(word),
            _ => {
                let needle = if prefix {
                    format!(" {}", tokens.join(" "))
                } else {
                    format!(" {} ", tokens.join(" "))
                };
                self.padded.contains(&needle)
            }
        }
    }

    /// Whether any of `terms` occurs.
    pub fn has_any(&self, terms: &[&str]) -> bool {
        terms.iter().any(|t| self.has(t))
    }

    /// Number of `terms` that occur (each term counted once).
    pub fn count(&self, terms: &[&str]) -> usize {
        terms.iter().filter(|t| self.has(t)).count()
    }

    /// The subset of `terms` that occur, in table order.
    pub fn matches<'a>(&self, terms: &[&'a str]) -> Vec<&'a str> {
        terms.iter().copied().filter(|t| self.has(t)).collect()
    }
}
