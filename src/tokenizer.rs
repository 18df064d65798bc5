//! Word tokenizer and token counters.
//!
//! The word tokenizer is the measure used for chunk sizing and for the token
//! counts reported while draining. A tiktoken-backed counter is available for
//! callers who want chunks sized against an LLM vocabulary instead.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

lazy_static! {
    /// Anything that is not an ASCII word character, whitespace or hyphen.
    static ref NON_WORD: Regex = Regex::new(r"[^[:word:]\s-]").expect("static regex");
}

/// Split text into lower-cased word tokens.
///
/// Word characters are ASCII letters, digits and `_`. Everything else except
/// whitespace and `-` becomes a separator, so accented letters split a word.
/// Empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD
        .replace_all(&lowered, " ")
        .split_whitespace()
        .map(String::from)
        .collect()
}

/// Count the tokens [`tokenize`] would produce.
pub fn count_tokens(text: &str) -> usize {
    let lowered = text.to_lowercase();
    NON_WORD.replace_all(&lowered, " ").split_whitespace().count()
}

/// Token counter trait for measuring text.
pub trait TokenCounter: Send + Sync {
    /// Get the name of this counter.
    fn name(&self) -> &'static str;

    /// Count the number of tokens in the given text.
    fn count_tokens(&self, text: &str) -> usize;
}

/// Counter backed by the word tokenizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn name(&self) -> &'static str {
        "words"
    }

    fn count_tokens(&self, text: &str) -> usize {
        count_tokens(text)
    }
}

/// Counter using tiktoken (cl100k_base encoding).
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

impl TiktokenCounter {
    /// Create a counter with the cl100k_base encoding (GPT-4/ChatGPT).
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| PipelineError::Config(format!("failed to load cl100k_base: {e}")))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &'static str {
        "cl100k"
    }

    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Which counter a pipeline sizes its chunks with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenCounterKind {
    #[default]
    Words,
    Cl100k,
}

impl TokenCounterKind {
    /// Parse a counter name as it appears in configuration.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "words" | "word" => Some(TokenCounterKind::Words),
            "cl100k" | "cl100k_base" | "tiktoken" => Some(TokenCounterKind::Cl100k),
            _ => None,
        }
    }

    /// Instantiate the counter.
    pub fn build(self) -> Result<Arc<dyn TokenCounter>> {
        match self {
            TokenCounterKind::Words => Ok(Arc::new(WordCounter)),
            TokenCounterKind::Cl100k => Ok(Arc::new(TiktokenCounter::new()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_sentence() {
        assert_eq!(
            tokenize("Hello world. This is a test."),
            vec!["hello", "world", "this", "is", "a", "test"]
        );
    }

    #[test]
    fn test_hyphen_and_underscore_survive() {
        assert_eq!(
            tokenize("State-of-the-art snake_case, (really)!"),
            vec!["state-of-the-art", "snake_case", "really"]
        );
    }

    #[test]
    fn test_punctuation_splits_words() {
        assert_eq!(tokenize("e.g.it's"), vec!["e", "g", "it", "s"]);
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n\t ").is_empty());
        assert!(tokenize("... !!! ???").is_empty());
    }

    #[test]
    fn test_non_ascii_letters_are_separators() {
        assert_eq!(tokenize("Café naïve"), vec!["caf", "na", "ve"]);
        assert_eq!(tokenize("Ünïcode — ok"), vec!["n", "code", "ok"]);
        assert_eq!(count_tokens("Café naïve"), 3);
    }

    #[test]
    fn test_retokenizing_joined_tokens_is_stable() {
        let samples = [
            "Hello world. This is a test.",
            "Mixed-CASE words, numbers 42 and symbols #$%!",
            "Line one\nLine two\r\n\tTabbed -- dashes",
            "ÀÉÎ õü — ñ",
        ];
        for sample in samples {
            let tokens = tokenize(sample);
            assert_eq!(tokenize(&tokens.join(" ")), tokens, "sample: {sample:?}");
        }
    }

    #[test]
    fn test_count_matches_tokenize() {
        let text = "One, two; three: four-five! six?";
        assert_eq!(count_tokens(text), tokenize(text).len());
        assert_eq!(WordCounter.count_tokens(text), 5);
    }

    #[test]
    fn test_counter_kind_parse() {
        assert_eq!(TokenCounterKind::parse("words"), Some(TokenCounterKind::Words));
        assert_eq!(TokenCounterKind::parse(" CL100K "), Some(TokenCounterKind::Cl100k));
        assert_eq!(TokenCounterKind::parse("bytes"), None);
    }

    #[test]
    fn test_cl100k_counter() {
        let counter = TokenCounterKind::Cl100k.build().unwrap();
        assert_eq!(counter.name(), "cl100k");
        assert_eq!(counter.count_tokens("Hello world."), 3);
        assert_eq!(counter.count_tokens(""), 0);
    }
}
