use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

lazy_static::lazy_static! {
    static ref STOPWORDS: HashSet<&'static str> = {
        [
            "a", "about", "above", "after", "again", "against", "all", "am", "an", "and",
            "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
            "between", "both", "but", "by", "cannot", "could", "did", "do", "does", "doing",
            "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
            "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
            "i", "if", "in", "into", "is", "it", "its", "itself", "me", "more", "most", "my",
            "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other",
            "ought", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
            "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
            "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
            "too", "under", "until", "up", "very", "was", "we", "were", "what", "when",
            "where", "which", "while", "who", "whom", "why", "with", "would", "you", "your",
            "yours", "yourself", "yourselves",
        ]
        .iter()
        .copied()
        .collect()
    };
}

/// Splits text into normalized terms.
///
/// The index engine only depends on this behavior, so alternative analyzers
/// (stemming, stop words, ...) plug in without touching the engine.
pub trait Tokenizer: Send + Sync {
    /// Tokenize one line of text into normalized terms, in order.
    fn tokenize(&self, line: &str) -> Vec<String>;

    /// Normalize a query word before lookup.
    ///
    /// The default only case-folds: the word is not split on delimiters, so
    /// `"hello world"` never matches the separately indexed terms.
    fn normalize(&self, word: &str) -> String {
        word.to_lowercase()
    }
}

/// What to do with the empty terms produced by a line that starts or ends
/// with delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTokens {
    /// Emit them, so `""` becomes a key of the index.
    #[default]
    Keep,
    /// Filter them out.
    Drop,
}

/// Word characters are `[A-Za-z0-9_]`; everything else delimits.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split on maximal runs of non-word characters.
///
/// A leading or trailing delimiter run yields an empty segment at that
/// boundary. An empty line is a single empty segment.
fn split_words(line: &str) -> Vec<String> {
    let mut tokens = vec![String::new()];
    let mut in_delimiter = false;

    for c in line.chars() {
        if is_word_char(c) {
            if in_delimiter {
                tokens.push(String::new());
                in_delimiter = false;
            }
            if let Some(last) = tokens.last_mut() {
                last.push(c);
            }
        } else {
            in_delimiter = true;
        }
    }

    if in_delimiter {
        tokens.push(String::new());
    }

    tokens
}

/// Convert tokens to lowercase
fn lowercase_filter(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().map(|t| t.to_lowercase()).collect()
}

/// The reference analyzer: non-word split followed by lowercasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer {
    empty_tokens: EmptyTokens,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_empty_tokens(empty_tokens: EmptyTokens) -> Self {
        Self { empty_tokens }
    }

    pub fn empty_tokens(&self) -> EmptyTokens {
        self.empty_tokens
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, line: &str) -> Vec<String> {
        let tokens = lowercase_filter(split_words(line));
        match self.empty_tokens {
            EmptyTokens::Keep => tokens,
            EmptyTokens::Drop => tokens.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }
}

/// Word split, lowercase, English stop-word removal and Snowball stemming.
pub struct StemmingTokenizer {
    stemmer: Stemmer,
}

impl StemmingTokenizer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Remove stopwords
    fn stopword_filter(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .filter(|t| !t.is_empty() && !STOPWORDS.contains(t.as_str()))
            .collect()
    }

    /// Apply stemming
    fn stemmer_filter(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .map(|t| self.stemmer.stem(&t).into_owned())
            .collect()
    }
}

impl Default for StemmingTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for StemmingTokenizer {
    fn tokenize(&self, line: &str) -> Vec<String> {
        let tokens = split_words(line);
        let tokens = lowercase_filter(tokens);
        let tokens = self.stopword_filter(tokens);
        self.stemmer_filter(tokens)
    }

    fn normalize(&self, word: &str) -> String {
        self.stemmer.stem(&word.to_lowercase()).into_owned()
    }
}
