use jieba_rs::Jieba;
use log::error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{EngineError, Result};

/// A word token with half-open character offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl WordSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits text into word tokens whose concatenation is the input.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Dictionary + HMM segmentation via jieba.
///
/// Loading the dictionary is expensive; build one and share it.
pub struct JiebaTokenizer {
    jieba: Jieba,
}

impl JiebaTokenizer {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }
}

impl Default for JiebaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for JiebaTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiebaTokenizer").finish_non_exhaustive()
    }
}

impl Tokenizer for JiebaTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        self.jieba
            .cut(text, true)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// One token per character. Deterministic; handy when no dictionary is wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.chars().map(String::from).collect()
    }
}

#[derive(Debug, Default)]
pub struct Segmenter<T: Tokenizer = JiebaTokenizer> {
    tokenizer: T,
}

impl Segmenter<JiebaTokenizer> {
    pub fn jieba() -> Self {
        Self::new(JiebaTokenizer::new())
    }
}

impl<T: Tokenizer> Segmenter<T> {
    pub fn new(tokenizer: T) -> Self {
        Self { tokenizer }
    }

    pub fn segment(&self, text: &str) -> Vec<String> {
        self.tokenizer.tokenize(text)
    }

    /// Character offsets of each token, accumulated from token lengths.
    ///
    /// Fails rather than returning offsets that would not slice the source
    /// correctly when the tokens do not reconstruct `text`.
    pub fn boundaries(&self, text: &str) -> Result<Vec<WordSpan>> {
        let tokens = self.segment(text);
        let mut spans = Vec::with_capacity(tokens.len());
        let mut cursor = 0;

        for token in tokens {
            let end = cursor + token.chars().count();
            spans.push(WordSpan {
                start: cursor,
                end,
                text: token,
            });
            cursor = end;
        }

        let rebuilt: String = spans.iter().map(|s| s.text.as_str()).collect();
        if rebuilt != text {
            error!("segmentation of {text:?} reconstructed as {rebuilt:?}");
            return Err(EngineError::AlignmentInvariant(format!(
                "tokens of {text:?} concatenate to {rebuilt:?}"
            )));
        }
        Ok(spans)
    }

    /// Word tokens with punctuation and whitespace tokens removed.
    pub fn words(&self, text: &str) -> Vec<String> {
        self.segment(text)
            .into_iter()
            .filter(|t| !is_punctuation(t))
            .collect()
    }
}

/// Whether a token consists solely of punctuation (CJK or ASCII) and whitespace.
pub fn is_punctuation(token: &str) -> bool {
    static PUNCT: OnceLock<Regex> = OnceLock::new();
    let re = PUNCT
        .get_or_init(|| Regex::new(r"^[\p{P}\p{S}\s]+$").expect("valid punctuation pattern"));
    re.is_match(token)
}
