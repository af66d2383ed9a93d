use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chinese::VocabEntry;
use crate::generation::GeneratedSentence;
use crate::practice::Card;

/// Placeholder substituted for the hidden word in blanked sentences.
pub const BLANK: &str = "____";

/// A stored (or freshly generated) sentence and the word it demonstrates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSentence {
    pub vocab_word: String,
    pub sentence_zh: String,
    pub sentence_en: String,
}

impl RoundSentence {
    pub fn new(
        vocab_word: impl Into<String>,
        sentence_zh: impl Into<String>,
        sentence_en: impl Into<String>,
    ) -> Self {
        Self {
            vocab_word: vocab_word.into(),
            sentence_zh: sentence_zh.into(),
            sentence_en: sentence_en.into(),
        }
    }

    pub fn from_generated(vocab_word: &str, generated: GeneratedSentence) -> Self {
        Self::new(vocab_word, generated.chinese, generated.english)
    }

    /// The vocabulary word occurs verbatim, so the sentence can be blanked.
    pub fn is_blankable(&self) -> bool {
        !self.vocab_word.is_empty() && self.sentence_zh.contains(&self.vocab_word)
    }
}

/// The kinds of round the generator can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RoundKind {
    Matching,
    FillBlank,
    Scramble,
    ScrambleDecoys,
    Listening,
    Particle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPair {
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
    pub audio_path: Option<String>,
}

impl From<&Card> for MatchingPair {
    fn from(card: &Card) -> Self {
        Self {
            chinese: card.chinese.clone(),
            pinyin: card.pinyin.clone(),
            english: card.english.clone(),
            audio_path: card.audio_path.clone(),
        }
    }
}

impl From<&VocabEntry> for MatchingPair {
    fn from(entry: &VocabEntry) -> Self {
        Self {
            chinese: entry.chinese.clone(),
            pinyin: entry.pinyin.clone(),
            english: entry.english.clone(),
            audio_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingRound {
    pub pairs: Vec<MatchingPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillBlankRound {
    /// Sentence with every occurrence of the word replaced by [`BLANK`]
    pub sentence_zh: String,
    pub sentence_en: String,
    /// Pinyin of the full, unblanked sentence
    pub pinyin_sentence: String,
    pub vocab_word: String,
    pub options: Vec<String>,
    /// Generation was requested but the provider was rate limited
    pub rate_limited: bool,
}

/// A fill-in-blank round plus the sentence the generator produced for it,
/// if any, so the caller can add it to the stored pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillBlankOutcome {
    pub round: FillBlankRound,
    pub generated: Option<RoundSentence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrambleRound {
    pub sentence_en: String,
    /// Tokens in presentation order
    pub words: Vec<String>,
    pub correct_order: Vec<String>,
    pub full_sentence_zh: String,
    pub pinyin_sentence: String,
}

/// Which language the learner reassembles in a decoy scramble.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// English clue, arrange the Chinese tokens
    EnToZh,
    /// Chinese clue, arrange the English words
    ZhToEn,
}

impl Direction {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Direction::EnToZh
        } else {
            Direction::ZhToEn
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrambleDecoysRound {
    pub direction: Direction,
    /// The sentence in the other language, shown as the clue
    pub prompt: String,
    /// Correct tokens and decoys, shuffled together
    pub words: Vec<String>,
    pub correct_order: Vec<String>,
    pub num_correct: usize,
    pub full_sentence_zh: String,
    pub full_sentence_en: String,
    pub pinyin_sentence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningRound {
    pub audio_path: String,
    pub correct: String,
    pub correct_pinyin: String,
    pub correct_english: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleRound {
    /// Sentence with a single particle replaced by [`BLANK`]
    pub sentence: String,
    pub english: String,
    pub pinyin: String,
    pub answer: String,
    pub audio_path: Option<String>,
}

/// Any round, for callers that pick the kind at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Round {
    Matching(MatchingRound),
    FillBlank(FillBlankRound),
    Scramble(ScrambleRound),
    ScrambleDecoys(ScrambleDecoysRound),
    Listening(ListeningRound),
    Particle(ParticleRound),
}
