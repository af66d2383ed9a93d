pub mod fill_blank;
pub mod listening;
pub mod matching;
pub mod particle;
pub mod scramble;
pub mod types;

pub use scramble::{english_words, shuffle_distinct};
pub use types::{
    Direction, FillBlankOutcome, FillBlankRound, ListeningRound, MatchingPair, MatchingRound,
    ParticleRound, Round, RoundKind, RoundSentence, ScrambleDecoysRound, ScrambleRound, BLANK,
};

use crate::chinese::{JiebaTokenizer, PhoneticAligner, Registry, Segmenter, Tokenizer};
use crate::config::Config;

/// Tunables shared by all round builders.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSettings {
    /// Chance of reusing a stored sentence before asking the generator
    pub reuse_stored_probability: f64,
    /// Stored sentences tried before giving up on a blankable one
    pub sentence_pool_samples: usize,
    pub shuffle_attempts: usize,
    pub distractor_count: usize,
    pub matching_pairs: usize,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            reuse_stored_probability: 0.7,
            sentence_pool_samples: 5,
            shuffle_attempts: 10,
            distractor_count: 3,
            matching_pairs: 4,
        }
    }
}

impl From<&Config> for RoundSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            reuse_stored_probability: cfg.reuse_stored_probability,
            sentence_pool_samples: cfg.sentence_pool_samples,
            shuffle_attempts: cfg.shuffle_attempts,
            distractor_count: cfg.distractor_count,
            matching_pairs: cfg.matching_pairs,
        }
    }
}

/// Builds gameplay rounds from caller-supplied snapshots.
///
/// Holds only shared references to the static registry and the text tools;
/// every round is a function of its arguments plus the injected RNG.
pub struct RoundGenerator<'a, T: Tokenizer = JiebaTokenizer> {
    registry: &'a Registry,
    aligner: &'a PhoneticAligner,
    segmenter: &'a Segmenter<T>,
    settings: RoundSettings,
}

impl<'a, T: Tokenizer> RoundGenerator<'a, T> {
    pub fn new(
        registry: &'a Registry,
        aligner: &'a PhoneticAligner,
        segmenter: &'a Segmenter<T>,
        settings: RoundSettings,
    ) -> Self {
        Self {
            registry,
            aligner,
            segmenter,
            settings,
        }
    }
}
