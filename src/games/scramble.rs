use itertools::Itertools;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use super::types::{Direction, RoundSentence, ScrambleDecoysRound, ScrambleRound};
use super::RoundGenerator;
use crate::chinese::Tokenizer;
use crate::error::{EngineError, Result};

/// Sentences the decoy tiles are drawn from, before widening the search.
const DECOY_SOURCES: usize = 2;
const MIN_DECOY_POOL: usize = 3;

/// Shuffles `items`, retrying up to `attempts` times until the order differs
/// from the input. The last shuffle is kept even if it still matches.
pub fn shuffle_distinct<T, R>(items: &[T], attempts: usize, rng: &mut R) -> Vec<T>
where
    T: Clone + PartialEq,
    R: Rng + ?Sized,
{
    let mut shuffled = items.to_vec();
    if items.len() < 2 {
        return shuffled;
    }
    for _ in 0..attempts.max(1) {
        shuffled.shuffle(rng);
        if shuffled != items {
            break;
        }
    }
    shuffled
}

/// Whitespace-separated English words with surrounding ASCII punctuation removed.
pub fn english_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

impl<T: Tokenizer> RoundGenerator<'_, T> {
    /// A random stored sentence split into word tiles, presented out of order.
    pub fn scramble_round<R>(&self, pool: &[RoundSentence], rng: &mut R) -> Result<ScrambleRound>
    where
        R: Rng + ?Sized,
    {
        let mut order: Vec<&RoundSentence> = pool.iter().collect();
        order.shuffle(rng);

        let (sentence, correct_order) = order
            .into_iter()
            .map(|s| (s, self.segmenter.words(&s.sentence_zh)))
            .find(|(_, words)| !words.is_empty())
            .ok_or_else(|| EngineError::insufficient("a scramble round: no stored sentences"))?;

        let words = shuffle_distinct(&correct_order, self.settings.shuffle_attempts, rng);
        Ok(ScrambleRound {
            sentence_en: sentence.sentence_en.clone(),
            words,
            correct_order,
            full_sentence_zh: sentence.sentence_zh.clone(),
            pinyin_sentence: self.aligner.render(&sentence.sentence_zh),
        })
    }

    /// Like [`scramble_round`](Self::scramble_round), with extra tiles taken
    /// from other stored sentences. Needs at least three sentences.
    pub fn scramble_decoys_round<R>(
        &self,
        pool: &[RoundSentence],
        direction: Option<Direction>,
        rng: &mut R,
    ) -> Result<ScrambleDecoysRound>
    where
        R: Rng + ?Sized,
    {
        if pool.len() < MIN_DECOY_POOL {
            return Err(EngineError::insufficient(format!(
                "a decoy scramble round: {} of {MIN_DECOY_POOL} stored sentences",
                pool.len()
            )));
        }
        let direction = direction.unwrap_or_else(|| Direction::random(rng));

        let mut order: Vec<&RoundSentence> = pool.iter().collect();
        order.shuffle(rng);
        let target_idx = order
            .iter()
            .position(|s| !self.tiles(s, direction).is_empty())
            .ok_or_else(|| {
                EngineError::insufficient("a decoy scramble round: every stored sentence is empty")
            })?;
        let sentence = order.remove(target_idx);
        let correct_order = self.tiles(sentence, direction);
        let correct: HashSet<&str> = correct_order.iter().map(String::as_str).collect();

        let mut candidates: Vec<String> = Vec::new();
        for (used, other) in order.iter().enumerate() {
            candidates.extend(
                self.tiles(other, direction)
                    .into_iter()
                    .filter(|t| !correct.contains(t.as_str())),
            );
            if used + 1 >= DECOY_SOURCES && !candidates.is_empty() {
                break;
            }
        }
        let candidates: Vec<String> = candidates.into_iter().unique().collect();
        if candidates.is_empty() {
            return Err(EngineError::insufficient(
                "a decoy scramble round: no tiles outside the answer",
            ));
        }

        let wanted = (correct_order.len() / 2).max(1).min(candidates.len());
        let decoys: Vec<String> = candidates.choose_multiple(rng, wanted).cloned().collect();
        debug!("decoy scramble: {} tiles, {} decoys", correct_order.len(), decoys.len());

        let mut words = correct_order.clone();
        words.extend(decoys);
        words.shuffle(rng);

        let prompt = match direction {
            Direction::EnToZh => sentence.sentence_en.clone(),
            Direction::ZhToEn => sentence.sentence_zh.clone(),
        };
        Ok(ScrambleDecoysRound {
            direction,
            prompt,
            words,
            num_correct: correct_order.len(),
            correct_order,
            full_sentence_zh: sentence.sentence_zh.clone(),
            full_sentence_en: sentence.sentence_en.clone(),
            pinyin_sentence: self.aligner.render(&sentence.sentence_zh),
        })
    }

    fn tiles(&self, sentence: &RoundSentence, direction: Direction) -> Vec<String> {
        match direction {
            Direction::EnToZh => self.segmenter.words(&sentence.sentence_zh),
            Direction::ZhToEn => english_words(&sentence.sentence_en),
        }
    }
}
