use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use super::types::{FillBlankOutcome, FillBlankRound, RoundSentence, BLANK};
use super::RoundGenerator;
use crate::chinese::{GrammarPattern, Tokenizer};
use crate::error::{EngineError, Result};
use crate::generation::{GenerationError, SentenceGenerator};
use crate::practice::{assemble_options, build_distractors};

const GRAMMAR_HINTS: usize = 3;

impl<T: Tokenizer> RoundGenerator<'_, T> {
    /// A sentence with its vocabulary word blanked out, plus word options.
    ///
    /// Reuses a stored sentence with probability `reuse_stored_probability`,
    /// otherwise asks `generator` for a new one. Generation failures and
    /// generated sentences that cannot be blanked fall back to the stored pool.
    /// Template sentences are played but never offered for storage.
    pub fn fill_blank_round<R>(
        &self,
        level: u8,
        pool: &[RoundSentence],
        generator: &dyn SentenceGenerator,
        rng: &mut R,
    ) -> Result<FillBlankOutcome>
    where
        R: Rng + ?Sized,
    {
        let reuse = !pool.is_empty()
            && rng.gen_bool(self.settings.reuse_stored_probability.clamp(0.0, 1.0));
        let mut rate_limited = false;
        let mut generated = None;

        let mut chosen = if reuse {
            self.sample_blankable(pool, rng)
        } else {
            None
        };

        if chosen.is_none() {
            match self.fresh_sentence(level, generator, rng) {
                Ok(Some((sentence, templated))) => {
                    if templated {
                        debug!("template sentence for {:?}, not keeping it", sentence.vocab_word);
                    } else {
                        generated = Some(sentence.clone());
                    }
                    chosen = Some(sentence);
                }
                Ok(None) => chosen = self.sample_blankable(pool, rng),
                Err(err) => {
                    warn!("sentence generation failed for HSK {level}, using stored pool: {err}");
                    rate_limited = err.is_rate_limited();
                    chosen = self.sample_blankable(pool, rng);
                }
            }
        }

        let sentence = chosen.ok_or_else(|| {
            EngineError::insufficient(format!(
                "a fill-in-blank round: no usable HSK {level} sentence"
            ))
        })?;

        let same_level: Vec<String> = self
            .registry
            .vocab(level)
            .iter()
            .map(|e| e.chinese.clone())
            .collect();
        let distractors = build_distractors(
            &sentence.vocab_word,
            &same_level,
            self.settings.distractor_count,
            rng,
        );
        if distractors.is_empty() {
            return Err(EngineError::insufficient(format!(
                "a fill-in-blank round: no HSK {level} distractors for {:?}",
                sentence.vocab_word
            )));
        }

        let round = FillBlankRound {
            sentence_zh: sentence.sentence_zh.replace(&sentence.vocab_word, BLANK),
            sentence_en: sentence.sentence_en.clone(),
            pinyin_sentence: self.aligner.render(&sentence.sentence_zh),
            options: assemble_options(sentence.vocab_word.clone(), distractors, rng),
            vocab_word: sentence.vocab_word,
            rate_limited,
        };
        Ok(FillBlankOutcome { round, generated })
    }

    /// Tries up to `sentence_pool_samples` random stored sentences and keeps
    /// the first one whose word occurs verbatim.
    fn sample_blankable<R>(&self, pool: &[RoundSentence], rng: &mut R) -> Option<RoundSentence>
    where
        R: Rng + ?Sized,
    {
        let found = pool
            .choose_multiple(rng, self.settings.sentence_pool_samples)
            .find(|s| {
                let ok = s.is_blankable();
                if !ok {
                    warn!("stored sentence {:?} does not contain {:?}", s.sentence_zh, s.vocab_word);
                }
                ok
            })
            .cloned();
        debug!("stored sentence sample: {:?}", found.as_ref().map(|s| &s.vocab_word));
        found
    }

    /// The sentence and whether it came from the template. `Ok(None)` when
    /// there is nothing to ask about or the sentence cannot be blanked.
    fn fresh_sentence<R>(
        &self,
        level: u8,
        generator: &dyn SentenceGenerator,
        rng: &mut R,
    ) -> std::result::Result<Option<(RoundSentence, bool)>, GenerationError>
    where
        R: Rng + ?Sized,
    {
        let Some(entry) = self.registry.vocab(level).choose(rng) else {
            return Ok(None);
        };
        let hints: Vec<GrammarPattern> = self
            .registry
            .grammar(level)
            .choose_multiple(rng, GRAMMAR_HINTS)
            .cloned()
            .collect();

        let generated = generator.generate_sentence(level, entry, &hints)?;
        let templated = generated.templated;
        let sentence = RoundSentence::from_generated(&entry.chinese, generated);
        if sentence.is_blankable() {
            info!("generated HSK {level} sentence for {:?}", entry.chinese);
            Ok(Some((sentence, templated)))
        } else {
            warn!(
                "generated sentence {:?} does not contain {:?}, discarding",
                sentence.sentence_zh, entry.chinese
            );
            Ok(None)
        }
    }
}
