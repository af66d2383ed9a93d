use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use super::types::ListeningRound;
use super::RoundGenerator;
use crate::chinese::Tokenizer;
use crate::error::{EngineError, Result};
use crate::practice::{assemble_options, backfill_distractors, build_distractors, Card};

impl<T: Tokenizer> RoundGenerator<'_, T> {
    /// Play a card's audio and pick its Chinese text among distractors.
    pub fn listening_round<R>(&self, level: u8, cards: &[Card], rng: &mut R) -> Result<ListeningRound>
    where
        R: Rng + ?Sized,
    {
        let with_audio: Vec<&Card> = cards.iter().filter(|c| c.has_audio()).collect();
        let target = *with_audio
            .choose(rng)
            .ok_or_else(|| EngineError::insufficient("a listening round: no cards with audio"))?;

        let count = self.settings.distractor_count;
        let others: Vec<String> = cards
            .iter()
            .filter(|c| c.id != target.id)
            .map(|c| c.chinese.clone())
            .collect();
        let mut distractors = build_distractors(&target.chinese, &others, count, rng);
        if distractors.len() < count {
            let reference: Vec<String> = self
                .registry
                .vocab(level)
                .iter()
                .map(|e| e.chinese.clone())
                .collect();
            backfill_distractors(&target.chinese, &mut distractors, &reference, count, rng);
            debug!("listening round backfilled to {} distractors from HSK {level}", distractors.len());
        }
        if distractors.is_empty() {
            return Err(EngineError::insufficient(format!(
                "a listening round: no distractors for {:?}",
                target.chinese
            )));
        }

        Ok(ListeningRound {
            audio_path: target.audio_path.clone().unwrap_or_default(),
            correct: target.chinese.clone(),
            correct_pinyin: target.pinyin.clone(),
            correct_english: target.english.clone(),
            options: assemble_options(target.chinese.clone(), distractors, rng),
        })
    }
}
