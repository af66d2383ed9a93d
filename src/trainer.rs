use log::{debug, info};
use rand::Rng;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;

use crate::chinese::{AnnotatedUnit, PhoneticAligner, Registry, Segmenter, WordSpan};
use crate::config::Config;
use crate::error::EngineError;
use crate::games::{Direction, Round, RoundGenerator, RoundKind, RoundSettings};
use crate::generation::{PromptedGenerator, Provider};
use crate::practice::{
    build_quiz_question, check_answer, compute_weights, Card, ItemId, ItemSelector, QuizAnswer,
    QuizQuestion, QuizRequest, QuizType, UniformSelector, WeightConfig, WeightedSelector,
};
use crate::store::{CardFilter, CardUpdate, NewCard, Store};

#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no card with id {0}")]
    UnknownCard(ItemId),
    #[error("card {0} is active; deactivate it before deleting")]
    CardActive(ItemId),
    #[error("{0:?} is not in the HSK lists, give its English meaning")]
    MissingMeaning(String),
    #[error("no HSK {0} reference data")]
    UnknownLevel(u8),
}

pub type Result<T> = std::result::Result<T, TrainerError>;

/// Text annotated for display: per-character readings plus word spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub units: Vec<AnnotatedUnit>,
    pub words: Vec<WordSpan>,
}

/// Result of [`Trainer::add_card`].
#[derive(Debug, Clone, PartialEq)]
pub struct AddedCard {
    pub card: Card,
    /// The deck already had a card with this Chinese text; nothing was added.
    pub duplicate: bool,
}

/// Snapshots the store, runs the engine, and writes results back.
pub struct Trainer {
    store: Store,
    registry: Registry,
    config: Config,
    aligner: PhoneticAligner,
    segmenter: Segmenter,
    generator: PromptedGenerator<Provider>,
}

impl Trainer {
    pub fn new(store: Store, config: Config) -> Self {
        Self::with_registry(store, Registry::load(), config)
    }

    pub fn with_registry(store: Store, registry: Registry, config: Config) -> Self {
        let generator = PromptedGenerator::new(Provider::from(config.provider));
        debug!("trainer using {:?} sentence provider", config.provider);
        Self {
            store,
            registry,
            config,
            aligner: PhoneticAligner::pinyin(),
            segmenter: Segmenter::jieba(),
            generator,
        }
    }

    fn level_or_default(&self, level: Option<u8>) -> u8 {
        level.unwrap_or(self.config.default_level)
    }

    pub fn annotate(&self, text: &str) -> Result<Annotation> {
        Ok(Annotation {
            text: text.to_string(),
            units: self.aligner.align(text),
            words: self.segmenter.boundaries(text)?,
        })
    }

    /// Add a card unless one with the same Chinese already exists. Missing
    /// pinyin and English come from the HSK lists; pinyin falls back to
    /// the aligner for words outside them.
    pub fn add_card(&self, mut card: NewCard) -> Result<AddedCard> {
        card.chinese = card.chinese.trim().to_string();
        if let Some(existing) = self.store.card_by_chinese(&card.chinese)? {
            debug!("card {} already holds {:?}", existing.id, card.chinese);
            return Ok(AddedCard {
                card: existing,
                duplicate: true,
            });
        }

        let reference = self.registry.find(&card.chinese);
        if card.english.trim().is_empty() {
            card.english = reference
                .map(|e| e.english.clone())
                .ok_or_else(|| TrainerError::MissingMeaning(card.chinese.clone()))?;
        }
        if card.pinyin.trim().is_empty() {
            card.pinyin = match reference {
                Some(entry) => entry.pinyin.clone(),
                None => self.aligner.render(&card.chinese),
            };
        }
        Ok(AddedCard {
            card: self.store.add_card(&card)?,
            duplicate: false,
        })
    }

    pub fn cards(&self, filter: CardFilter) -> Result<Vec<Card>> {
        Ok(self.store.cards(filter)?)
    }

    fn existing_card(&self, id: ItemId) -> Result<Card> {
        self.store.card(id)?.ok_or(TrainerError::UnknownCard(id))
    }

    pub fn update_card(&self, id: ItemId, update: &CardUpdate) -> Result<Card> {
        if !self.store.update_card(id, update)? {
            return Err(TrainerError::UnknownCard(id));
        }
        self.existing_card(id)
    }

    /// Inactive cards stay in the deck but are never quizzed or played.
    pub fn set_active(&self, id: ItemId, active: bool) -> Result<()> {
        if !self.store.set_active(id, active)? {
            return Err(TrainerError::UnknownCard(id));
        }
        info!("card {id} {}", if active { "activated" } else { "deactivated" });
        Ok(())
    }

    /// Remove a deactivated card and its quiz history.
    pub fn delete_card(&mut self, id: ItemId) -> Result<()> {
        if self.existing_card(id)?.active {
            return Err(TrainerError::CardActive(id));
        }
        self.store.delete_card(id)?;
        info!("deleted card {id}");
        Ok(())
    }

    /// Point a card at an audio file of its pronunciation, making it
    /// playable in listening rounds. The path is stored absolute.
    pub fn attach_audio<P: AsRef<Path>>(&self, id: ItemId, path: P) -> Result<Card> {
        let path = fs::canonicalize(path)?;
        if !self.store.set_audio_path(id, &path.to_string_lossy())? {
            return Err(TrainerError::UnknownCard(id));
        }
        self.existing_card(id)
    }

    /// Next quiz question, favouring cards the learner keeps missing
    /// unless `random_cards` is set.
    pub fn next_quiz<R: Rng>(
        &self,
        quiz_type: Option<QuizType>,
        exclude_ids: &[ItemId],
        rng: &mut R,
    ) -> Result<QuizQuestion> {
        let cards = self.store.active_cards()?;
        let histories = self.store.histories(self.config.window_size)?;
        let weight_config = WeightConfig {
            window_size: self.config.window_size,
            min_weight: self.config.min_weight,
        };
        let weights = compute_weights(
            histories.iter().map(|(id, h)| (*id, h.as_slice())),
            &weight_config,
        );

        let selector: Box<dyn ItemSelector<Card>> = if self.config.random_cards {
            Box::new(UniformSelector)
        } else {
            Box::new(WeightedSelector)
        };
        let request = QuizRequest {
            cards: &cards,
            weights: &weights,
            quiz_type,
            exclude_ids,
            distractor_count: self.config.distractor_count,
        };
        Ok(build_quiz_question(&request, selector.as_ref(), rng)?)
    }

    /// Grade an answer and record the attempt.
    pub fn submit_answer(
        &self,
        card_id: ItemId,
        answer: &str,
        quiz_type: QuizType,
    ) -> Result<QuizAnswer> {
        let card = self.existing_card(card_id)?;
        let result = check_answer(&card, answer, quiz_type);
        self.store
            .record_attempt(card_id, result.correct, &quiz_type.to_string())?;
        Ok(result)
    }

    /// Outcomes of the card's last `window_size` attempts, newest first.
    pub fn recent_outcomes(&self, card_id: ItemId) -> Result<Vec<bool>> {
        Ok(self.store.recent_outcomes(card_id, self.config.window_size)?)
    }

    /// Build a round of `kind`. Freshly generated fill-in-blank sentences
    /// are added to the level's pool; template sentences are not.
    pub fn round<R: Rng>(
        &self,
        kind: RoundKind,
        level: Option<u8>,
        direction: Option<Direction>,
        rng: &mut R,
    ) -> Result<Round> {
        let level = self.level_or_default(level);
        let games = RoundGenerator::new(
            &self.registry,
            &self.aligner,
            &self.segmenter,
            RoundSettings::from(&self.config),
        );

        let round = match kind {
            RoundKind::Matching => {
                Round::Matching(games.matching_round(level, &self.store.active_cards()?, rng)?)
            }
            RoundKind::FillBlank => {
                let pool = self.store.sentences(level)?;
                let outcome = games.fill_blank_round(level, &pool, &self.generator, rng)?;
                if let Some(sentence) = &outcome.generated {
                    self.store.insert_sentence(level, sentence)?;
                    info!("stored generated sentence for {:?}", sentence.vocab_word);
                }
                Round::FillBlank(outcome.round)
            }
            RoundKind::Scramble => {
                Round::Scramble(games.scramble_round(&self.store.sentences(level)?, rng)?)
            }
            RoundKind::ScrambleDecoys => Round::ScrambleDecoys(games.scramble_decoys_round(
                &self.store.sentences(level)?,
                direction,
                rng,
            )?),
            RoundKind::Listening => {
                Round::Listening(games.listening_round(level, &self.store.active_cards()?, rng)?)
            }
            RoundKind::Particle => {
                Round::Particle(games.particle_round(&self.store.sentences(level)?, rng)?)
            }
        };
        Ok(round)
    }

    pub fn seed(&mut self, level: Option<u8>) -> Result<usize> {
        let level = self.level_or_default(level);
        if !self.registry.levels().contains(&level) {
            return Err(TrainerError::UnknownLevel(level));
        }
        Ok(self.store.seed_cards(&self.registry, level)?)
    }

    pub fn import_sentences<P: AsRef<Path>>(&mut self, level: Option<u8>, path: P) -> Result<usize> {
        let level = self.level_or_default(level);
        let file = File::open(path)?;
        Ok(self.store.import_sentences_csv(level, file)?)
    }

    pub fn sentence_count(&self, level: Option<u8>) -> Result<usize> {
        Ok(self.store.sentence_count(self.level_or_default(level))?)
    }
}
