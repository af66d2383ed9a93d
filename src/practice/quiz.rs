use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::card::Card;
use super::distractors::{assemble_options, build_distractors};
use super::weights::{ItemId, ItemSelector, Weights};
use crate::error::{EngineError, Result};

/// Which side of the card is shown and which must be picked.
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
pub enum QuizType {
    /// English prompt, pick the Chinese
    EnToZh,
    /// Chinese prompt, pick the English
    ZhToEn,
}

impl QuizType {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            QuizType::EnToZh
        } else {
            QuizType::ZhToEn
        }
    }

    fn prompt_side(self, card: &Card) -> &str {
        match self {
            QuizType::EnToZh => &card.english,
            QuizType::ZhToEn => &card.chinese,
        }
    }

    fn answer_side(self, card: &Card) -> &str {
        match self {
            QuizType::EnToZh => &card.chinese,
            QuizType::ZhToEn => &card.english,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub card_id: ItemId,
    pub quiz_type: QuizType,
    pub prompt: String,
    /// Only set for Chinese prompts (hidden by default in clients).
    pub pinyin: Option<String>,
    pub options: Vec<String>,
    pub audio_path: Option<String>,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub correct: bool,
    pub correct_answer: String,
}

/// Inputs for one quiz draw.
pub struct QuizRequest<'a> {
    pub cards: &'a [Card],
    pub weights: &'a Weights,
    pub quiz_type: Option<QuizType>,
    pub exclude_ids: &'a [ItemId],
    pub distractor_count: usize,
}

/// Pick a card with `selector` and build a multiple-choice question for it.
///
/// Cards listed in `exclude_ids` are skipped as targets but still feed the
/// wrong-answer pool. An exhausted session is reported as insufficient content.
pub fn build_quiz_question<R>(
    request: &QuizRequest<'_>,
    selector: &dyn ItemSelector<Card>,
    rng: &mut R,
) -> Result<QuizQuestion>
where
    R: Rng,
{
    if request.cards.is_empty() {
        return Err(EngineError::insufficient("a quiz: no active cards"));
    }
    let excluded: HashSet<ItemId> = request.exclude_ids.iter().copied().collect();
    let available: Vec<Card> = request
        .cards
        .iter()
        .filter(|c| !excluded.contains(&c.id))
        .cloned()
        .collect();
    if available.is_empty() {
        return Err(EngineError::insufficient("a quiz: every card was already asked"));
    }

    let quiz_type = request.quiz_type.unwrap_or_else(|| QuizType::random(rng));
    let target = selector.pick(&available, request.weights, rng)?;

    let correct = quiz_type.answer_side(target).to_string();
    let wrong_pool: Vec<String> = request
        .cards
        .iter()
        .filter(|c| c.id != target.id)
        .map(|c| quiz_type.answer_side(c).to_string())
        .collect();
    let wrong = build_distractors(&correct, &wrong_pool, request.distractor_count, rng);

    Ok(QuizQuestion {
        card_id: target.id,
        quiz_type,
        prompt: quiz_type.prompt_side(target).to_string(),
        pinyin: (quiz_type == QuizType::ZhToEn).then(|| target.pinyin.clone()),
        options: assemble_options(correct, wrong, rng),
        audio_path: target.audio_path.clone(),
        image_path: target.image_path.clone(),
    })
}

/// Grade an answer against the card's expected side.
pub fn check_answer(card: &Card, answer: &str, quiz_type: QuizType) -> QuizAnswer {
    let correct_answer = quiz_type.answer_side(card).to_string();
    QuizAnswer {
        correct: answer.trim() == correct_answer.trim(),
        correct_answer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::weights::{UniformSelector, WeightedSelector};
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deck() -> Vec<Card> {
        vec![
            Card::new(1, "你好", "nǐ hǎo", "hello"),
            Card::new(2, "谢谢", "xièxie", "thank you"),
            Card::new(3, "猫", "māo", "cat"),
            Card::new(4, "狗", "gǒu", "dog"),
            Card::new(5, "小狗", "xiǎo gǒu", "dog"),
        ]
    }

    fn request<'a>(cards: &'a [Card], weights: &'a Weights, exclude: &'a [ItemId]) -> QuizRequest<'a> {
        QuizRequest {
            cards,
            weights,
            quiz_type: None,
            exclude_ids: exclude,
            distractor_count: 3,
        }
    }

    #[test]
    fn test_question_shape() {
        let cards = deck();
        let weights = Weights::new();
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..50 {
            let q = build_quiz_question(&request(&cards, &weights, &[]), &WeightedSelector, &mut rng)
                .unwrap();
            let target = cards.iter().find(|c| c.id == q.card_id).unwrap();
            let correct = quiz_side(target, q.quiz_type);

            assert!(q.options.contains(&correct));
            assert!(q.options.len() <= 4);
            let unique: HashSet<_> = q.options.iter().collect();
            assert_eq!(unique.len(), q.options.len(), "duplicate options {:?}", q.options);
            match q.quiz_type {
                QuizType::EnToZh => {
                    assert_eq!(q.prompt, target.english);
                    assert!(q.pinyin.is_none());
                }
                QuizType::ZhToEn => {
                    assert_eq!(q.prompt, target.chinese);
                    assert_eq!(q.pinyin.as_deref(), Some(target.pinyin.as_str()));
                }
            }
        }
    }

    fn quiz_side(card: &Card, quiz_type: QuizType) -> String {
        quiz_type.answer_side(card).to_string()
    }

    #[test]
    fn test_shared_english_is_not_offered_twice() {
        // "dog" belongs to two cards; asking for 狗 in ZhToEn must not list it as a distractor.
        let cards = deck();
        let weights: Weights = cards.iter().map(|c| (c.id, if c.id == 4 { 1.0 } else { 0.0001 })).collect();
        let mut rng = StdRng::seed_from_u64(5);
        let mut req = request(&cards, &weights, &[]);
        req.quiz_type = Some(QuizType::ZhToEn);

        for _ in 0..30 {
            let q = build_quiz_question(&req, &WeightedSelector, &mut rng).unwrap();
            let target = cards.iter().find(|c| c.id == q.card_id).unwrap();
            let hits = q.options.iter().filter(|o| **o == target.english).count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn test_excluded_cards_are_not_targets() {
        let cards = deck();
        let weights = Weights::new();
        let exclude = [1, 2, 3, 4];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let q = build_quiz_question(&request(&cards, &weights, &exclude), &UniformSelector, &mut rng)
                .unwrap();
            assert_eq!(q.card_id, 5);
        }
    }

    #[test]
    fn test_exhausted_session() {
        let cards = deck();
        let weights = Weights::new();
        let exclude: Vec<ItemId> = cards.iter().map(|c| c.id).collect();
        let mut rng = StdRng::seed_from_u64(3);
        assert_matches!(
            build_quiz_question(&request(&cards, &weights, &exclude), &WeightedSelector, &mut rng),
            Err(EngineError::ContentInsufficient(_))
        );
        assert_matches!(
            build_quiz_question(&request(&[], &weights, &[]), &WeightedSelector, &mut rng),
            Err(EngineError::ContentInsufficient(_))
        );
    }

    #[test]
    fn test_single_card_has_only_correct_option() {
        let cards = vec![Card::new(1, "猫", "māo", "cat")];
        let weights = Weights::new();
        let mut rng = StdRng::seed_from_u64(3);
        let q = build_quiz_question(&request(&cards, &weights, &[]), &WeightedSelector, &mut rng)
            .unwrap();
        assert_eq!(q.options.len(), 1);
    }

    #[test]
    fn test_check_answer() {
        let card = Card::new(1, "猫", "māo", "cat");
        assert_eq!(
            check_answer(&card, " 猫 ", QuizType::EnToZh),
            QuizAnswer { correct: true, correct_answer: "猫".into() }
        );
        let wrong = check_answer(&card, "dog", QuizType::ZhToEn);
        assert!(!wrong.correct);
        assert_eq!(wrong.correct_answer, "cat");
    }

    #[test]
    fn test_quiz_type_names() {
        assert_eq!(QuizType::EnToZh.to_string(), "en_to_zh");
        assert_eq!(
            serde_json::from_str::<QuizType>("\"en_to_zh\"").unwrap(),
            QuizType::EnToZh
        );
        assert_eq!(serde_json::to_string(&QuizType::ZhToEn).unwrap(), "\"zh_to_en\"");
    }
}
