use itertools::Itertools;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use super::types::{MatchingPair, MatchingRound};
use super::RoundGenerator;
use crate::chinese::{Tokenizer, VocabEntry};
use crate::error::{EngineError, Result};
use crate::practice::Card;

impl<T: Tokenizer> RoundGenerator<'_, T> {
    /// Up to `matching_pairs` distinct pairs, live cards first, topped up
    /// from the level's reference vocabulary. Pairs are distinct by Chinese text.
    pub fn matching_round<R>(&self, level: u8, cards: &[Card], rng: &mut R) -> Result<MatchingRound>
    where
        R: Rng + ?Sized,
    {
        let wanted = self.settings.matching_pairs;
        let live: Vec<&Card> = cards
            .iter()
            .filter(|c| c.active)
            .unique_by(|c| c.chinese.as_str())
            .collect();

        let mut pairs: Vec<MatchingPair> = live
            .choose_multiple(rng, wanted)
            .map(|c| MatchingPair::from(*c))
            .collect();

        if pairs.len() < wanted {
            let mut seen: HashSet<String> = pairs.iter().map(|p| p.chinese.clone()).collect();
            let mut reference: Vec<&VocabEntry> = self.registry.vocab(level).iter().collect();
            reference.shuffle(rng);
            let before = pairs.len();
            for entry in reference {
                if pairs.len() >= wanted {
                    break;
                }
                if seen.insert(entry.chinese.clone()) {
                    pairs.push(MatchingPair::from(entry));
                }
            }
            debug!(
                "matching round: {} live pairs, {} from HSK {level}",
                before,
                pairs.len() - before
            );
        }

        if pairs.is_empty() {
            return Err(EngineError::insufficient(format!(
                "a matching round: no cards and no HSK {level} vocabulary"
            )));
        }
        pairs.shuffle(rng);
        Ok(MatchingRound { pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chinese::{CharTokenizer, HskLevel, PhoneticAligner, Registry, Segmenter};
    use crate::games::RoundSettings;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entry(chinese: &str, english: &str) -> VocabEntry {
        VocabEntry {
            chinese: chinese.into(),
            pinyin: String::new(),
            english: english.into(),
        }
    }

    fn registry(vocab: Vec<VocabEntry>) -> Registry {
        Registry::from_levels([HskLevel {
            level: 1,
            vocab,
            grammar: vec![],
            topics: vec![],
        }])
    }

    fn distinct(round: &MatchingRound) -> usize {
        round.pairs.iter().map(|p| p.chinese.as_str()).collect::<HashSet<_>>().len()
    }

    #[test]
    fn test_live_cards_preferred() {
        let registry = registry(vec![entry("水", "water"), entry("茶", "tea")]);
        let aligner = PhoneticAligner::pinyin();
        let segmenter = Segmenter::new(CharTokenizer);
        let games = RoundGenerator::new(&registry, &aligner, &segmenter, RoundSettings::default());
        let cards: Vec<Card> = ["一", "二", "三", "四", "五"]
            .iter()
            .enumerate()
            .map(|(i, c)| Card::new(i as i64, *c, "", "n"))
            .collect();

        let mut rng = StdRng::seed_from_u64(1);
        let round = games.matching_round(1, &cards, &mut rng).unwrap();
        assert_eq!(round.pairs.len(), 4);
        assert_eq!(distinct(&round), 4);
        assert!(round.pairs.iter().all(|p| cards.iter().any(|c| c.chinese == p.chinese)));
    }

    #[test]
    fn test_backfill_skips_duplicates() {
        let registry = registry(vec![entry("猫", "cat"), entry("狗", "dog"), entry("鱼", "fish")]);
        let aligner = PhoneticAligner::pinyin();
        let segmenter = Segmenter::new(CharTokenizer);
        let games = RoundGenerator::new(&registry, &aligner, &segmenter, RoundSettings::default());
        let cards = vec![
            Card::new(1, "猫", "māo", "cat"),
            Card::new(2, "猫", "māo", "kitty"),
        ];

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let round = games.matching_round(1, &cards, &mut rng).unwrap();
            // 猫, 狗, 鱼 are all there is
            assert_eq!(round.pairs.len(), 3);
            assert_eq!(distinct(&round), 3);
        }
    }

    #[test]
    fn test_inactive_cards_ignored() {
        let registry = registry(vec![]);
        let aligner = PhoneticAligner::pinyin();
        let segmenter = Segmenter::new(CharTokenizer);
        let games = RoundGenerator::new(&registry, &aligner, &segmenter, RoundSettings::default());
        let mut card = Card::new(1, "猫", "māo", "cat");
        card.active = false;

        let mut rng = StdRng::seed_from_u64(1);
        assert_matches!(
            games.matching_round(1, &[card], &mut rng),
            Err(EngineError::ContentInsufficient(_))
        );
    }
}
