use rand::seq::SliceRandom;
use rand::Rng;

use super::types::{ParticleRound, RoundSentence, BLANK};
use super::RoundGenerator;
use crate::chinese::Tokenizer;
use crate::error::{EngineError, Result};

/// The structural particles de: attributive, complement and adverbial.
pub const PARTICLES: [char; 3] = ['的', '得', '地'];

impl<T: Tokenizer> RoundGenerator<'_, T> {
    /// Blank one 的/得/地 in a stored sentence; the answer is the particle.
    pub fn particle_round<R>(&self, pool: &[RoundSentence], rng: &mut R) -> Result<ParticleRound>
    where
        R: Rng + ?Sized,
    {
        let candidates: Vec<&RoundSentence> = pool
            .iter()
            .filter(|s| s.sentence_zh.contains(&PARTICLES[..]))
            .collect();
        let sentence = *candidates.choose(rng).ok_or_else(|| {
            EngineError::insufficient("a particle round: no stored sentence uses 的/得/地")
        })?;

        let text = &sentence.sentence_zh;
        let hits: Vec<(usize, &str)> = text.match_indices(&PARTICLES[..]).collect();
        let &(idx, particle) = hits
            .choose(rng)
            .ok_or(EngineError::Precondition("particle sentence without particle"))?;

        Ok(ParticleRound {
            sentence: format!("{}{BLANK}{}", &text[..idx], &text[idx + particle.len()..]),
            english: sentence.sentence_en.clone(),
            pinyin: self.aligner.render(text),
            answer: particle.to_string(),
            audio_path: None,
        })
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

    #[test]
    fn test_single_particle_blanked() {
        let registry = Registry::from_levels(Vec::<HskLevel>::new());
        let aligner = PhoneticAligner::pinyin();
        let segmenter = Segmenter::new(CharTokenizer);
        let games = RoundGenerator::new(&registry, &aligner, &segmenter, RoundSettings::default());
        let pool = vec![
            RoundSentence::new("猫", "我喜欢猫。", "I like cats."),
            RoundSentence::new("跑", "他跑得很快地走了的。", "..."),
        ];

        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let round = games.particle_round(&pool, &mut rng).unwrap();
            assert_eq!(round.sentence.matches(BLANK).count(), 1);
            assert!(PARTICLES.iter().any(|p| round.answer == p.to_string()));
            // two of the three particles remain
            let left = round.sentence.chars().filter(|c| PARTICLES.contains(c)).count();
            assert_eq!(left, 2);
            assert_eq!(round.sentence.replace(BLANK, &round.answer), "他跑得很快地走了的。");
        }
    }

    #[test]
    fn test_no_particle_sentence() {
        let registry = Registry::from_levels(Vec::<HskLevel>::new());
        let aligner = PhoneticAligner::pinyin();
        let segmenter = Segmenter::new(CharTokenizer);
        let games = RoundGenerator::new(&registry, &aligner, &segmenter, RoundSettings::default());
        let pool = vec![RoundSentence::new("猫", "我喜欢猫。", "I like cats.")];

        let mut rng = StdRng::seed_from_u64(1);
        assert_matches!(
            games.particle_round(&pool, &mut rng),
            Err(EngineError::ContentInsufficient(_))
        );
    }
}
