// Trainer driven against an on-disk database, the way the CLI uses it.

use std::fs;

use lianxi::config::Config;
use lianxi::games::{Round, RoundKind};
use lianxi::practice::QuizType;
use lianxi::store::{CardFilter, Store};
use lianxi::Trainer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

#[test]
fn seeded_deck_adapts_to_mistakes() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path().join("lianxi.db")).unwrap();
    let mut trainer = Trainer::new(store, Config::default());
    assert!(trainer.seed(Some(1)).unwrap() > 0);
    assert_eq!(trainer.seed(Some(1)).unwrap(), 0);

    let mut rng = StdRng::seed_from_u64(21);
    let first = trainer.next_quiz(Some(QuizType::ZhToEn), &[], &mut rng).unwrap();

    // miss one card repeatedly, answer every other card correctly
    let cards = trainer.cards(CardFilter::Active).unwrap();
    for card in &cards {
        let answer = if card.id == first.card_id { "?" } else { card.english.as_str() };
        for _ in 0..5 {
            trainer.submit_answer(card.id, answer, QuizType::ZhToEn).unwrap();
        }
    }

    let hits = (0..300)
        .filter(|_| {
            trainer
                .next_quiz(Some(QuizType::ZhToEn), &[], &mut rng)
                .unwrap()
                .card_id
                == first.card_id
        })
        .count();
    // uniform would give roughly 300 / deck size
    assert!(hits * cards.len() > 300 * 3, "missed card drawn {hits} times");
}

#[test]
fn imported_sentences_feed_rounds() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("sentences.csv");
    fs::write(
        &csv_path,
        "vocab_word,sentence_zh,sentence_en\n\
         猫,我喜欢猫。,I like cats.\n\
         朋友,他是我的朋友。,He is my friend.\n\
         喝,我想喝水。,I want to drink water.\n",
    )
    .unwrap();

    let store = Store::open(dir.path().join("lianxi.db")).unwrap();
    let mut trainer = Trainer::new(store, Config::default());
    assert_eq!(trainer.import_sentences(Some(1), &csv_path).unwrap(), 3);
    assert_eq!(trainer.sentence_count(Some(1)).unwrap(), 3);

    let mut rng = StdRng::seed_from_u64(2);
    let round = trainer
        .round(RoundKind::ScrambleDecoys, Some(1), None, &mut rng)
        .unwrap();
    let Round::ScrambleDecoys(round) = round else {
        panic!("expected a decoy scramble round");
    };
    assert!(round.words.len() > round.num_correct);

    let json = serde_json::to_value(
        trainer.round(RoundKind::Scramble, Some(1), None, &mut rng).unwrap(),
    )
    .unwrap();
    assert_eq!(json["kind"], "scramble");
}
