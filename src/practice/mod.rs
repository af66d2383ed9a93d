pub mod card;
pub mod distractors;
pub mod quiz;
pub mod weights;

pub use card::Card;
pub use distractors::{assemble_options, backfill_distractors, build_distractors};
pub use quiz::{build_quiz_question, check_answer, QuizAnswer, QuizQuestion, QuizRequest, QuizType};
pub use weights::{
    compute_weights, pick_weighted, weight, ItemId, ItemSelector, PracticeItem, UniformSelector,
    WeightConfig, WeightedSelector, Weights,
};
