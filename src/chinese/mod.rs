pub mod phonetic;
pub mod reference;
pub mod segmentation;

// Re-export the main types for convenience
pub use phonetic::{AnnotatedUnit, PhoneticAligner, PinyinReadings, ReadingSource};
pub use reference::{GrammarPattern, HskLevel, Registry, Topic, VocabEntry};
pub use segmentation::{
    is_punctuation, CharTokenizer, JiebaTokenizer, Segmenter, Tokenizer, WordSpan,
};
