use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::weights::{ItemId, PracticeItem};

/// A vocabulary flashcard as stored by the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: ItemId,
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
    pub notes: Option<String>,
    pub audio_path: Option<String>,
    pub image_path: Option<String>,
    pub active: bool,
    pub source: String,
    pub created_at: Option<DateTime<Local>>,
}

impl Card {
    pub fn new(
        id: ItemId,
        chinese: impl Into<String>,
        pinyin: impl Into<String>,
        english: impl Into<String>,
    ) -> Self {
        Self {
            id,
            chinese: chinese.into(),
            pinyin: pinyin.into(),
            english: english.into(),
            notes: None,
            audio_path: None,
            image_path: None,
            active: true,
            source: "manual".to_string(),
            created_at: None,
        }
    }

    /// Playable in a listening round.
    pub fn has_audio(&self) -> bool {
        self.audio_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

impl PracticeItem for Card {
    fn item_id(&self) -> ItemId {
        self.id
    }
}
