use chrono::{DateTime, Local};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::chinese::Registry;
use crate::games::RoundSentence;
use crate::practice::{Card, ItemId};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS flashcards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chinese TEXT NOT NULL,
        pinyin TEXT NOT NULL,
        english TEXT NOT NULL,
        notes TEXT,
        audio_path TEXT,
        image_path TEXT,
        active BOOLEAN NOT NULL DEFAULT 1,
        source TEXT NOT NULL DEFAULT 'manual',
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS flashcard_attempts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        card_id INTEGER NOT NULL REFERENCES flashcards(id),
        correct BOOLEAN NOT NULL,
        quiz_type TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_flashcard_attempts_card ON flashcard_attempts(card_id);

    CREATE TABLE IF NOT EXISTS game_sentences (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        hsk_level INTEGER NOT NULL,
        vocab_word TEXT NOT NULL,
        sentence_zh TEXT NOT NULL,
        sentence_en TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_game_sentences_level ON game_sentences(hsk_level);
"#;

const CARD_COLUMNS: &str =
    "id, chinese, pinyin, english, notes, audio_path, image_path, active, source, created_at";

/// Card fields supplied by the user when adding a card.
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
    pub notes: Option<String>,
    pub source: Option<String>,
}

/// Card fields to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardUpdate {
    pub chinese: Option<String>,
    pub pinyin: Option<String>,
    pub english: Option<String>,
    pub notes: Option<String>,
    pub active: Option<bool>,
}

impl CardUpdate {
    pub fn is_empty(&self) -> bool {
        *self == CardUpdate::default()
    }
}

/// Which cards [`Store::cards`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl CardFilter {
    fn clause(self) -> &'static str {
        match self {
            CardFilter::All => "",
            CardFilter::Active => "WHERE active = 1",
            CardFilter::Inactive => "WHERE active = 0",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SentenceRecord {
    vocab_word: String,
    sentence_zh: String,
    sentence_en: String,
}

/// SQLite-backed persistence for cards, quiz attempts and sentence pools.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path` and its parent directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    pub fn add_card(&self, card: &NewCard) -> Result<Card> {
        let created_at = Local::now();
        let source = card.source.clone().unwrap_or_else(|| "manual".to_string());
        self.conn.execute(
            r#"
            INSERT INTO flashcards (chinese, pinyin, english, notes, source, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                card.chinese,
                card.pinyin,
                card.english,
                card.notes,
                source,
                created_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("added card {id} {:?}", card.chinese);
        Ok(Card {
            notes: card.notes.clone(),
            source,
            created_at: Some(created_at),
            ..Card::new(id, card.chinese.clone(), card.pinyin.clone(), card.english.clone())
        })
    }

    pub fn cards(&self, filter: CardFilter) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM flashcards {} ORDER BY id",
            filter.clause()
        ))?;
        let cards = stmt.query_map([], card_from_row)?;
        cards.collect()
    }

    pub fn active_cards(&self) -> Result<Vec<Card>> {
        self.cards(CardFilter::Active)
    }

    /// The oldest card whose Chinese text is exactly `chinese`.
    pub fn card_by_chinese(&self, chinese: &str) -> Result<Option<Card>> {
        self.conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM flashcards WHERE chinese = ?1 ORDER BY id LIMIT 1"),
                [chinese],
                card_from_row,
            )
            .optional()
    }

    pub fn card(&self, id: ItemId) -> Result<Option<Card>> {
        self.conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM flashcards WHERE id = ?1"),
                [id],
                card_from_row,
            )
            .optional()
    }

    pub fn set_audio_path(&self, id: ItemId, audio_path: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE flashcards SET audio_path = ?1 WHERE id = ?2",
            params![audio_path, id],
        )?;
        Ok(changed > 0)
    }

    pub fn set_active(&self, id: ItemId, active: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE flashcards SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(changed > 0)
    }

    /// Apply the set fields of `update`. Returns false when no such card exists.
    pub fn update_card(&self, id: ItemId, update: &CardUpdate) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE flashcards SET
                chinese = COALESCE(?1, chinese),
                pinyin = COALESCE(?2, pinyin),
                english = COALESCE(?3, english),
                notes = COALESCE(?4, notes),
                active = COALESCE(?5, active)
            WHERE id = ?6
            "#,
            params![
                update.chinese,
                update.pinyin,
                update.english,
                update.notes,
                update.active,
                id
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete an inactive card together with its attempts. Active and
    /// unknown cards are left untouched and reported as `false`.
    pub fn delete_card(&mut self, id: ItemId) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM flashcards WHERE id = ?1 AND active = 0", [id])?;
        if deleted == 0 {
            return Ok(false);
        }
        let attempts = tx.execute("DELETE FROM flashcard_attempts WHERE card_id = ?1", [id])?;
        tx.commit()?;
        debug!("deleted card {id} and {attempts} attempts");
        Ok(true)
    }

    pub fn record_attempt(&self, card_id: ItemId, correct: bool, quiz_type: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO flashcard_attempts (card_id, correct, quiz_type, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![card_id, correct, quiz_type, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Up to `limit` outcomes for one card, most recent first.
    pub fn recent_outcomes(&self, card_id: ItemId, limit: usize) -> Result<Vec<bool>> {
        let mut stmt = self.conn.prepare(
            "SELECT correct FROM flashcard_attempts WHERE card_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let outcomes = stmt.query_map(params![card_id, limit as i64], |row| row.get(0))?;
        outcomes.collect()
    }

    /// Outcome history of every attempted active card, most recent first,
    /// each capped at `limit` entries.
    pub fn histories(&self, limit: usize) -> Result<HashMap<ItemId, Vec<bool>>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT card_id, correct FROM (
                SELECT a.id, a.card_id, a.correct,
                       ROW_NUMBER() OVER (PARTITION BY a.card_id ORDER BY a.id DESC) AS recency
                FROM flashcard_attempts a
                JOIN flashcards f ON f.id = a.card_id
                WHERE f.active = 1
            )
            WHERE recency <= ?1
            ORDER BY card_id, id DESC
            "#,
        )?;
        let rows = stmt.query_map([limit as i64], |row| {
            Ok((row.get::<_, ItemId>(0)?, row.get::<_, bool>(1)?))
        })?;

        let mut histories: HashMap<ItemId, Vec<bool>> = HashMap::new();
        for row in rows {
            let (card_id, correct) = row?;
            histories.entry(card_id).or_default().push(correct);
        }
        Ok(histories)
    }

    pub fn sentences(&self, level: u8) -> Result<Vec<RoundSentence>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT vocab_word, sentence_zh, sentence_en
            FROM game_sentences
            WHERE hsk_level = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([level], |row| {
            Ok(RoundSentence {
                vocab_word: row.get(0)?,
                sentence_zh: row.get(1)?,
                sentence_en: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    pub fn insert_sentence(&self, level: u8, sentence: &RoundSentence) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO game_sentences (hsk_level, vocab_word, sentence_zh, sentence_en, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                level,
                sentence.vocab_word,
                sentence.sentence_zh,
                sentence.sentence_en,
                Local::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn sentence_count(&self, level: u8) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM game_sentences WHERE hsk_level = ?1",
            [level],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn card_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM flashcards", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Fill an empty deck with the reference vocabulary of `level`.
    /// Returns how many cards were added; a non-empty deck is left alone.
    pub fn seed_cards(&mut self, registry: &Registry, level: u8) -> Result<usize> {
        if self.card_count()? > 0 {
            debug!("deck not empty, skipping seed");
            return Ok(0);
        }
        let created_at = Local::now().to_rfc3339();
        let source = format!("hsk{level}");
        let vocab = registry.vocab(level);

        let tx = self.conn.transaction()?;
        for entry in vocab {
            tx.execute(
                r#"
                INSERT INTO flashcards (chinese, pinyin, english, source, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![entry.chinese, entry.pinyin, entry.english, source, created_at],
            )?;
        }
        tx.commit()?;
        info!("seeded {} cards from HSK {level}", vocab.len());
        Ok(vocab.len())
    }

    /// Bulk-load sentences from CSV with headers `vocab_word,sentence_zh,sentence_en`.
    /// Malformed records are skipped; returns how many rows were stored.
    pub fn import_sentences_csv<R: Read>(&mut self, level: u8, reader: R) -> Result<usize> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let tx = self.conn.transaction()?;
        let created_at = Local::now().to_rfc3339();
        let mut imported = 0;

        for (line, record) in csv_reader.deserialize::<SentenceRecord>().enumerate() {
            let record = match record {
                Ok(r) if !r.sentence_zh.is_empty() => r,
                Ok(_) => continue,
                Err(e) => {
                    warn!("skipping sentence row {}: {e}", line + 2);
                    continue;
                }
            };
            tx.execute(
                r#"
                INSERT INTO game_sentences (hsk_level, vocab_word, sentence_zh, sentence_en, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    level,
                    record.vocab_word,
                    record.sentence_zh,
                    record.sentence_en,
                    created_at
                ],
            )?;
            imported += 1;
        }
        tx.commit()?;
        info!("imported {imported} HSK {level} sentences");
        Ok(imported)
    }
}

fn card_from_row(row: &Row<'_>) -> Result<Card> {
    let created_at: String = row.get(9)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(9, "created_at".to_string(), rusqlite::types::Type::Text)
        })?
        .with_timezone(&Local);
    Ok(Card {
        id: row.get(0)?,
        chinese: row.get(1)?,
        pinyin: row.get(2)?,
        english: row.get(3)?,
        notes: row.get(4)?,
        audio_path: row.get(5)?,
        image_path: row.get(6)?,
        active: row.get(7)?,
        source: row.get(8)?,
        created_at: Some(created_at),
    })
}
