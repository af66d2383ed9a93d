use log::warn;
use pinyin::ToPinyin;
use serde::{Deserialize, Serialize};

/// One source character and its reading (empty when the character has none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedUnit {
    pub unit: char,
    pub reading: String,
}

impl AnnotatedUnit {
    pub fn new(unit: char, reading: impl Into<String>) -> Self {
        Self {
            unit,
            reading: reading.into(),
        }
    }

    pub fn bare(unit: char) -> Self {
        Self::new(unit, String::new())
    }

    pub fn has_reading(&self) -> bool {
        !self.reading.is_empty()
    }
}

/// Something that can read a whole string at once.
///
/// Implementations return reading groups: either the reading of a single
/// recognized character, or a run of unrecognized characters echoed verbatim.
pub trait ReadingSource {
    fn reading_groups(&self, text: &str) -> Vec<String>;
}

/// Tone-marked pinyin backed by the `pinyin` crate's dictionary.
///
/// Consecutive characters without a reading are folded into one verbatim group.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinyinReadings;

impl ReadingSource for PinyinReadings {
    fn reading_groups(&self, text: &str) -> Vec<String> {
        let mut groups = Vec::new();
        let mut run = String::new();

        for ch in text.chars() {
            match ch.to_pinyin() {
                Some(p) => {
                    if !run.is_empty() {
                        groups.push(std::mem::take(&mut run));
                    }
                    groups.push(p.with_tone().to_string());
                }
                None => run.push(ch),
            }
        }
        if !run.is_empty() {
            groups.push(run);
        }
        groups
    }
}

/// Maps grouped readings back onto individual source characters.
#[derive(Debug, Clone, Default)]
pub struct PhoneticAligner<S: ReadingSource = PinyinReadings> {
    source: S,
}

impl PhoneticAligner<PinyinReadings> {
    pub fn pinyin() -> Self {
        Self::new(PinyinReadings)
    }
}

impl<S: ReadingSource> PhoneticAligner<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// One `AnnotatedUnit` per character of `text`, in order.
    ///
    /// A group that matches the text at the cursor verbatim is an unrecognized
    /// run and is split into bare units; anything else is the reading of the
    /// single character at the cursor. Equal-looking readings are therefore
    /// attributed to the run, which is a heuristic.
    pub fn align(&self, text: &str) -> Vec<AnnotatedUnit> {
        let chars: Vec<char> = text.chars().collect();
        let mut units = Vec::with_capacity(chars.len());
        let mut pos = 0;

        for group in self.source.reading_groups(text) {
            if pos >= chars.len() {
                warn!("reading source returned more groups than characters in {text:?}");
                break;
            }
            let group_chars: Vec<char> = group.chars().collect();
            let end = pos + group_chars.len();
            if !group_chars.is_empty() && end <= chars.len() && chars[pos..end] == group_chars[..] {
                units.extend(group_chars.into_iter().map(AnnotatedUnit::bare));
                pos = end;
            } else {
                units.push(AnnotatedUnit::new(chars[pos], group));
                pos += 1;
            }
        }

        if pos < chars.len() {
            warn!(
                "reading source left {} trailing characters unread in {text:?}",
                chars.len() - pos
            );
            units.extend(chars[pos..].iter().copied().map(AnnotatedUnit::bare));
        }
        units
    }

    /// Space-joined readings of the recognized characters only.
    pub fn render(&self, text: &str) -> String {
        self.align(text)
            .into_iter()
            .filter(AnnotatedUnit::has_reading)
            .map(|u| u.reading)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
