use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static HSK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/chinese/hsk");

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VocabEntry {
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct GrammarPattern {
    pub pattern: String,
    pub english: String,
    pub example: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub english: String,
}

/// Curriculum data for one HSK level.
#[derive(Deserialize, Clone, Debug)]
pub struct HskLevel {
    pub level: u8,
    pub vocab: Vec<VocabEntry>,
    pub grammar: Vec<GrammarPattern>,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

/// Immutable HSK reference library, parsed once and shared by reference.
#[derive(Clone, Debug)]
pub struct Registry {
    levels: BTreeMap<u8, HskLevel>,
}

impl Registry {
    /// Parse every `hsk*.json` file embedded in the binary.
    pub fn load() -> Self {
        let levels = HSK_DIR
            .files()
            .filter(|f| f.path().extension().and_then(|e| e.to_str()) == Some("json"))
            .map(|f| {
                let contents = f
                    .contents_utf8()
                    .expect("Unable to interpret HSK file as a string");
                parse_level(contents).expect("Unable to deserialize HSK json")
            })
            .map(|lvl| (lvl.level, lvl))
            .collect();
        Self { levels }
    }

    pub fn from_levels(levels: impl IntoIterator<Item = HskLevel>) -> Self {
        Self {
            levels: levels.into_iter().map(|l| (l.level, l)).collect(),
        }
    }

    pub fn levels(&self) -> Vec<u8> {
        self.levels.keys().copied().collect()
    }

    pub fn level(&self, level: u8) -> Option<&HskLevel> {
        self.levels.get(&level)
    }

    /// Vocabulary for one level; empty for unknown levels.
    pub fn vocab(&self, level: u8) -> &[VocabEntry] {
        self.level(level).map(|l| l.vocab.as_slice()).unwrap_or(&[])
    }

    pub fn grammar(&self, level: u8) -> &[GrammarPattern] {
        self.level(level).map(|l| l.grammar.as_slice()).unwrap_or(&[])
    }

    /// Look up a word in any level, lowest level first.
    pub fn find(&self, chinese: &str) -> Option<&VocabEntry> {
        self.levels
            .values()
            .flat_map(|l| l.vocab.iter())
            .find(|e| e.chinese == chinese)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::load()
    }
}

pub fn parse_level(json: &str) -> Result<HskLevel, serde_json::Error> {
    serde_json::from_str(json)
}
