use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::chinese::{GrammarPattern, VocabEntry};

/// Why the sentence generator could not produce a sentence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation provider is rate limited")]
    RateLimited,
    #[error("generation request timed out")]
    TimedOut,
    #[error("generation provider unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerationError::RateLimited)
    }
}

/// A freshly generated example sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSentence {
    pub chinese: String,
    pub english: String,
    /// Filled in from the `我喜欢{word}。` template instead of a real reply.
    /// Usable for one round, not worth keeping in a sentence pool.
    #[serde(default)]
    pub templated: bool,
}

/// Produces example sentences for a vocabulary word.
pub trait SentenceGenerator {
    fn generate_sentence(
        &self,
        level: u8,
        entry: &VocabEntry,
        hints: &[GrammarPattern],
    ) -> Result<GeneratedSentence, GenerationError>;
}

/// Free-text completion capability of a generation backend.
pub trait TextProvider {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Whether replies come from the local template rather than a model.
    fn templated(&self) -> bool {
        false
    }
}

/// The configured generation backend. Chosen once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local template sentences, no network
    #[default]
    Offline,
    /// Generation switched off; callers always fall back to stored sentences
    Disabled,
}

#[derive(Debug, Clone, Copy)]
pub enum Provider {
    Offline,
    Disabled,
}

impl From<ProviderKind> for Provider {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Offline => Provider::Offline,
            ProviderKind::Disabled => Provider::Disabled,
        }
    }
}

impl TextProvider for Provider {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self {
            Provider::Offline => {
                let word = prompt_field(prompt, "Word:").unwrap_or_default();
                let english = prompt_field(prompt, "Meaning:").unwrap_or_default();
                Ok(format!(
                    "Chinese: {}\nEnglish: {}",
                    template_chinese(word),
                    template_english(english)
                ))
            }
            Provider::Disabled => Err(GenerationError::Unavailable(
                "generation is disabled in configuration".to_string(),
            )),
        }
    }

    fn templated(&self) -> bool {
        matches!(self, Provider::Offline)
    }
}

const MAX_HINTS: usize = 3;

/// Builds a prompt, asks a `TextProvider`, and parses the two-line reply.
#[derive(Debug, Clone)]
pub struct PromptedGenerator<P: TextProvider> {
    provider: P,
}

impl<P: TextProvider> PromptedGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: TextProvider> SentenceGenerator for PromptedGenerator<P> {
    fn generate_sentence(
        &self,
        level: u8,
        entry: &VocabEntry,
        hints: &[GrammarPattern],
    ) -> Result<GeneratedSentence, GenerationError> {
        let prompt = sentence_prompt(level, entry, hints);
        let reply = self.provider.generate(&prompt)?;
        match parse_sentence_reply(&reply) {
            Some(sentence) => Ok(GeneratedSentence {
                templated: self.provider.templated(),
                ..sentence
            }),
            None => {
                warn!("unparsable generation reply for {:?}: {reply:?}", entry.chinese);
                Ok(GeneratedSentence {
                    chinese: template_chinese(&entry.chinese),
                    english: template_english(&entry.english),
                    templated: true,
                })
            }
        }
    }
}

pub fn sentence_prompt(level: u8, entry: &VocabEntry, hints: &[GrammarPattern]) -> String {
    let mut prompt = format!(
        "You are a Mandarin Chinese teaching assistant.\n\
         Generate a natural Chinese sentence using the word below (HSK {level}).\n\
         The sentence should be simple and appropriate for HSK {level} learners.\n\
         Word: {}\n\
         Meaning: {}\n",
        entry.chinese, entry.english
    );
    if !hints.is_empty() {
        prompt.push_str("You may use one of these grammar patterns:\n");
        for hint in hints.iter().take(MAX_HINTS) {
            prompt.push_str(&format!("- {} ({}), e.g. {}\n", hint.pattern, hint.english, hint.example));
        }
    }
    prompt.push_str(
        "Reply in EXACTLY this format (two lines, nothing else):\n\
         Chinese: <full Chinese sentence>\n\
         English: <English translation>",
    );
    debug!("sentence prompt for {:?}: {} hints", entry.chinese, hints.len().min(MAX_HINTS));
    prompt
}

/// Extracts the `Chinese:` and `English:` lines of a reply. Keys are case-insensitive.
pub fn parse_sentence_reply(reply: &str) -> Option<GeneratedSentence> {
    let mut chinese = None;
    let mut english = None;
    for line in reply.lines().map(str::trim) {
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim().to_lowercase().as_str() {
                "chinese" => chinese = Some(value.to_string()),
                "english" => english = Some(value.to_string()),
                _ => {}
            }
        }
    }
    Some(GeneratedSentence {
        chinese: chinese?,
        english: english?,
        templated: false,
    })
}

fn prompt_field<'a>(prompt: &'a str, key: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .map(str::trim)
}

fn template_chinese(word: &str) -> String {
    format!("我喜欢{word}。")
}

fn template_english(english: &str) -> String {
    format!("I like {english}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Result<String, GenerationError>);

    impl TextProvider for Canned {
        fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.0.clone()
        }
    }

    fn cat() -> VocabEntry {
        VocabEntry {
            chinese: "猫".into(),
            pinyin: "māo".into(),
            english: "cat".into(),
        }
    }

    #[test]
    fn test_parse_reply() {
        let reply = "Chinese: 我的猫很可爱。\nenglish:  My cat is cute. ";
        assert_eq!(
            parse_sentence_reply(reply),
            Some(GeneratedSentence {
                chinese: "我的猫很可爱。".into(),
                english: "My cat is cute.".into(),
                templated: false,
            })
        );
    }

    #[test]
    fn test_parse_reply_missing_line() {
        assert_eq!(parse_sentence_reply("Chinese: 我的猫。"), None);
        assert_eq!(parse_sentence_reply("Chinese:\nEnglish: x"), None);
        assert_eq!(parse_sentence_reply(""), None);
    }

    #[test]
    fn test_prompt_mentions_word_and_hints() {
        let hints = vec![GrammarPattern {
            pattern: "很 + adjective".into(),
            english: "very".into(),
            example: "今天很冷。".into(),
        }];
        let prompt = sentence_prompt(1, &cat(), &hints);
        assert!(prompt.contains("Word: 猫"));
        assert!(prompt.contains("HSK 1"));
        assert!(prompt.contains("很 + adjective"));
    }

    #[test]
    fn test_offline_provider_uses_template() {
        let generator = PromptedGenerator::new(Provider::Offline);
        let sentence = generator.generate_sentence(1, &cat(), &[]).unwrap();
        assert_eq!(sentence.chinese, "我喜欢猫。");
        assert_eq!(sentence.english, "I like cat.");
        assert!(sentence.templated);
    }

    #[test]
    fn test_disabled_provider_fails() {
        let generator = PromptedGenerator::new(Provider::from(ProviderKind::Disabled));
        let err = generator.generate_sentence(1, &cat(), &[]).unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_garbled_reply_falls_back_to_template() {
        let generator = PromptedGenerator::new(Canned(Ok("sorry, I can't".into())));
        let sentence = generator.generate_sentence(2, &cat(), &[]).unwrap();
        assert_eq!(sentence.chinese, "我喜欢猫。");
        assert!(sentence.templated);
    }

    #[test]
    fn test_model_reply_is_not_templated() {
        let reply = "Chinese: 猫在睡觉。\nEnglish: The cat is sleeping.";
        let generator = PromptedGenerator::new(Canned(Ok(reply.into())));
        let sentence = generator.generate_sentence(1, &cat(), &[]).unwrap();
        assert_eq!(sentence.chinese, "猫在睡觉。");
        assert!(!sentence.templated);
    }

    #[test]
    fn test_rate_limit_propagates() {
        let generator = PromptedGenerator::new(Canned(Err(GenerationError::RateLimited)));
        let err = generator.generate_sentence(2, &cat(), &[]).unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_provider_kind_serde() {
        assert_eq!(serde_json::to_string(&ProviderKind::Offline).unwrap(), "\"offline\"");
        let kind: ProviderKind = serde_json::from_str("\"disabled\"").unwrap();
        assert_eq!(kind, ProviderKind::Disabled);
    }
}
