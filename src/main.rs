use clap::{Parser, Subcommand};
use lianxi::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    games::{Direction, RoundKind},
    practice::{Card, ItemId, QuizType},
    store::{CardFilter, CardUpdate, NewCard, Store},
    trainer::{Annotation, Trainer},
};
use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// chinese practice from the terminal: annotated text, adaptive flashcards and word games
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Annotate Chinese text with pinyin and word boundaries, drill flashcards that adapt to your mistakes, and generate HSK practice rounds."
)]
pub struct Cli {
    /// database file to use instead of the default state directory
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// print pinyin above each character, then the word boundaries
    Annotate { text: String },

    /// add a flashcard; pinyin and English are looked up in the HSK lists when omitted
    Add {
        chinese: String,
        english: Option<String>,
        #[clap(short = 'p', long)]
        pinyin: Option<String>,
        #[clap(long)]
        notes: Option<String>,
    },

    /// list the cards in the deck
    List {
        /// only cards that are quizzed and played
        #[clap(long, conflicts_with = "inactive")]
        active: bool,
        /// only deactivated cards
        #[clap(long)]
        inactive: bool,
    },

    /// change fields of a card
    Edit {
        id: ItemId,
        #[clap(long)]
        chinese: Option<String>,
        #[clap(short = 'p', long)]
        pinyin: Option<String>,
        #[clap(long)]
        english: Option<String>,
        #[clap(long)]
        notes: Option<String>,
    },

    /// put a deactivated card back into practice
    Activate { id: ItemId },

    /// keep a card but stop quizzing it
    Deactivate { id: ItemId },

    /// delete a deactivated card and its quiz history
    Delete { id: ItemId },

    /// attach a pronunciation recording, used by listening rounds
    Audio { id: ItemId, path: PathBuf },

    /// build a practice round and print it as JSON
    Round {
        #[clap(value_enum)]
        kind: RoundKind,

        /// HSK level (defaults to the configured level)
        #[clap(short = 'l', long)]
        level: Option<u8>,

        /// which language to unscramble in scramble-decoys rounds
        #[clap(short = 'd', long, value_enum)]
        direction: Option<Direction>,
    },

    /// multiple-choice flashcard quiz, answered on stdin
    Quiz {
        #[clap(short = 't', long, value_enum)]
        quiz_type: Option<QuizType>,

        /// number of questions to ask
        #[clap(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// fill an empty deck from the HSK vocabulary
    Seed {
        #[clap(short = 'l', long)]
        level: Option<u8>,
    },

    /// import example sentences from a CSV file (vocab_word,sentence_zh,sentence_en)
    Import {
        csv: PathBuf,
        #[clap(short = 'l', long)]
        level: Option<u8>,
    },

    /// number of stored example sentences for a level
    Count {
        #[clap(short = 'l', long)]
        level: Option<u8>,
    },

    /// print the config file location and the settings in effect
    Config {
        /// write the settings in effect to the config file
        #[clap(long)]
        init: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = config_store.load();
    let db_path = AppDirs::resolve_db_path(cli.db.as_deref(), config.db_path.as_deref());
    let store = Store::open(&db_path)?;
    let mut trainer = Trainer::new(store, config.clone());
    let mut rng = rand::thread_rng();

    match cli.command {
        Command::Annotate { text } => {
            print_annotation(&trainer.annotate(&text)?);
        }
        Command::Add {
            chinese,
            english,
            pinyin,
            notes,
        } => {
            let added = trainer.add_card(NewCard {
                chinese,
                pinyin: pinyin.unwrap_or_default(),
                english: english.unwrap_or_default(),
                notes,
                source: None,
            })?;
            let verb = if added.duplicate { "already have" } else { "added" };
            println!("{verb} card {}", card_line(&added.card));
        }
        Command::List { active, inactive } => {
            let filter = match (active, inactive) {
                (true, _) => CardFilter::Active,
                (_, true) => CardFilter::Inactive,
                _ => CardFilter::All,
            };
            for card in trainer.cards(filter)? {
                println!("{}", card_line(&card));
            }
        }
        Command::Edit {
            id,
            chinese,
            pinyin,
            english,
            notes,
        } => {
            let update = CardUpdate {
                chinese,
                pinyin,
                english,
                notes,
                active: None,
            };
            if update.is_empty() {
                return Err("nothing to change; pass --chinese, --pinyin, --english or --notes".into());
            }
            println!("updated card {}", card_line(&trainer.update_card(id, &update)?));
        }
        Command::Activate { id } => {
            trainer.set_active(id, true)?;
            println!("activated card {id}");
        }
        Command::Deactivate { id } => {
            trainer.set_active(id, false)?;
            println!("deactivated card {id}");
        }
        Command::Delete { id } => {
            trainer.delete_card(id)?;
            println!("deleted card {id}");
        }
        Command::Audio { id, path } => {
            let card = trainer.attach_audio(id, &path)?;
            println!("card {} plays {}", card.id, card.audio_path.unwrap_or_default());
        }
        Command::Round {
            kind,
            level,
            direction,
        } => {
            let round = trainer.round(kind, level, direction, &mut rng)?;
            println!("{}", serde_json::to_string_pretty(&round)?);
        }
        Command::Quiz { quiz_type, count } => {
            run_quiz(&trainer, quiz_type, count, &mut rng)?;
        }
        Command::Seed { level } => {
            let added = trainer.seed(level)?;
            println!("seeded {added} cards");
        }
        Command::Import { csv, level } => {
            let imported = trainer.import_sentences(level, &csv)?;
            println!("imported {imported} sentences from {}", csv.display());
        }
        Command::Count { level } => {
            println!("{}", trainer.sentence_count(level)?);
        }
        Command::Config { init } => {
            if init {
                config_store.save(&config)?;
            }
            println!("# config: {}", config_store.path().display());
            println!("# deck:   {}", db_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// `id  chinese  (pinyin) english`, with the Chinese padded by display width.
fn card_line(card: &Card) -> String {
    const CHINESE_COLUMNS: usize = 8;
    let pad = CHINESE_COLUMNS.saturating_sub(card.chinese.width());
    let mut line = format!(
        "{:>4}  {}{}  ({}) {}",
        card.id,
        card.chinese,
        " ".repeat(pad),
        card.pinyin,
        card.english
    );
    if card.has_audio() {
        line.push_str("  [audio]");
    }
    if !card.active {
        line.push_str("  [inactive]");
    }
    line
}

fn print_annotation(annotation: &Annotation) {
    let mut readings = String::new();
    let mut chars = String::new();
    for unit in &annotation.units {
        let char_width = unit.unit.width().unwrap_or(0);
        let width = char_width.max(unit.reading.width());
        readings.push_str(&format!("{:<width$} ", unit.reading, width = width));
        chars.push(unit.unit);
        chars.push_str(&" ".repeat(width - char_width + 1));
    }
    println!("{}", readings.trim_end());
    println!("{}", chars.trim_end());
    println!();
    for word in &annotation.words {
        println!("{:>3}..{:<3} {}", word.start, word.end, word.text);
    }
}

fn run_quiz<R: rand::Rng>(
    trainer: &Trainer,
    quiz_type: Option<QuizType>,
    count: usize,
    rng: &mut R,
) -> Result<(), Box<dyn Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut asked: Vec<ItemId> = Vec::new();

    for _ in 0..count {
        let question = trainer.next_quiz(quiz_type, &asked, rng)?;
        asked.push(question.card_id);

        match &question.pinyin {
            Some(pinyin) => println!("{}  [{}]", question.prompt, pinyin),
            None => println!("{}", question.prompt),
        }
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}) {}", i + 1, option);
        }
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();
        let answer = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| question.options.get(i))
            .map(String::as_str)
            .unwrap_or(line);

        let result = trainer.submit_answer(question.card_id, answer, question.quiz_type)?;
        if result.correct {
            println!("correct!");
        } else {
            println!("wrong, it was {}", result.correct_answer);
        }
        let recent = trainer.recent_outcomes(question.card_id)?;
        let right = recent.iter().filter(|&&c| c).count();
        println!("  {right}/{} of the last attempts right", recent.len());
    }
    Ok(())
}
