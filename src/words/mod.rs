//! Word pairs and the datasets they come from

mod round;

pub use round::{Round, generate_round};

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One prompt/answer pair
///
/// Identity is `source`: two pairs with the same source text are the same
/// word, regardless of their translation or icon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordPair {
    /// Text shown to the player (e.g. "Apple")
    pub source: String,
    /// Expected spoken translation (e.g. "яблоко")
    pub target: String,
    /// Icon displayed with the word and on a correct answer
    #[serde(default)]
    pub icon: String,
}

impl WordPair {
    /// Create a word pair
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            icon: icon.into(),
        }
    }

    /// Whether two pairs denote the same word
    #[must_use]
    pub fn same_word(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Read-only source of the full word collection
pub trait DatasetProvider: Send + Sync {
    /// All word pairs available for building rounds
    fn words(&self) -> &[WordPair];
}

/// Validated, immutable word collection
#[derive(Debug, Clone)]
pub struct Dataset {
    words: Vec<WordPair>,
}

impl Dataset {
    /// Build a dataset, rejecting empty lists and duplicate identities
    ///
    /// # Errors
    ///
    /// Returns `Error::Dataset` if the list is empty or two pairs share a
    /// source text
    pub fn new(words: Vec<WordPair>) -> Result<Self> {
        if words.is_empty() {
            return Err(Error::Dataset("word list is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for word in &words {
            if word.source.trim().is_empty() || word.target.trim().is_empty() {
                return Err(Error::Dataset(format!(
                    "word pair has empty text: {word:?}"
                )));
            }
            if !seen.insert(word.source.as_str()) {
                return Err(Error::Dataset(format!(
                    "duplicate word: {}",
                    word.source
                )));
            }
        }

        Ok(Self { words })
    }

    /// The built-in English → Russian list
    #[must_use]
    pub fn builtin() -> Self {
        let words = BUILTIN_WORDS
            .iter()
            .map(|(source, target, icon)| WordPair::new(*source, *target, *icon))
            .collect();
        Self { words }
    }

    /// Load a dataset from a TOML word file
    ///
    /// ```toml
    /// [[words]]
    /// source = "Apple"
    /// target = "яблоко"
    /// icon = "🍎"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Dataset(format!("failed to read {}: {e}", path.display())))?;
        let file: WordFile = toml::from_str(&content)?;
        let dataset = Self::new(file.words)?;

        tracing::info!(
            path = %path.display(),
            words = dataset.len(),
            "loaded word file"
        );
        Ok(dataset)
    }

    /// Number of pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false for a validated dataset
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl DatasetProvider for Dataset {
    fn words(&self) -> &[WordPair] {
        &self.words
    }
}

#[derive(Debug, Deserialize)]
struct WordFile {
    words: Vec<WordPair>,
}

/// Common words that speech recognizers handle well
const BUILTIN_WORDS: &[(&str, &str, &str)] = &[
    ("Apple", "яблоко", "🍎"),
    ("Water", "вода", "💧"),
    ("Sun", "солнце", "☀️"),
    ("Cat", "кот", "🐱"),
    ("Dog", "собака", "🐶"),
    ("House", "дом", "🏠"),
    ("Book", "книга", "📖"),
    ("Fire", "огонь", "🔥"),
    ("Moon", "луна", "🌙"),
    ("Star", "звезда", "⭐"),
    ("Tree", "дерево", "🌳"),
    ("Fish", "рыба", "🐟"),
    ("Bird", "птица", "🐦"),
    ("Snow", "снег", "❄️"),
    ("Rain", "дождь", "🌧️"),
    ("Heart", "сердце", "❤️"),
    ("Music", "музыка", "🎵"),
    ("Time", "время", "⏰"),
    ("Love", "любовь", "💕"),
    ("Friend", "друг", "🤝"),
    ("Night", "ночь", "🌃"),
    ("Flower", "цветок", "🌸"),
    ("Cloud", "облако", "☁️"),
    ("Wind", "ветер", "💨"),
    ("Light", "свет", "💡"),
    ("Mountain", "гора", "⛰️"),
    ("River", "река", "🏞️"),
    ("Earth", "земля", "🌍"),
    ("King", "король", "👑"),
    ("Dream", "мечта", "💭"),
];
