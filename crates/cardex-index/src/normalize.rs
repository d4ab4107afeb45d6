//! Name normalization for trigram keys

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// How a display name is folded before trigrams are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Lowercase, diacritics stripped; spaces and punctuation kept
    Card,
    /// Lowercase, diacritics stripped, letters only
    Artist,
}

impl Normalization {
    pub fn apply(self, name: &str) -> String {
        let folded = name.nfd().filter(|c| !is_combining_mark(*c));
        match self {
            Self::Card => folded.flat_map(char::to_lowercase).collect(),
            Self::Artist => folded
                .filter(|c| c.is_alphabetic())
                .flat_map(char::to_lowercase)
                .collect(),
        }
    }
}
