use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::word::Word;

/// Direction of a quiz: what is shown as the question, and what is picked as the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuizMode {
    /// Show the lexicon term, pick its meaning.
    #[serde(alias = "jpToId")]
    LexiconToMeaning,
    /// Show the meaning, pick the lexicon term.
    #[default]
    #[serde(alias = "idToJp")]
    MeaningToLexicon,
}

impl QuizMode {
    /// Exact, case-sensitive comparison of the field this mode judges on.
    #[must_use]
    pub fn matches(self, current: &Word, selected: &Word) -> bool {
        match self {
            QuizMode::MeaningToLexicon => selected.meaning() == current.meaning(),
            QuizMode::LexiconToMeaning => selected.lexicon() == current.lexicon(),
        }
    }

    /// Text shown as the question for `word`.
    #[must_use]
    pub fn prompt_text(self, word: &Word, furigana_visible: bool) -> String {
        match self {
            QuizMode::LexiconToMeaning => word.lexicon_display(furigana_visible),
            QuizMode::MeaningToLexicon => word.meaning().to_owned(),
        }
    }

    /// Text shown for `word` on the answer side.
    #[must_use]
    pub fn answer_text(self, word: &Word, furigana_visible: bool) -> String {
        match self {
            QuizMode::LexiconToMeaning => word.meaning().to_owned(),
            QuizMode::MeaningToLexicon => word.lexicon_display(furigana_visible),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::LexiconToMeaning => "lexiconToMeaning",
            QuizMode::MeaningToLexicon => "meaningToLexicon",
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quiz mode: {0}")]
pub struct ParseQuizModeError(pub String);

impl FromStr for QuizMode {
    type Err = ParseQuizModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lexiconToMeaning" | "jpToId" => Ok(QuizMode::LexiconToMeaning),
            "meaningToLexicon" | "idToJp" => Ok(QuizMode::MeaningToLexicon),
            other => Err(ParseQuizModeError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonId, WordKey};

    fn word(key: &str, lexicon: &str, reading: &str, meaning: &str) -> Word {
        Word::new(
            WordKey::new(key),
            lexicon,
            Some(reading.to_owned()),
            meaning,
            LessonId::new("1"),
        )
        .unwrap()
    }

    #[test]
    fn matching_uses_exact_strings() {
        let current = word("a", "水", "みず", "water");
        let same_meaning = word("b", "お水", "おみず", "water");
        let padded = word("c", "水 ", "みず", "Water");

        assert!(QuizMode::MeaningToLexicon.matches(&current, &same_meaning));
        assert!(!QuizMode::LexiconToMeaning.matches(&current, &same_meaning));
        assert!(!QuizMode::MeaningToLexicon.matches(&current, &padded));
        assert!(!QuizMode::LexiconToMeaning.matches(&current, &padded));
    }

    #[test]
    fn prompt_and_answer_sides_are_opposite() {
        let w = word("a", "水", "みず", "water");
        assert_eq!(QuizMode::LexiconToMeaning.prompt_text(&w, true), "水「みず」");
        assert_eq!(QuizMode::LexiconToMeaning.answer_text(&w, true), "water");
        assert_eq!(QuizMode::MeaningToLexicon.prompt_text(&w, false), "water");
        assert_eq!(QuizMode::MeaningToLexicon.answer_text(&w, false), "水");
    }

    #[test]
    fn parses_current_and_legacy_names() {
        assert_eq!("jpToId".parse::<QuizMode>().unwrap(), QuizMode::LexiconToMeaning);
        assert_eq!("meaningToLexicon".parse::<QuizMode>().unwrap(), QuizMode::MeaningToLexicon);
        assert!("sideways".parse::<QuizMode>().is_err());
    }
}
