use kotoba_core::model::QuizMode;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn position_to_i64(v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization("position overflow".into()))
}

pub(crate) fn parse_mode(s: &str) -> Result<QuizMode, StorageError> {
    s.parse::<QuizMode>().map_err(ser)
}

pub(crate) fn bool_from_i64(field: &'static str, v: i64) -> Result<bool, StorageError> {
    match v {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(StorageError::Serialization(format!("invalid {field}: {v}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_text_round_trips() {
        for mode in [QuizMode::LexiconToMeaning, QuizMode::MeaningToLexicon] {
            assert_eq!(parse_mode(mode.as_str()).unwrap(), mode);
        }
        assert!(parse_mode("both").is_err());
    }

    #[test]
    fn flags_must_be_zero_or_one() {
        assert!(bool_from_i64("furigana_visible", 1).unwrap());
        assert!(bool_from_i64("furigana_visible", 2).is_err());
    }
}
