use std::time::Duration;

use thiserror::Error;

/// Default pause between answering and moving on, so feedback can be read.
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1200);

const MAX_FEEDBACK_DELAY: Duration = Duration::from_secs(10);

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    feedback_delay: Duration,
    shuffle_seed: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct QuizSettingsDraft {
    pub feedback_delay_ms: Option<u64>,
    pub shuffle_seed: Option<u64>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("feedback delay must be between 1 ms and {max_ms} ms, got {got_ms} ms")]
    FeedbackDelayOutOfRange { got_ms: u64, max_ms: u64 },
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, filling in defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::FeedbackDelayOutOfRange` for a zero or overly long delay.
    pub fn validate(self) -> Result<QuizSettings, SettingsError> {
        let feedback_delay = match self.feedback_delay_ms {
            None => DEFAULT_FEEDBACK_DELAY,
            Some(ms) => {
                let delay = Duration::from_millis(ms);
                if ms == 0 || delay > MAX_FEEDBACK_DELAY {
                    return Err(SettingsError::FeedbackDelayOutOfRange {
                        got_ms: ms,
                        max_ms: u64::try_from(MAX_FEEDBACK_DELAY.as_millis()).unwrap_or(u64::MAX),
                    });
                }
                delay
            }
        };

        Ok(QuizSettings {
            feedback_delay,
            shuffle_seed: self.shuffle_seed,
        })
    }
}

impl QuizSettings {
    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }

    #[must_use]
    pub fn shuffle_seed(&self) -> Option<u64> {
        self.shuffle_seed
    }

    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            shuffle_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_uses_defaults() {
        let settings = QuizSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, QuizSettings::default());
        assert_eq!(settings.feedback_delay(), Duration::from_millis(1200));
    }

    #[test]
    fn rejects_zero_and_huge_delays() {
        for ms in [0, 60_000] {
            let err = QuizSettingsDraft {
                feedback_delay_ms: Some(ms),
                shuffle_seed: None,
            }
            .validate()
            .unwrap_err();
            assert!(matches!(err, SettingsError::FeedbackDelayOutOfRange { got_ms, .. } if got_ms == ms));
        }
    }

    #[test]
    fn keeps_seed_and_custom_delay() {
        let settings = QuizSettingsDraft {
            feedback_delay_ms: Some(1500),
            shuffle_seed: Some(7),
        }
        .validate()
        .unwrap();
        assert_eq!(settings.feedback_delay(), Duration::from_millis(1500));
        assert_eq!(settings.shuffle_seed(), Some(7));
    }
}
