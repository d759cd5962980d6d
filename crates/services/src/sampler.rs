use std::collections::HashSet;

use kotoba_core::model::{QuizSettings, Word};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};

/// Distractors offered next to the correct answer, at most.
pub const MAX_DISTRACTORS: usize = 2;

/// Random question order and multiple-choice options.
#[derive(Debug, Clone)]
pub struct QuestionSampler {
    rng: StdRng,
}

impl Default for QuestionSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionSampler {
    /// Sampler seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic sampler; the same seed replays the same orders and options.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &QuizSettings) -> Self {
        settings
            .shuffle_seed()
            .map_or_else(Self::new, Self::from_seed)
    }

    /// Uniform random permutation of `pool` (Fisher-Yates).
    pub fn initialize_order(&mut self, mut pool: Vec<Word>) -> Vec<Word> {
        pool.shuffle(&mut self.rng);
        pool
    }

    /// The word at `cursor` plus up to [`MAX_DISTRACTORS`] other words, in random order.
    ///
    /// Distractors are drawn without replacement from `ordered_words`, skipping
    /// anything that shares a key with the correct word or with another pick.
    /// Returns an empty list when `cursor` is out of range.
    pub fn generate_options(&mut self, ordered_words: &[Word], cursor: usize) -> Vec<Word> {
        let Some(correct) = ordered_words.get(cursor) else {
            return Vec::new();
        };

        let mut seen = HashSet::from([correct.key()]);
        let candidates: Vec<&Word> = ordered_words
            .iter()
            .filter(|word| seen.insert(word.key()))
            .collect();

        let mut options = Vec::with_capacity(MAX_DISTRACTORS + 1);
        options.push(correct.clone());
        options.extend(
            candidates
                .choose_multiple(&mut self.rng, MAX_DISTRACTORS)
                .map(|word| (*word).clone()),
        );
        options.shuffle(&mut self.rng);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kotoba_core::model::{LessonId, WordKey};

    fn word(key: &str) -> Word {
        Word::new(
            WordKey::new(key),
            format!("lex-{key}"),
            None,
            format!("mean-{key}"),
            LessonId::new("1"),
        )
        .unwrap()
    }

    fn keys(words: &[Word]) -> Vec<String> {
        let mut keys: Vec<String> = words.iter().map(|w| w.key().to_string()).collect();
        keys.sort();
        keys
    }

    #[test]
    fn order_is_a_permutation() {
        let pool: Vec<Word> = ["a", "b", "c", "d", "e", "f"].map(word).to_vec();
        let mut sampler = QuestionSampler::from_seed(11);
        let ordered = sampler.initialize_order(pool.clone());
        assert_eq!(keys(&ordered), keys(&pool));
        assert!(sampler.initialize_order(Vec::new()).is_empty());
    }

    #[test]
    fn same_seed_same_order() {
        let pool: Vec<Word> = ["a", "b", "c", "d", "e", "f", "g"].map(word).to_vec();
        let first = QuestionSampler::from_seed(3).initialize_order(pool.clone());
        let second = QuestionSampler::from_seed(3).initialize_order(pool);
        assert_eq!(first, second);
    }

    #[test]
    fn every_position_is_reachable() {
        let pool: Vec<Word> = ["a", "b", "c"].map(word).to_vec();
        let mut sampler = QuestionSampler::from_seed(99);
        let mut first_seen = HashSet::new();
        for _ in 0..200 {
            let ordered = sampler.initialize_order(pool.clone());
            first_seen.insert(ordered[0].key().to_string());
        }
        assert_eq!(first_seen.len(), 3);
    }

    #[test]
    fn options_hold_correct_word_and_distinct_keys() {
        let ordered: Vec<Word> = ["a", "b", "c", "d", "e"].map(word).to_vec();
        let mut sampler = QuestionSampler::from_seed(5);
        for cursor in 0..ordered.len() {
            for _ in 0..20 {
                let options = sampler.generate_options(&ordered, cursor);
                assert_eq!(options.len(), 3);
                assert!(options.iter().any(|w| w.key() == ordered[cursor].key()));
                let distinct: HashSet<_> = options.iter().map(Word::key).collect();
                assert_eq!(distinct.len(), options.len());
            }
        }
    }

    #[test]
    fn options_degrade_with_small_pools() {
        let mut sampler = QuestionSampler::from_seed(1);

        let single = vec![word("a")];
        assert_eq!(keys(&sampler.generate_options(&single, 0)), vec!["a"]);

        let pair = vec![word("a"), word("b")];
        assert_eq!(keys(&sampler.generate_options(&pair, 1)), vec!["a", "b"]);

        // A duplicate of the correct key is never offered as a distractor.
        let dup = vec![word("a"), word("a"), word("b")];
        assert_eq!(keys(&sampler.generate_options(&dup, 0)), vec!["a", "b"]);

        assert!(sampler.generate_options(&pair, 2).is_empty());
    }

    #[test]
    fn correct_answer_position_varies() {
        let ordered: Vec<Word> = ["a", "b", "c", "d"].map(word).to_vec();
        let mut sampler = QuestionSampler::from_seed(42);
        let mut positions = HashSet::new();
        for _ in 0..100 {
            let options = sampler.generate_options(&ordered, 0);
            let pos = options.iter().position(|w| w.key().as_str() == "a").unwrap();
            positions.insert(pos);
        }
        assert_eq!(positions.len(), 3);
    }
}
