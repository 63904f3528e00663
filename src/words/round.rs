//! Round generation

use rand::Rng;
use rand::seq::SliceRandom;

use super::WordPair;

/// Ordered words played in one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Round {
    words: Vec<WordPair>,
}

impl Round {
    /// Words in play order
    #[must_use]
    pub fn words(&self) -> &[WordPair] {
        &self.words
    }

    /// Word at a position, if any
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&WordPair> {
        self.words.get(index)
    }

    /// Number of words in the round
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the round has no words
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl From<Vec<WordPair>> for Round {
    fn from(words: Vec<WordPair>) -> Self {
        Self { words }
    }
}

/// Shuffle the dataset and keep the first `count` words
///
/// Uses an unbiased Fisher–Yates shuffle of the whole dataset, so every
/// subset and order is equally likely. The round holds
/// `min(count, dataset.len())` words, each taken from the dataset exactly once.
pub fn generate_round<R: Rng + ?Sized>(dataset: &[WordPair], count: usize, rng: &mut R) -> Round {
    let mut words = dataset.to_vec();
    words.shuffle(rng);
    words.truncate(count);

    tracing::debug!(requested = count, size = words.len(), "generated round");
    Round { words }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::words::{Dataset, DatasetProvider};

    fn sources(round: &Round) -> Vec<&str> {
        round.words().iter().map(|w| w.source.as_str()).collect()
    }

    #[test]
    fn truncates_to_requested_count() {
        let dataset = Dataset::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let round = generate_round(dataset.words(), 10, &mut rng);
        assert_eq!(round.len(), 10);
    }

    #[test]
    fn caps_at_dataset_size() {
        let dataset = Dataset::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let round = generate_round(dataset.words(), 500, &mut rng);
        assert_eq!(round.len(), dataset.len());
    }

    #[test]
    fn elements_are_distinct_members() {
        let dataset = Dataset::builtin();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            for count in [0, 1, 5, 29, 30] {
                let round = generate_round(dataset.words(), count, &mut rng);
                let unique: HashSet<_> = sources(&round).into_iter().collect();
                assert_eq!(unique.len(), count);
                assert!(round.words().iter().all(|w| dataset.words().contains(w)));
            }
        }
    }

    #[test]
    fn successive_rounds_differ() {
        let dataset = Dataset::builtin();
        let mut rng = StdRng::seed_from_u64(42);
        let first = generate_round(dataset.words(), 30, &mut rng);
        let second = generate_round(dataset.words(), 30, &mut rng);
        assert_ne!(sources(&first), sources(&second));
    }

    #[test]
    fn empty_dataset_gives_empty_round() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_round(&[], 5, &mut rng).is_empty());
    }
}
