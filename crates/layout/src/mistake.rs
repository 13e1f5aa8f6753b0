//! Simulated handwriting mistakes: an occasional swapped vowel.

use log::{debug, warn};
use rand::Rng;

pub const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

/// Randomly misspells words by replacing one vowel with another.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct MistakeInjector {
    frequency: f64,
}

impl MistakeInjector {
    pub fn new(frequency: f64) -> Self {
        let mut injector = Self::default();
        injector.set_frequency(frequency);
        injector
    }

    /// Probability, in `[0, 1]`, that an eligible word is misspelled.
    /// Out-of-range values are clamped; NaN disables mistakes.
    pub fn set_frequency(&mut self, frequency: f64) {
        let clamped = if frequency.is_nan() {
            0.0
        } else {
            frequency.clamp(0.0, 1.0)
        };

        if clamped != frequency {
            warn!("Mistake frequency {frequency} out of range, using {clamped}");
        }

        self.frequency = clamped;
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Only lowercase alphabetic words longer than two letters are touched.
    pub fn is_eligible(word: &str) -> bool {
        word.len() > 2 && word.bytes().all(|b| b.is_ascii_lowercase())
    }

    /// Possibly misspell `word`, returning the result and whether it changed.
    pub fn maybe_corrupt<R: Rng + ?Sized>(&self, word: &str, rng: &mut R) -> (String, bool) {
        if !Self::is_eligible(word) {
            return (word.to_owned(), false);
        }

        let roll: f64 = rng.random();
        if roll >= self.frequency {
            return (word.to_owned(), false);
        }

        let positions: Vec<usize> = word
            .chars()
            .enumerate()
            .filter(|(_, c)| VOWELS.contains(c))
            .map(|(i, _)| i)
            .collect();

        if positions.is_empty() {
            return (word.to_owned(), false);
        }

        let target = positions[rng.random_range(0..positions.len())];
        let current = word.as_bytes()[target] as char;

        let choices: Vec<char> = VOWELS.into_iter().filter(|&v| v != current).collect();
        let replacement = choices[rng.random_range(0..choices.len())];

        let corrupted: String = word
            .chars()
            .enumerate()
            .map(|(i, c)| if i == target { replacement } else { c })
            .collect();

        debug!("Mistake: {word} -> {corrupted}");
        (corrupted, true)
    }
}
