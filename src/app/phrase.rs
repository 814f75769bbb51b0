//! Phrase-selection strategies for the phrase button.
//!
//! The machine holds a `Box<dyn PhraseSelector>` and asks it for an index
//! into the configured phrase list on every press.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Picks which phrase plays next.
pub trait PhraseSelector: Send {
    /// Return an index in `0..count`.  `count` is never zero.
    fn select(&mut self, count: usize) -> usize;
}

/// Uniform random choice.  Back-to-back repeats are allowed.
#[derive(Debug, Default)]
pub struct RandomPhrase;

impl PhraseSelector for RandomPhrase {
    fn select(&mut self, count: usize) -> usize {
        rand::thread_rng().gen_range(0..count)
    }
}

/// Walks the list in order and wraps around.
#[derive(Debug, Default)]
pub struct RoundRobinPhrase {
    next: usize,
}

impl PhraseSelector for RoundRobinPhrase {
    fn select(&mut self, count: usize) -> usize {
        let idx = self.next % count;
        self.next = (idx + 1) % count;
        idx
    }
}

/// Config-level choice of strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhraseOrder {
    #[default]
    Random,
    Sequential,
}

impl PhraseOrder {
    pub fn build(self) -> Box<dyn PhraseSelector> {
        match self {
            Self::Random => Box::new(RandomPhrase),
            Self::Sequential => Box::new(RoundRobinPhrase::default()),
        }
    }
}
