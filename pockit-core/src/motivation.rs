//! Motivational quotes shown next to the locked funds

use rand::Rng;

pub const MOTIVATIONAL_QUOTES: [&str; 5] = [
    "Every dollar saved is a step toward your dreams.",
    "Patience is the key to financial freedom.",
    "Your future self will thank you for this decision.",
    "Building wealth requires discipline, not luck.",
    "Small sacrifices today lead to big rewards tomorrow.",
];

/// Rotating quote source. Starts on the first quote; each rotation picks
/// uniformly at random, so the same quote may come up twice in a row.
#[derive(Debug, Clone)]
pub struct MotivationFeed {
    quotes: Vec<String>,
    current: usize,
}

impl MotivationFeed {
    pub fn new() -> Self {
        Self {
            quotes: MOTIVATIONAL_QUOTES.iter().map(|q| q.to_string()).collect(),
            current: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.quotes[self.current]
    }

    /// Pick the next quote
    pub fn rotate<R: Rng>(&mut self, rng: &mut R) -> &str {
        self.current = rng.random_range(0..self.quotes.len());
        self.current()
    }

    /// [`rotate`](Self::rotate) using the thread-local generator
    pub fn next_quote(&mut self) -> &str {
        self.rotate(&mut rand::rng())
    }
}

impl Default for MotivationFeed {
    fn default() -> Self {
        Self::new()
    }
}
