//! Count-based sliding window of call outcomes.

use std::collections::VecDeque;

/// The binary outcome the breaker tracks for each permitted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Ring buffer of the most recent outcomes.
///
/// Keeps a running failure count so the rate is O(1) to read.
#[derive(Debug, Clone)]
pub struct OutcomeWindow {
    outcomes: VecDeque<Outcome>,
    capacity: usize,
    failures: usize,
}

impl OutcomeWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    /// Append an outcome, evicting the oldest one when full.
    pub fn push(&mut self, outcome: Outcome) {
        if self.outcomes.len() == self.capacity {
            if let Some(Outcome::Failure) = self.outcomes.pop_front() {
                self.failures -= 1;
            }
        }
        if outcome == Outcome::Failure {
            self.failures += 1;
        }
        self.outcomes.push_back(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Fraction of failures in the window, 0.0 when empty.
    pub fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.failures as f64 / self.outcomes.len() as f64
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
    }
}
