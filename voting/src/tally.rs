//! Score table that remembers first-appearance order.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct Tally {
    order: Vec<String>,
    index: HashMap<String, usize>,
    scores: Vec<u64>,
}

impl Tally {
    /// Register a candidate with no points, keeping its first position.
    pub(crate) fn enroll(&mut self, candidate: &str) -> usize {
        if let Some(&i) = self.index.get(candidate) {
            return i;
        }
        let i = self.order.len();
        self.order.push(candidate.to_string());
        self.index.insert(candidate.to_string(), i);
        self.scores.push(0);
        i
    }

    pub(crate) fn add(&mut self, candidate: &str, points: u64) {
        let i = self.enroll(candidate);
        self.scores[i] += points;
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn into_scores(self) -> Vec<(String, u64)> {
        self.order.into_iter().zip(self.scores).collect()
    }
}

/// Every candidate holding the top score, in the order given.
pub(crate) fn leaders(scores: &[(String, u64)]) -> Vec<String> {
    let Some(best) = scores.iter().map(|(_, s)| *s).max() else {
        return Vec::new();
    };
    scores
        .iter()
        .filter(|(_, s)| *s == best)
        .map(|(c, _)| c.clone())
        .collect()
}
