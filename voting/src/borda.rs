//! Ranked ballots scored by position.
//!
//! With `n` distinct candidates across all ballots, first place earns `n - 1`
//! points, second `n - 2`, down to 0. Candidates missing from a ballot earn
//! nothing from it.

use std::collections::HashSet;

use crate::error::{VotingError, VotingResult};
use crate::tally::{leaders, Tally};

/// Borda score per candidate, in order of first appearance.
pub fn borda_count_scores<S: AsRef<str>>(preferences: &[Vec<S>]) -> VotingResult<Vec<(String, u64)>> {
    let mut tally = Tally::default();
    for (ballot, ranking) in preferences.iter().enumerate() {
        let mut seen = HashSet::new();
        for candidate in ranking {
            let candidate = candidate.as_ref();
            if !seen.insert(candidate) {
                return Err(VotingError::DuplicateCandidate {
                    ballot,
                    candidate: candidate.to_string(),
                });
            }
            tally.enroll(candidate);
        }
    }

    // No duplicates, so every ballot is at most `n` long and points never underflow.
    let n = tally.len() as u64;
    for ranking in preferences {
        for (position, candidate) in ranking.iter().enumerate() {
            tally.add(candidate.as_ref(), n - position as u64 - 1);
        }
    }
    Ok(tally.into_scores())
}

/// All candidates tied for the highest Borda score.
pub fn borda_count_winner<S: AsRef<str>>(preferences: &[Vec<S>]) -> VotingResult<Vec<String>> {
    Ok(leaders(&borda_count_scores(preferences)?))
}
