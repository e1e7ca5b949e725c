//! One vote per ballot; most votes wins.

use crate::tally::{leaders, Tally};

/// Vote count per candidate, in order of first appearance.
pub fn plurality_counts<S: AsRef<str>>(votes: &[S]) -> Vec<(String, u64)> {
    let mut tally = Tally::default();
    for vote in votes {
        tally.add(vote.as_ref(), 1);
    }
    tally.into_scores()
}

/// All candidates tied for the most votes. Empty input gives no winners.
pub fn plurality_winner<S: AsRef<str>>(votes: &[S]) -> Vec<String> {
    leaders(&plurality_counts(votes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_winner() {
        let votes = ["Alice", "Bob", "Alice", "Charlie", "Alice"];
        assert_eq!(plurality_winner(&votes), vec!["Alice"]);
        assert_eq!(
            plurality_counts(&votes),
            vec![
                ("Alice".to_string(), 3),
                ("Bob".to_string(), 1),
                ("Charlie".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_ties_keep_first_appearance_order() {
        assert_eq!(plurality_winner(&["Bob", "Alice", "Alice", "Bob"]), vec!["Bob", "Alice"]);
        assert_eq!(
            plurality_winner(&["Alice", "Bob", "Charlie"]),
            vec!["Alice", "Bob", "Charlie"]
        );
    }

    #[test]
    fn test_empty() {
        let votes: [&str; 0] = [];
        assert!(plurality_winner(&votes).is_empty());
        assert!(plurality_counts(&votes).is_empty());
    }
}
