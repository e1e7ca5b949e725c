//! Election winners over in-memory ballots.
//!
//! Every function returns *all* candidates tied for first place, in the order
//! they first appear in the input. Empty input yields an empty list; only
//! caller misuse (an unknown method name, a candidate ranked twice on one
//! ballot) is an error.
//!
//! ```
//! use potential_winner::{potential_winners, Votes};
//!
//! let votes = Votes::from(vec!["Alice", "Bob", "Alice"]);
//! assert_eq!(potential_winners(&votes, "plurality").unwrap(), vec!["Alice"]);
//! ```

mod borda;
mod error;
mod plurality;
mod tally;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use borda::{borda_count_scores, borda_count_winner};
pub use error::{VotingError, VotingResult};
pub use plurality::{plurality_counts, plurality_winner};

/// Counting rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Plurality,
    Borda,
}

impl FromStr for Method {
    type Err = VotingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plurality" => Ok(Self::Plurality),
            "borda" => Ok(Self::Borda),
            _ => Err(VotingError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plurality => f.write_str("plurality"),
            Self::Borda => f.write_str("borda"),
        }
    }
}

/// A set of ballots: one name each, or a ranking each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Votes {
    Single(Vec<String>),
    Ranked(Vec<Vec<String>>),
}

impl Votes {
    /// Single votes as one-entry rankings, rankings unchanged.
    fn rankings(&self) -> Vec<Vec<&str>> {
        match self {
            Self::Single(votes) => votes.iter().map(|v| vec![v.as_str()]).collect(),
            Self::Ranked(rankings) => rankings
                .iter()
                .map(|r| r.iter().map(String::as_str).collect())
                .collect(),
        }
    }

    /// Single votes unchanged, rankings reduced to their first choice.
    fn first_choices(&self) -> Vec<&str> {
        match self {
            Self::Single(votes) => votes.iter().map(String::as_str).collect(),
            Self::Ranked(rankings) => rankings
                .iter()
                .filter_map(|r| r.first().map(String::as_str))
                .collect(),
        }
    }
}

impl From<Vec<&str>> for Votes {
    fn from(votes: Vec<&str>) -> Self {
        Self::Single(votes.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<Vec<&str>>> for Votes {
    fn from(rankings: Vec<Vec<&str>>) -> Self {
        Self::Ranked(
            rankings
                .into_iter()
                .map(|r| r.into_iter().map(str::to_string).collect())
                .collect(),
        )
    }
}

/// Winners of `votes` under `method`.
///
/// Plurality over ranked ballots counts first choices. Borda over single
/// votes treats each as a one-entry ranking.
pub fn winners(votes: &Votes, method: Method) -> VotingResult<Vec<String>> {
    match method {
        Method::Plurality => Ok(plurality_winner(&votes.first_choices())),
        Method::Borda => borda_count_winner(&votes.rankings()),
    }
}

/// Winners of `votes` under the method named `method`.
pub fn potential_winners(votes: &Votes, method: &str) -> VotingResult<Vec<String>> {
    winners(votes, method.parse()?)
}
