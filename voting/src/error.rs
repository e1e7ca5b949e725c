use thiserror::Error;

/// Caller misuse. Valid but empty input is never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VotingError {
    #[error("Unsupported voting method: {0}")]
    UnsupportedMethod(String),

    #[error("Candidate '{candidate}' appears more than once in ballot {ballot}")]
    DuplicateCandidate { ballot: usize, candidate: String },
}

pub type VotingResult<T> = Result<T, VotingError>;
