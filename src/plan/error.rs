use thiserror::Error;

use crate::problem::{CandidateId, ProblemError};

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error("candidate acquisition {0} has no selected acquisition window")]
    NotRealized(CandidateId),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {0}: {1}")]
    Line(usize, String),
    #[error("record {0}: {1}")]
    Apply(usize, PlanError),
}
