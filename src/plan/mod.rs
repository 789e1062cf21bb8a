mod error;
pub mod feed;
mod solution;
mod types;

pub use error::{FeedError, PlanError};
pub use solution::SolutionPlan;
pub use types::*;
