mod error;
mod loader;
mod registry;
mod stats;
mod types;

pub use error::ProblemError;
pub use loader::load_scenario;
pub use registry::PlanningProblem;
pub use stats::ProblemStatistics;
pub use types::*;
