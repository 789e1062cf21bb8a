mod scheduler;
mod summary;

pub use scheduler::DownlinkScheduler;
pub use summary::{DownlinkSummary, SatelliteDownlink};
