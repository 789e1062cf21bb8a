use serde::Serialize;

use crate::plan::DownloadAssignment;
use crate::problem::SatelliteId;

/// Outcome of one satellite's downlink run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteDownlink {
    pub satellite: SatelliteId,
    /// Acquisitions the satellite had to transmit
    pub eligible: usize,
    pub assignments: Vec<DownloadAssignment>,
}

impl SatelliteDownlink {
    pub fn downloaded(&self) -> usize {
        self.assignments.len()
    }

    /// Acquisitions left on board once the windows ran out
    pub fn stranded(&self) -> usize {
        self.eligible - self.assignments.len()
    }

    pub fn downlink_seconds(&self) -> f64 {
        self.assignments.iter().map(DownloadAssignment::duration).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownlinkSummary {
    pub satellites: Vec<SatelliteDownlink>,
}

impl DownlinkSummary {
    pub fn eligible(&self) -> usize {
        self.satellites.iter().map(|s| s.eligible).sum()
    }

    pub fn downloaded(&self) -> usize {
        self.satellites.iter().map(SatelliteDownlink::downloaded).sum()
    }

    pub fn stranded(&self) -> usize {
        self.satellites.iter().map(SatelliteDownlink::stranded).sum()
    }
}
