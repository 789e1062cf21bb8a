use serde::Serialize;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_type!(
    /// Position of a satellite in the problem's satellite list
    SatelliteId
);
index_type!(StationId);
index_type!(UserId);
index_type!(
    /// Position of a candidate acquisition in the problem's candidate list
    CandidateId
);
index_type!(
    /// Position of a recorded acquisition in the problem's recorded list
    RecordedId
);
index_type!(DownloadWindowId);

#[derive(Debug, Clone, Serialize)]
pub struct Satellite {
    pub idx: SatelliteId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Station {
    pub idx: StationId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub idx: UserId,
    pub name: String,
    /// Usage budget, only carried through for the acquisition optimizer
    pub quota: f64,
}

/// Opportunity to realize one candidate acquisition on one satellite.
///
/// Times are seconds from the horizon origin and are already clipped to the
/// horizon, so `earliest_start <= latest_start` always holds.
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionWindow {
    /// Position in the owning candidate's window list
    pub idx: usize,
    pub candidate: CandidateId,
    pub satellite: SatelliteId,
    pub earliest_start: f64,
    pub latest_start: f64,
    pub duration: f64,
    /// Bits
    pub volume: u64,
    /// Radians, at closest approach
    pub zenith_angle: f64,
    /// Radians, at closest approach
    pub roll_angle: f64,
    pub cloud_probability: f64,
}

/// Input for [`crate::problem::PlanningProblem::add_acquisition_window`].
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionOpportunity {
    pub satellite: SatelliteId,
    pub earliest_start: f64,
    pub latest_start: f64,
    pub duration: f64,
    pub volume: u64,
    pub zenith_angle: f64,
    pub roll_angle: f64,
    pub cloud_probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateAcquisition {
    pub idx: CandidateId,
    pub name: String,
    pub user: UserId,
    pub priority: u8,
    pub windows: Vec<AcquisitionWindow>,
}

impl CandidateAcquisition {
    pub fn window(&self, idx: usize) -> Result<&AcquisitionWindow, super::ProblemError> {
        super::error::lookup(&self.windows, "acquisition window", idx)
    }
}

/// Data already captured onboard, waiting for downlink only.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedAcquisition {
    pub idx: RecordedId,
    pub name: String,
    pub user: UserId,
    pub priority: u8,
    pub satellite: SatelliteId,
    /// Completion time of the capture
    pub acquisition_time: f64,
    /// Bits
    pub volume: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadWindow {
    pub idx: DownloadWindowId,
    pub satellite: SatelliteId,
    pub station: StationId,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Horizon {
    pub start: f64,
    pub end: f64,
}
