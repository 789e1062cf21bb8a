use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::PlannerConfig;
use crate::problem::error::{lookup, ProblemError};
use crate::problem::stats::ProblemStatistics;
use crate::problem::types::*;

/// All entities of one planning horizon.
///
/// Every collection is indexed densely in insertion order. The registry stores
/// what it is given: clipping windows to the horizon and dropping empty ones is
/// the loader's job.
#[derive(Debug, Clone, Serialize)]
pub struct PlanningProblem {
    horizon: Horizon,
    epoch: Option<DateTime<Utc>>,
    satellites: Vec<Satellite>,
    stations: Vec<Station>,
    users: Vec<User>,
    candidate_acquisitions: Vec<CandidateAcquisition>,
    recorded_acquisitions: Vec<RecordedAcquisition>,
    download_windows: Vec<DownloadWindow>,
}

impl PlanningProblem {
    pub fn new(horizon_start: f64, horizon_end: f64) -> Self {
        Self {
            horizon: Horizon {
                start: horizon_start,
                end: horizon_end,
            },
            epoch: None,
            satellites: Vec::new(),
            stations: Vec::new(),
            users: Vec::new(),
            candidate_acquisitions: Vec::new(),
            recorded_acquisitions: Vec::new(),
            download_windows: Vec::new(),
        }
    }

    pub fn with_epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// Absolute instant of a horizon offset, when the scenario carries an epoch.
    pub fn instant(&self, seconds: f64) -> Option<DateTime<Utc>> {
        let epoch = self.epoch?;
        let millis = (seconds * 1000.0).round();
        if !millis.is_finite() {
            return None;
        }
        epoch.checked_add_signed(Duration::milliseconds(millis as i64))
    }

    pub fn add_satellite(&mut self, name: impl Into<String>) -> SatelliteId {
        let idx = SatelliteId(self.satellites.len());
        self.satellites.push(Satellite {
            idx,
            name: name.into(),
        });
        idx
    }

    pub fn add_station(&mut self, name: impl Into<String>) -> StationId {
        let idx = StationId(self.stations.len());
        self.stations.push(Station {
            idx,
            name: name.into(),
        });
        idx
    }

    pub fn add_user(&mut self, name: impl Into<String>, quota: f64) -> UserId {
        let idx = UserId(self.users.len());
        self.users.push(User {
            idx,
            name: name.into(),
            quota,
        });
        idx
    }

    pub fn add_candidate_acquisition(
        &mut self,
        name: impl Into<String>,
        user: UserId,
        priority: u8,
    ) -> Result<CandidateId, ProblemError> {
        self.user(user)?;
        let idx = CandidateId(self.candidate_acquisitions.len());
        self.candidate_acquisitions.push(CandidateAcquisition {
            idx,
            name: name.into(),
            user,
            priority,
            windows: Vec::new(),
        });
        Ok(idx)
    }

    /// Append a window to a candidate; returns its position in that candidate's list.
    pub fn add_acquisition_window(
        &mut self,
        candidate: CandidateId,
        opportunity: AcquisitionOpportunity,
    ) -> Result<usize, ProblemError> {
        self.satellite(opportunity.satellite)?;
        let len = self.candidate_acquisitions.len();
        let owner = self
            .candidate_acquisitions
            .get_mut(candidate.0)
            .ok_or(ProblemError::OutOfRange {
                collection: "candidate acquisition",
                index: candidate.0,
                len,
            })?;

        let idx = owner.windows.len();
        owner.windows.push(AcquisitionWindow {
            idx,
            candidate,
            satellite: opportunity.satellite,
            earliest_start: opportunity.earliest_start,
            latest_start: opportunity.latest_start,
            duration: opportunity.duration,
            volume: opportunity.volume,
            zenith_angle: opportunity.zenith_angle,
            roll_angle: opportunity.roll_angle,
            cloud_probability: opportunity.cloud_probability,
        });
        Ok(idx)
    }

    pub fn add_recorded_acquisition(
        &mut self,
        name: impl Into<String>,
        user: UserId,
        priority: u8,
        satellite: SatelliteId,
        acquisition_time: f64,
        volume: u64,
    ) -> Result<RecordedId, ProblemError> {
        self.user(user)?;
        self.satellite(satellite)?;
        let idx = RecordedId(self.recorded_acquisitions.len());
        self.recorded_acquisitions.push(RecordedAcquisition {
            idx,
            name: name.into(),
            user,
            priority,
            satellite,
            acquisition_time,
            volume,
        });
        Ok(idx)
    }

    pub fn add_download_window(
        &mut self,
        satellite: SatelliteId,
        station: StationId,
        start: f64,
        end: f64,
    ) -> Result<DownloadWindowId, ProblemError> {
        self.satellite(satellite)?;
        self.station(station)?;
        let idx = DownloadWindowId(self.download_windows.len());
        self.download_windows.push(DownloadWindow {
            idx,
            satellite,
            station,
            start,
            end,
        });
        Ok(idx)
    }

    pub fn satellite(&self, id: SatelliteId) -> Result<&Satellite, ProblemError> {
        lookup(&self.satellites, "satellite", id.0)
    }

    pub fn station(&self, id: StationId) -> Result<&Station, ProblemError> {
        lookup(&self.stations, "station", id.0)
    }

    pub fn user(&self, id: UserId) -> Result<&User, ProblemError> {
        lookup(&self.users, "user", id.0)
    }

    pub fn candidate_acquisition(
        &self,
        id: CandidateId,
    ) -> Result<&CandidateAcquisition, ProblemError> {
        lookup(&self.candidate_acquisitions, "candidate acquisition", id.0)
    }

    pub fn recorded_acquisition(&self, id: RecordedId) -> Result<&RecordedAcquisition, ProblemError> {
        lookup(&self.recorded_acquisitions, "recorded acquisition", id.0)
    }

    pub fn download_window(&self, id: DownloadWindowId) -> Result<&DownloadWindow, ProblemError> {
        lookup(&self.download_windows, "download window", id.0)
    }

    pub fn satellites(&self) -> &[Satellite] {
        &self.satellites
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn candidate_acquisitions(&self) -> &[CandidateAcquisition] {
        &self.candidate_acquisitions
    }

    pub fn recorded_acquisitions(&self) -> &[RecordedAcquisition] {
        &self.recorded_acquisitions
    }

    pub fn download_windows(&self) -> &[DownloadWindow] {
        &self.download_windows
    }

    /// Every acquisition window of every candidate, candidate order first.
    pub fn acquisition_windows(&self) -> impl Iterator<Item = &AcquisitionWindow> {
        self.candidate_acquisitions
            .iter()
            .flat_map(|c| c.windows.iter())
    }

    /// Slew time estimate between two acquisition geometries, in seconds.
    pub fn transition_time(
        &self,
        from: &AcquisitionWindow,
        to: &AcquisitionWindow,
        config: &PlannerConfig,
    ) -> f64 {
        (from.roll_angle - to.roll_angle).abs() / config.mean_rotation_speed
    }

    pub fn statistics(&self) -> ProblemStatistics {
        ProblemStatistics::collect(self)
    }
}
