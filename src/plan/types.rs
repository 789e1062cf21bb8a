use std::str::FromStr;

use serde::Serialize;
use strum_macros::Display;

use crate::problem::{
    AcquisitionWindow, CandidateAcquisition, CandidateId, DownloadWindowId, RecordedAcquisition,
    RecordedId, SatelliteId, UserId,
};

/// Feed tag of an acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AcquisitionKind {
    #[strum(serialize = "REC")]
    Recorded,
    #[strum(serialize = "CAND")]
    Candidate,
}

impl FromStr for AcquisitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REC" => Ok(AcquisitionKind::Recorded),
            "CAND" => Ok(AcquisitionKind::Candidate),
            other => Err(format!("unknown acquisition kind '{}'", other)),
        }
    }
}

/// Handle to an acquisition of either kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "index")]
pub enum AcquisitionRef {
    #[serde(rename = "REC")]
    Recorded(RecordedId),
    #[serde(rename = "CAND")]
    Candidate(CandidateId),
}

impl AcquisitionRef {
    pub fn new(kind: AcquisitionKind, index: usize) -> Self {
        match kind {
            AcquisitionKind::Recorded => AcquisitionRef::Recorded(RecordedId(index)),
            AcquisitionKind::Candidate => AcquisitionRef::Candidate(CandidateId(index)),
        }
    }

    pub fn kind(self) -> AcquisitionKind {
        match self {
            AcquisitionRef::Recorded(_) => AcquisitionKind::Recorded,
            AcquisitionRef::Candidate(_) => AcquisitionKind::Candidate,
        }
    }

    pub fn index(self) -> usize {
        match self {
            AcquisitionRef::Recorded(id) => id.index(),
            AcquisitionRef::Candidate(id) => id.index(),
        }
    }
}

/// Window chosen for realizing a candidate acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcquisitionSelection {
    /// Position in the candidate's own window list
    pub window: usize,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DownloadSelection {
    pub window: DownloadWindowId,
    pub start: f64,
    pub end: f64,
}

/// One record of the acquisition-assignment feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcquisitionAssignment {
    pub candidate: CandidateId,
    pub window: usize,
    pub start: f64,
    pub end: f64,
}

/// One record of the download-assignment feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DownloadAssignment {
    pub acquisition: AcquisitionRef,
    pub window: DownloadWindowId,
    pub start: f64,
    pub end: f64,
}

impl DownloadAssignment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A realized acquisition, whichever way it came to exist.
#[derive(Debug, Clone, Copy)]
pub enum Acquisition<'a> {
    Recorded(&'a RecordedAcquisition),
    Candidate {
        acquisition: &'a CandidateAcquisition,
        window: &'a AcquisitionWindow,
        selection: &'a AcquisitionSelection,
    },
}

impl<'a> Acquisition<'a> {
    pub fn id(&self) -> AcquisitionRef {
        match self {
            Acquisition::Recorded(a) => AcquisitionRef::Recorded(a.idx),
            Acquisition::Candidate { acquisition, .. } => AcquisitionRef::Candidate(acquisition.idx),
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Acquisition::Recorded(a) => &a.name,
            Acquisition::Candidate { acquisition, .. } => &acquisition.name,
        }
    }

    pub fn user(&self) -> UserId {
        match self {
            Acquisition::Recorded(a) => a.user,
            Acquisition::Candidate { acquisition, .. } => acquisition.user,
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            Acquisition::Recorded(a) => a.priority,
            Acquisition::Candidate { acquisition, .. } => acquisition.priority,
        }
    }

    pub fn satellite(&self) -> SatelliteId {
        match self {
            Acquisition::Recorded(a) => a.satellite,
            Acquisition::Candidate { window, .. } => window.satellite,
        }
    }

    /// Time at which the data exists onboard.
    pub fn acquisition_time(&self) -> f64 {
        match self {
            Acquisition::Recorded(a) => a.acquisition_time,
            Acquisition::Candidate { selection, .. } => selection.end,
        }
    }

    /// Bits
    pub fn volume(&self) -> u64 {
        match self {
            Acquisition::Recorded(a) => a.volume,
            Acquisition::Candidate { window, .. } => window.volume,
        }
    }
}
