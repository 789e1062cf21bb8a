use std::fmt;

use serde::Serialize;

use crate::problem::PlanningProblem;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemStatistics {
    pub satellites: usize,
    pub users: usize,
    pub stations: usize,
    pub recorded: BreakdownCount,
    pub candidates: BreakdownCount,
    pub acquisition_windows: usize,
    pub download_windows: usize,
}

/// A count split by priority level and by user index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownCount {
    pub total: usize,
    pub by_priority: [usize; 2],
    pub by_user: Vec<usize>,
}

impl BreakdownCount {
    fn new(users: usize) -> Self {
        Self {
            total: 0,
            by_priority: [0; 2],
            by_user: vec![0; users],
        }
    }

    fn add(&mut self, priority: u8, user: usize) {
        self.total += 1;
        if let Some(slot) = self.by_priority.get_mut(priority as usize) {
            *slot += 1;
        }
        if let Some(slot) = self.by_user.get_mut(user) {
            *slot += 1;
        }
    }
}

impl ProblemStatistics {
    pub fn collect(pb: &PlanningProblem) -> Self {
        let n_users = pb.users().len();

        let mut recorded = BreakdownCount::new(n_users);
        for a in pb.recorded_acquisitions() {
            recorded.add(a.priority, a.user.index());
        }

        let mut candidates = BreakdownCount::new(n_users);
        for a in pb.candidate_acquisitions() {
            candidates.add(a.priority, a.user.index());
        }

        Self {
            satellites: pb.satellites().len(),
            users: n_users,
            stations: pb.stations().len(),
            recorded,
            candidates,
            acquisition_windows: pb.acquisition_windows().count(),
            download_windows: pb.download_windows().len(),
        }
    }
}

impl fmt::Display for ProblemStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "satellites: {}", self.satellites)?;
        writeln!(f, "users: {}", self.users)?;
        writeln!(f, "stations: {}", self.stations)?;
        writeln!(f, "recorded acquisitions: {}", self.recorded.total)?;
        writeln!(f, "  by priority: {:?}", self.recorded.by_priority)?;
        writeln!(f, "  by user: {:?}", self.recorded.by_user)?;
        writeln!(f, "candidate acquisitions: {}", self.candidates.total)?;
        writeln!(f, "  by priority: {:?}", self.candidates.by_priority)?;
        writeln!(f, "  by user: {:?}", self.candidates.by_user)?;
        writeln!(f, "acquisition windows: {}", self.acquisition_windows)?;
        write!(f, "download windows: {}", self.download_windows)
    }
}
