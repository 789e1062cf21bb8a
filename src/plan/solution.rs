use crate::plan::error::PlanError;
use crate::plan::types::{
    Acquisition, AcquisitionAssignment, AcquisitionRef, AcquisitionSelection, DownloadAssignment,
    DownloadSelection,
};
use crate::problem::{CandidateId, PlanningProblem, SatelliteId};

/// Result of planning one problem: which candidates are realized and which
/// acquisitions are downloaded.
///
/// Selection state lives here, keyed by entity index, so the problem itself
/// stays immutable.
#[derive(Debug, Clone)]
pub struct SolutionPlan<'p> {
    problem: &'p PlanningProblem,
    acquisition_selections: Vec<Option<AcquisitionSelection>>,
    candidate_downloads: Vec<Option<DownloadSelection>>,
    recorded_downloads: Vec<Option<DownloadSelection>>,
    planned_acquisitions: Vec<CandidateId>,
    planned_downloads: Vec<AcquisitionRef>,
}

impl<'p> SolutionPlan<'p> {
    pub fn new(problem: &'p PlanningProblem) -> Self {
        let n_candidates = problem.candidate_acquisitions().len();
        Self {
            problem,
            acquisition_selections: vec![None; n_candidates],
            candidate_downloads: vec![None; n_candidates],
            recorded_downloads: vec![None; problem.recorded_acquisitions().len()],
            planned_acquisitions: Vec::new(),
            planned_downloads: Vec::new(),
        }
    }

    pub fn problem(&self) -> &'p PlanningProblem {
        self.problem
    }

    /// Realize a candidate in one of its windows.
    ///
    /// A candidate that already has a selection is left untouched; returns
    /// whether the assignment was taken.
    pub fn apply_acquisition_assignment(
        &mut self,
        assignment: AcquisitionAssignment,
    ) -> Result<bool, PlanError> {
        let problem = self.problem;
        let candidate = problem.candidate_acquisition(assignment.candidate)?;
        let slot = &mut self.acquisition_selections[candidate.idx.index()];
        if slot.is_some() {
            log::debug!(
                "Candidate {} already planned, ignoring repeated assignment",
                candidate.name
            );
            return Ok(false);
        }

        candidate.window(assignment.window)?;
        *slot = Some(AcquisitionSelection {
            window: assignment.window,
            start: assignment.start,
            end: assignment.end,
        });
        self.planned_acquisitions.push(candidate.idx);
        Ok(true)
    }

    /// Record a download for an acquisition of either kind.
    ///
    /// Not guarded: a second call for the same acquisition overwrites its
    /// selection and appends another entry to the download list.
    pub fn apply_download_assignment(
        &mut self,
        assignment: DownloadAssignment,
    ) -> Result<(), PlanError> {
        let problem = self.problem;
        problem.download_window(assignment.window)?;
        let selection = DownloadSelection {
            window: assignment.window,
            start: assignment.start,
            end: assignment.end,
        };

        let slot = match assignment.acquisition {
            AcquisitionRef::Recorded(id) => {
                problem.recorded_acquisition(id)?;
                &mut self.recorded_downloads[id.index()]
            }
            AcquisitionRef::Candidate(id) => {
                problem.candidate_acquisition(id)?;
                &mut self.candidate_downloads[id.index()]
            }
        };
        if slot.is_some() {
            log::warn!(
                "{} {} downloaded twice, keeping the last assignment",
                assignment.acquisition.kind(),
                assignment.acquisition.index()
            );
        }
        *slot = Some(selection);
        self.planned_downloads.push(assignment.acquisition);
        Ok(())
    }

    pub fn acquisition_selection(&self, id: CandidateId) -> Option<&AcquisitionSelection> {
        self.acquisition_selections.get(id.index())?.as_ref()
    }

    pub fn download_selection(&self, id: AcquisitionRef) -> Option<&DownloadSelection> {
        match id {
            AcquisitionRef::Recorded(r) => self.recorded_downloads.get(r.index())?.as_ref(),
            AcquisitionRef::Candidate(c) => self.candidate_downloads.get(c.index())?.as_ref(),
        }
    }

    /// Realized candidates, in first-assignment order.
    pub fn planned_acquisitions(&self) -> &[CandidateId] {
        &self.planned_acquisitions
    }

    /// Downloaded acquisitions, in assignment order.
    pub fn planned_downloads(&self) -> &[AcquisitionRef] {
        &self.planned_downloads
    }

    /// Resolve a handle into a realized acquisition.
    pub fn acquisition(&self, id: AcquisitionRef) -> Result<Acquisition<'_>, PlanError> {
        match id {
            AcquisitionRef::Recorded(r) => {
                Ok(Acquisition::Recorded(self.problem.recorded_acquisition(r)?))
            }
            AcquisitionRef::Candidate(c) => {
                let acquisition = self.problem.candidate_acquisition(c)?;
                let selection = self
                    .acquisition_selections
                    .get(c.index())
                    .and_then(Option::as_ref)
                    .ok_or(PlanError::NotRealized(c))?;
                let window = acquisition.window(selection.window)?;
                Ok(Acquisition::Candidate {
                    acquisition,
                    window,
                    selection,
                })
            }
        }
    }

    /// Acquisitions the satellite has to transmit: its recorded ones, then the
    /// planned candidates realized on it, in list order.
    pub fn downloadable_acquisitions(
        &self,
        satellite: SatelliteId,
    ) -> Result<Vec<Acquisition<'_>>, PlanError> {
        let mut result: Vec<Acquisition<'_>> = self
            .problem
            .recorded_acquisitions()
            .iter()
            .filter(|a| a.satellite == satellite)
            .map(Acquisition::Recorded)
            .collect();

        for &id in &self.planned_acquisitions {
            let acquisition = self.acquisition(AcquisitionRef::Candidate(id))?;
            if acquisition.satellite() == satellite {
                result.push(acquisition);
            }
        }
        Ok(result)
    }

    /// The download records of this plan, in list order.
    pub fn download_assignments(&self) -> Vec<DownloadAssignment> {
        self.planned_downloads
            .iter()
            .filter_map(|&id| {
                self.download_selection(id).map(|s| DownloadAssignment {
                    acquisition: id,
                    window: s.window,
                    start: s.start,
                    end: s.end,
                })
            })
            .collect()
    }

    /// The acquisition records of this plan, in list order.
    pub fn acquisition_assignments(&self) -> Vec<AcquisitionAssignment> {
        self.planned_acquisitions
            .iter()
            .filter_map(|&id| {
                self.acquisition_selection(id).map(|s| AcquisitionAssignment {
                    candidate: id,
                    window: s.window,
                    start: s.start,
                    end: s.end,
                })
            })
            .collect()
    }
}
