use std::cmp::Ordering;

use rayon::prelude::*;

use crate::config::PlannerConfig;
use crate::downlink::{DownlinkSummary, SatelliteDownlink};
use crate::plan::{DownloadAssignment, PlanError, SolutionPlan};
use crate::problem::{DownloadWindow, SatelliteId};

/// Greedy downlink planner.
///
/// Each satellite has a single downlink channel. Acquisitions are taken in
/// order of completion time and packed into the satellite's download windows
/// in chronological order, never backtracking. Once the windows are used up
/// the remaining acquisitions of that satellite stay on board.
#[derive(Debug, Clone)]
pub struct DownlinkScheduler {
    downlink_rate: f64,
}

impl DownlinkScheduler {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            downlink_rate: config.downlink_rate,
        }
    }

    /// Seconds needed to transmit `volume` bits.
    pub fn download_duration(&self, volume: u64) -> f64 {
        volume as f64 / self.downlink_rate
    }

    /// Compute the downloads of one satellite without touching the plan.
    pub fn plan_satellite(
        &self,
        plan: &SolutionPlan<'_>,
        satellite: SatelliteId,
    ) -> Result<SatelliteDownlink, PlanError> {
        let problem = plan.problem();

        let mut pending = plan.downloadable_acquisitions(satellite)?;
        pending.sort_by(|a, b| by_time(a.acquisition_time(), b.acquisition_time()));

        let mut windows: Vec<&DownloadWindow> = problem
            .download_windows()
            .iter()
            .filter(|w| w.satellite == satellite)
            .collect();
        windows.sort_by(|a, b| by_time(a.start, b.start));

        let mut run = SatelliteDownlink {
            satellite,
            eligible: pending.len(),
            assignments: Vec::new(),
        };

        let Some(&first) = windows.first() else {
            return Ok(run);
        };

        let mut window_idx = 0;
        let mut window = first;
        let mut clock = window.start;

        'acquisitions: for acquisition in &pending {
            // Data cannot leave before it exists
            clock = clock.max(acquisition.acquisition_time());
            let duration = self.download_duration(acquisition.volume());

            while clock + duration > window.end {
                window_idx += 1;
                match windows.get(window_idx) {
                    Some(&next) => {
                        window = next;
                        clock = clock.max(window.start);
                    }
                    None => break 'acquisitions,
                }
            }

            let assignment = DownloadAssignment {
                acquisition: acquisition.id(),
                window: window.idx,
                start: clock,
                end: clock + duration,
            };
            log::debug!(
                "{} -> window {} [{}, {}]",
                acquisition.name(),
                assignment.window,
                assignment.start,
                assignment.end
            );
            run.assignments.push(assignment);
            clock += duration;
        }

        Ok(run)
    }

    /// Plan one satellite and record its downloads in the plan.
    pub fn schedule_satellite(
        &self,
        plan: &mut SolutionPlan<'_>,
        satellite: SatelliteId,
    ) -> Result<SatelliteDownlink, PlanError> {
        let run = self.plan_satellite(plan, satellite)?;
        commit(plan, &run)?;
        Ok(run)
    }

    /// Plan every satellite of the problem.
    ///
    /// Satellites share no windows and no acquisitions, so their runs are
    /// computed in parallel; results are committed in satellite order.
    pub fn schedule_all(&self, plan: &mut SolutionPlan<'_>) -> Result<DownlinkSummary, PlanError> {
        let problem = plan.problem();
        let runs = {
            let view: &SolutionPlan<'_> = plan;
            problem
                .satellites()
                .par_iter()
                .map(|s| self.plan_satellite(view, s.idx))
                .collect::<Result<Vec<_>, _>>()?
        };

        for run in &runs {
            commit(plan, run)?;
        }
        Ok(DownlinkSummary { satellites: runs })
    }
}

fn commit(plan: &mut SolutionPlan<'_>, run: &SatelliteDownlink) -> Result<(), PlanError> {
    for assignment in &run.assignments {
        plan.apply_download_assignment(*assignment)?;
    }

    let name = plan
        .problem()
        .satellite(run.satellite)
        .map(|s| s.name.as_str())
        .unwrap_or("?");
    if run.stranded() > 0 {
        log::warn!(
            "{}: {} of {} acquisitions left on board",
            name,
            run.stranded(),
            run.eligible
        );
    }
    log::info!(
        "{}: downloaded {}/{} acquisitions ({:.1} s of downlink)",
        name,
        run.downloaded(),
        run.eligible,
        run.downlink_seconds()
    );
    Ok(())
}

fn by_time(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{AcquisitionAssignment, AcquisitionRef};
    use crate::problem::{
        AcquisitionOpportunity, CandidateId, DownloadWindowId, PlanningProblem, RecordedId,
        StationId, UserId,
    };

    fn scheduler(rate: f64) -> DownlinkScheduler {
        DownlinkScheduler::new(&PlannerConfig {
            downlink_rate: rate,
            ..PlannerConfig::default()
        })
    }

    /// One satellite, one station, one user, with the given download windows.
    fn problem(windows: &[(f64, f64)]) -> (PlanningProblem, SatelliteId) {
        let mut pb = PlanningProblem::new(0.0, 10_000.0);
        let sat = pb.add_satellite("SAT1");
        let st = pb.add_station("TLS");
        pb.add_user("alice", 1.0);
        for &(start, end) in windows {
            pb.add_download_window(sat, st, start, end).unwrap();
        }
        (pb, sat)
    }

    fn record(pb: &mut PlanningProblem, sat: SatelliteId, time: f64, volume: u64) {
        let name = format!("REC_{}", pb.recorded_acquisitions().len());
        pb.add_recorded_acquisition(name, UserId(0), 0, sat, time, volume)
            .unwrap();
    }

    fn candidate(pb: &mut PlanningProblem, sat: SatelliteId, volume: u64) -> CandidateId {
        let name = format!("CAND_{}", pb.candidate_acquisitions().len());
        let c = pb.add_candidate_acquisition(name, UserId(0), 1).unwrap();
        pb.add_acquisition_window(
            c,
            AcquisitionOpportunity {
                satellite: sat,
                earliest_start: 0.0,
                latest_start: 10_000.0,
                duration: 5.0,
                volume,
                zenith_angle: 0.0,
                roll_angle: 0.0,
                cloud_probability: 0.0,
            },
        )
        .unwrap();
        c
    }

    fn realize(plan: &mut SolutionPlan<'_>, c: CandidateId, end: f64) {
        plan.apply_acquisition_assignment(AcquisitionAssignment {
            candidate: c,
            window: 0,
            start: end - 5.0,
            end,
        })
        .unwrap();
    }

    fn spans(plan: &SolutionPlan<'_>) -> Vec<(f64, f64)> {
        plan.download_assignments()
            .iter()
            .map(|a| (a.start, a.end))
            .collect()
    }

    #[test]
    fn channel_busy_delays_next_download() {
        let (mut pb, sat) = problem(&[(0.0, 100.0)]);
        record(&mut pb, sat, 0.0, 200);
        record(&mut pb, sat, 5.0, 300);

        let mut plan = SolutionPlan::new(&pb);
        let run = scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();

        assert_eq!(run.downloaded(), 2);
        assert_eq!(spans(&plan), vec![(0.0, 20.0), (20.0, 50.0)]);
        assert_eq!(
            plan.planned_downloads(),
            &[
                AcquisitionRef::Recorded(RecordedId(0)),
                AcquisitionRef::Recorded(RecordedId(1))
            ]
        );
    }

    #[test]
    fn overflowing_download_is_dropped() {
        let (mut pb, sat) = problem(&[(0.0, 100.0)]);
        record(&mut pb, sat, 0.0, 600);
        record(&mut pb, sat, 5.0, 600);

        let mut plan = SolutionPlan::new(&pb);
        let run = scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();

        assert_eq!(spans(&plan), vec![(0.0, 60.0)]);
        assert_eq!(plan.planned_downloads().len(), 1);
        assert_eq!(run.eligible, 2);
        assert_eq!(run.stranded(), 1);
    }

    #[test]
    fn satellite_without_windows_downloads_nothing() {
        let (mut pb, sat) = problem(&[]);
        for t in [0.0, 10.0, 20.0] {
            record(&mut pb, sat, t, 100);
        }

        let mut plan = SolutionPlan::new(&pb);
        let run = scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();

        assert!(plan.planned_downloads().is_empty());
        assert_eq!(run.eligible, 3);
        assert_eq!(run.stranded(), 3);
    }

    #[test]
    fn empty_eligible_set_is_noop() {
        let (pb, sat) = problem(&[(0.0, 100.0)]);
        let mut plan = SolutionPlan::new(&pb);
        let run = scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();
        assert_eq!(run.eligible, 0);
        assert!(plan.planned_downloads().is_empty());
    }

    #[test]
    fn download_ending_on_window_end_is_accepted() {
        let (mut pb, sat) = problem(&[(0.0, 100.0)]);
        record(&mut pb, sat, 40.0, 600);

        let mut plan = SolutionPlan::new(&pb);
        scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();
        assert_eq!(spans(&plan), vec![(40.0, 100.0)]);
    }

    #[test]
    fn advances_to_next_window_and_waits_for_its_start() {
        // Windows given out of order; sorted by start before use
        let (mut pb, sat) = problem(&[(200.0, 300.0), (0.0, 50.0)]);
        record(&mut pb, sat, 0.0, 300);
        record(&mut pb, sat, 10.0, 300);

        let mut plan = SolutionPlan::new(&pb);
        scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();

        assert_eq!(spans(&plan), vec![(0.0, 30.0), (200.0, 230.0)]);
        let windows: Vec<_> = plan.download_assignments().iter().map(|a| a.window).collect();
        assert_eq!(windows, vec![DownloadWindowId(1), DownloadWindowId(0)]);
    }

    #[test]
    fn never_backtracks_to_earlier_window() {
        // The large item skips window 0; the small one after it could have
        // fit in window 0 but the cursor has already moved on.
        let (mut pb, sat) = problem(&[(0.0, 50.0), (100.0, 200.0)]);
        record(&mut pb, sat, 0.0, 800);
        record(&mut pb, sat, 1.0, 100);

        let mut plan = SolutionPlan::new(&pb);
        scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();

        assert_eq!(spans(&plan), vec![(100.0, 180.0), (180.0, 190.0)]);
    }

    #[test]
    fn exhaustion_stops_even_for_smaller_items() {
        let (mut pb, sat) = problem(&[(0.0, 100.0)]);
        record(&mut pb, sat, 0.0, 500);
        record(&mut pb, sat, 1.0, 2_000);
        record(&mut pb, sat, 2.0, 10);

        let mut plan = SolutionPlan::new(&pb);
        let run = scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();

        assert_eq!(spans(&plan), vec![(0.0, 50.0)]);
        assert_eq!(run.stranded(), 2);
    }

    #[test]
    fn candidates_use_selected_end_and_ties_keep_recorded_first() {
        let (mut pb, sat) = problem(&[(0.0, 1000.0)]);
        record(&mut pb, sat, 30.0, 100);
        let late = candidate(&mut pb, sat, 100);
        let tie = candidate(&mut pb, sat, 100);
        let unplanned = candidate(&mut pb, sat, 100);

        let mut plan = SolutionPlan::new(&pb);
        realize(&mut plan, late, 80.0);
        realize(&mut plan, tie, 30.0);

        scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();

        assert_eq!(
            plan.planned_downloads(),
            &[
                AcquisitionRef::Recorded(RecordedId(0)),
                AcquisitionRef::Candidate(tie),
                AcquisitionRef::Candidate(late)
            ]
        );
        assert_eq!(spans(&plan), vec![(30.0, 40.0), (40.0, 50.0), (80.0, 90.0)]);
        assert!(plan
            .download_selection(AcquisitionRef::Candidate(unplanned))
            .is_none());
    }

    #[test]
    fn downloads_are_serialized_and_inside_windows() {
        let (mut pb, sat) = problem(&[(0.0, 40.0), (60.0, 90.0), (95.0, 300.0)]);
        for (t, v) in [(0.0, 150), (2.0, 90), (3.0, 260), (50.0, 40), (70.0, 400), (71.0, 5)] {
            record(&mut pb, sat, t, v);
        }

        let mut plan = SolutionPlan::new(&pb);
        scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();
        let assignments = plan.download_assignments();
        assert!(!assignments.is_empty());

        for pair in assignments.windows(2) {
            assert!(pair[0].end <= pair[1].start);
            assert!(pair[0].start <= pair[1].start);
        }
        for a in &assignments {
            let w = pb.download_window(a.window).unwrap();
            assert!(w.start <= a.start && a.end <= w.end);
            let acq = plan.acquisition(a.acquisition).unwrap();
            assert!(a.start >= acq.acquisition_time());
        }
    }

    #[test]
    fn satellites_are_independent() {
        let mut pb = PlanningProblem::new(0.0, 1000.0);
        let s1 = pb.add_satellite("SAT1");
        let s2 = pb.add_satellite("SAT2");
        let s3 = pb.add_satellite("SAT3");
        let st = pb.add_station("TLS");
        pb.add_user("alice", 1.0);
        pb.add_download_window(s1, st, 0.0, 100.0).unwrap();
        pb.add_download_window(s2, st, 0.0, 100.0).unwrap();
        record(&mut pb, s2, 0.0, 500);
        record(&mut pb, s1, 0.0, 500);
        record(&mut pb, s3, 0.0, 500);
        let c = candidate(&mut pb, s1, 200);

        let mut plan = SolutionPlan::new(&pb);
        realize(&mut plan, c, 10.0);
        let summary = scheduler(10.0).schedule_all(&mut plan).unwrap();

        // Same channel start for both satellites: no shared clock
        let sat1 = plan
            .download_selection(AcquisitionRef::Recorded(RecordedId(1)))
            .unwrap();
        let sat2 = plan
            .download_selection(AcquisitionRef::Recorded(RecordedId(0)))
            .unwrap();
        assert_eq!((sat1.start, sat2.start), (0.0, 0.0));

        let counts: Vec<_> = summary
            .satellites
            .iter()
            .map(|s| (s.satellite, s.eligible, s.downloaded()))
            .collect();
        assert_eq!(counts, vec![(s1, 2, 2), (s2, 1, 1), (s3, 1, 0)]);
        assert_eq!(summary.downloaded(), 3);
        assert_eq!(summary.stranded(), 1);

        // Committed in satellite order
        assert_eq!(
            plan.planned_downloads(),
            &[
                AcquisitionRef::Recorded(RecordedId(1)),
                AcquisitionRef::Candidate(c),
                AcquisitionRef::Recorded(RecordedId(0))
            ]
        );
    }

    #[test]
    fn parallel_run_matches_sequential_run() {
        let mut pb = PlanningProblem::new(0.0, 5000.0);
        let st = pb.add_station("TLS");
        pb.add_user("alice", 1.0);
        let sats: Vec<_> = (0..4).map(|i| pb.add_satellite(format!("SAT{i}"))).collect();
        for (i, &sat) in sats.iter().enumerate() {
            for k in 0..3 {
                let start = (k * 400 + i * 37) as f64;
                pb.add_download_window(sat, st, start, start + 150.0).unwrap();
            }
            for k in 0..8 {
                record(&mut pb, sat, (k * 90 + i) as f64, 100 + 170 * k as u64);
            }
        }

        let sched = scheduler(10.0);
        let mut parallel = SolutionPlan::new(&pb);
        sched.schedule_all(&mut parallel).unwrap();

        let mut sequential = SolutionPlan::new(&pb);
        for &sat in &sats {
            sched.schedule_satellite(&mut sequential, sat).unwrap();
        }

        assert_eq!(
            parallel.download_assignments(),
            sequential.download_assignments()
        );
    }

    #[test]
    fn windows_to_other_stations_share_the_channel() {
        let (mut pb, sat) = problem(&[(0.0, 100.0)]);
        let other = pb.add_station("KIR");
        pb.add_download_window(sat, other, 0.0, 100.0).unwrap();
        record(&mut pb, sat, 0.0, 600);
        record(&mut pb, sat, 0.0, 600);

        let mut plan = SolutionPlan::new(&pb);
        scheduler(10.0).schedule_satellite(&mut plan, sat).unwrap();

        assert_eq!(spans(&plan), vec![(0.0, 60.0)]);
        assert_eq!(pb.download_window(DownloadWindowId(1)).unwrap().station, StationId(1));
    }
}
