use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::problem::types::{AcquisitionOpportunity, SatelliteId, StationId, UserId};
use crate::problem::{PlanningProblem, ProblemError};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown {kind} '{name}'")]
    UnknownReference { kind: &'static str, name: String },
    #[error("duplicate {kind} '{name}'")]
    DuplicateName { kind: &'static str, name: String },
    #[error("acquisition '{name}': priority must be 0 or 1, got {priority}")]
    InvalidPriority { name: String, priority: u8 },
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    horizon: HorizonEntry,
    #[serde(default)]
    epoch: Option<DateTime<Utc>>,
    #[serde(default)]
    satellites: Vec<NamedEntry>,
    #[serde(default)]
    stations: Vec<NamedEntry>,
    #[serde(default)]
    users: Vec<UserEntry>,
    #[serde(default)]
    candidate_acquisitions: Vec<CandidateEntry>,
    #[serde(default)]
    recorded_acquisitions: Vec<RecordedEntry>,
    #[serde(default)]
    download_windows: Vec<DownloadWindowEntry>,
}

#[derive(Debug, Deserialize)]
struct HorizonEntry {
    start: f64,
    end: f64,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    name: String,
    quota: f64,
}

#[derive(Debug, Deserialize)]
struct CandidateEntry {
    name: String,
    user: String,
    priority: u8,
    #[serde(default)]
    opportunities: Vec<OpportunityEntry>,
}

#[derive(Debug, Deserialize)]
struct OpportunityEntry {
    satellite: String,
    earliest_start: f64,
    latest_start: f64,
    duration: f64,
    zenith_angle: f64,
    roll_angle: f64,
    cloud_probability: f64,
    volume: u64,
}

#[derive(Debug, Deserialize)]
struct RecordedEntry {
    id: u64,
    user: String,
    priority: u8,
    satellite: String,
    acquisition_time: f64,
    volume: u64,
}

#[derive(Debug, Deserialize)]
struct DownloadWindowEntry {
    satellite: String,
    station: String,
    start: f64,
    end: f64,
}

/// Name to index tables, filled while the system entities are registered.
#[derive(Default)]
struct Names {
    satellites: HashMap<String, SatelliteId>,
    stations: HashMap<String, StationId>,
    users: HashMap<String, UserId>,
}

fn register<T: Copy>(
    table: &mut HashMap<String, T>,
    kind: &'static str,
    name: &str,
    id: T,
) -> Result<(), ScenarioError> {
    if table.insert(name.to_string(), id).is_some() {
        return Err(ScenarioError::DuplicateName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn resolve<T: Copy>(
    table: &HashMap<String, T>,
    kind: &'static str,
    name: &str,
) -> Result<T, ScenarioError> {
    table
        .get(name)
        .copied()
        .ok_or_else(|| ScenarioError::UnknownReference {
            kind,
            name: name.to_string(),
        })
}

fn check_priority(name: &str, priority: u8) -> Result<u8, ScenarioError> {
    if priority > 1 {
        return Err(ScenarioError::InvalidPriority {
            name: name.to_string(),
            priority,
        });
    }
    Ok(priority)
}

pub fn load_scenario(path: impl AsRef<Path>) -> Result<PlanningProblem, ScenarioError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let problem = parse_scenario(&content)?;
    log::info!(
        "Loaded scenario {} ({} candidate, {} recorded acquisitions, {} download windows)",
        path.display(),
        problem.candidate_acquisitions().len(),
        problem.recorded_acquisitions().len(),
        problem.download_windows().len()
    );
    Ok(problem)
}

/// Build a problem from scenario YAML, clipping every window to the horizon
/// and dropping the ones left empty.
pub fn parse_scenario(yaml: &str) -> Result<PlanningProblem, ScenarioError> {
    let file: ScenarioFile = serde_yaml::from_str(yaml)?;
    let (h_start, h_end) = (file.horizon.start, file.horizon.end);

    let mut pb = PlanningProblem::new(h_start, h_end);
    if let Some(epoch) = file.epoch {
        pb = pb.with_epoch(epoch);
    }

    let mut names = Names::default();
    for user in &file.users {
        let id = pb.add_user(user.name.as_str(), user.quota);
        register(&mut names.users, "user", &user.name, id)?;
    }
    for sat in &file.satellites {
        let id = pb.add_satellite(sat.name.as_str());
        register(&mut names.satellites, "satellite", &sat.name, id)?;
    }
    for station in &file.stations {
        let id = pb.add_station(station.name.as_str());
        register(&mut names.stations, "station", &station.name, id)?;
    }

    let mut dropped = 0usize;
    for entry in &file.candidate_acquisitions {
        let user = resolve(&names.users, "user", &entry.user)?;
        let priority = check_priority(&entry.name, entry.priority)?;
        let candidate = pb.add_candidate_acquisition(entry.name.as_str(), user, priority)?;

        for opp in &entry.opportunities {
            let satellite = resolve(&names.satellites, "satellite", &opp.satellite)?;
            let earliest_start = opp.earliest_start.max(h_start);
            let latest_start = opp.latest_start.min(h_end);
            if earliest_start > latest_start {
                dropped += 1;
                continue;
            }
            pb.add_acquisition_window(
                candidate,
                AcquisitionOpportunity {
                    satellite,
                    earliest_start,
                    latest_start,
                    duration: opp.duration,
                    volume: opp.volume,
                    zenith_angle: opp.zenith_angle,
                    roll_angle: opp.roll_angle,
                    cloud_probability: opp.cloud_probability,
                },
            )?;
        }
    }

    for entry in &file.recorded_acquisitions {
        let name = format!("REC_{}", entry.id);
        let user = resolve(&names.users, "user", &entry.user)?;
        let satellite = resolve(&names.satellites, "satellite", &entry.satellite)?;
        let priority = check_priority(&name, entry.priority)?;
        pb.add_recorded_acquisition(
            name,
            user,
            priority,
            satellite,
            entry.acquisition_time,
            entry.volume,
        )?;
    }

    for entry in &file.download_windows {
        let satellite = resolve(&names.satellites, "satellite", &entry.satellite)?;
        let station = resolve(&names.stations, "station", &entry.station)?;
        let start = entry.start.max(h_start);
        let end = entry.end.min(h_end);
        if start > end {
            dropped += 1;
            continue;
        }
        pb.add_download_window(satellite, station, start, end)?;
    }

    if dropped > 0 {
        log::debug!("Dropped {} windows outside the horizon", dropped);
    }

    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{CandidateId, DownloadWindowId, RecordedId};

    const SCENARIO: &str = r#"
horizon: { start: 100, end: 1000 }
epoch: 2026-01-12T10:00:00Z
satellites: [{ name: SAT1 }, { name: SAT2 }]
stations: [{ name: TLS }]
users:
  - { name: alice, quota: 0.6 }
  - { name: bob, quota: 0.4 }
candidate_acquisitions:
  - name: A1
    user: alice
    priority: 1
    opportunities:
      - { satellite: SAT1, earliest_start: 50, latest_start: 300, duration: 10, zenith_angle: 0.1, roll_angle: 0.2, cloud_probability: 0.3, volume: 4000 }
      - { satellite: SAT2, earliest_start: 10, latest_start: 90, duration: 10, zenith_angle: 0.1, roll_angle: 0.2, cloud_probability: 0.3, volume: 4000 }
      - { satellite: SAT2, earliest_start: 900, latest_start: 1200, duration: 10, zenith_angle: 0.1, roll_angle: -0.4, cloud_probability: 0.0, volume: 2000 }
  - name: A2
    user: bob
    priority: 0
    opportunities:
      - { satellite: SAT1, earliest_start: 1100, latest_start: 1200, duration: 10, zenith_angle: 0.1, roll_angle: 0.2, cloud_probability: 0.3, volume: 4000 }
recorded_acquisitions:
  - { id: 7, user: bob, priority: 0, satellite: SAT2, acquisition_time: 120, volume: 500 }
download_windows:
  - { satellite: SAT1, station: TLS, start: 0, end: 400 }
  - { satellite: SAT2, station: TLS, start: 950, end: 1300 }
  - { satellite: SAT2, station: TLS, start: 1100, end: 1200 }
"#;

    #[test]
    fn clips_and_drops_windows() {
        let pb = parse_scenario(SCENARIO).unwrap();
        assert_eq!(pb.horizon().start, 100.0);
        assert!(pb.instant(0.0).is_some());

        let a1 = pb.candidate_acquisition(CandidateId(0)).unwrap();
        assert_eq!(a1.windows.len(), 2);
        assert_eq!(a1.windows[0].earliest_start, 100.0);
        assert_eq!(a1.windows[0].latest_start, 300.0);
        assert_eq!(a1.windows[1].idx, 1);
        assert_eq!(a1.windows[1].latest_start, 1000.0);
        assert_eq!(a1.windows[1].roll_angle, -0.4);

        // Kept even though every opportunity fell outside the horizon
        let a2 = pb.candidate_acquisition(CandidateId(1)).unwrap();
        assert!(a2.windows.is_empty());

        assert_eq!(pb.download_windows().len(), 2);
        let w0 = pb.download_window(DownloadWindowId(0)).unwrap();
        assert_eq!((w0.start, w0.end), (100.0, 400.0));
        let w1 = pb.download_window(DownloadWindowId(1)).unwrap();
        assert_eq!((w1.start, w1.end), (950.0, 1000.0));

        let h = pb.horizon();
        for w in pb.acquisition_windows() {
            assert!(h.start <= w.earliest_start);
            assert!(w.earliest_start <= w.latest_start);
            assert!(w.latest_start <= h.end);
        }
        for d in pb.download_windows() {
            assert!(h.start <= d.start && d.start <= d.end && d.end <= h.end);
        }
    }

    #[test]
    fn recorded_acquisitions_are_named_from_id() {
        let pb = parse_scenario(SCENARIO).unwrap();
        let rec = pb.recorded_acquisition(RecordedId(0)).unwrap();
        assert_eq!(rec.name, "REC_7");
        assert_eq!(pb.satellite(rec.satellite).unwrap().name, "SAT2");
        assert_eq!(pb.user(rec.user).unwrap().name, "bob");
    }

    #[test]
    fn unknown_reference() {
        let yaml = r#"
horizon: { start: 0, end: 10 }
satellites: [{ name: SAT1 }]
stations: [{ name: TLS }]
download_windows:
  - { satellite: SAT9, station: TLS, start: 0, end: 5 }
"#;
        match parse_scenario(yaml) {
            Err(ScenarioError::UnknownReference { kind, name }) => {
                assert_eq!(kind, "satellite");
                assert_eq!(name, "SAT9");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn duplicate_names_and_bad_priority() {
        let dup = r#"
horizon: { start: 0, end: 10 }
satellites: [{ name: SAT1 }, { name: SAT1 }]
"#;
        assert!(matches!(
            parse_scenario(dup),
            Err(ScenarioError::DuplicateName { .. })
        ));

        let prio = r#"
horizon: { start: 0, end: 10 }
users: [{ name: u, quota: 1 }]
candidate_acquisitions:
  - { name: A, user: u, priority: 2 }
"#;
        assert!(matches!(
            parse_scenario(prio),
            Err(ScenarioError::InvalidPriority { priority: 2, .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.yaml");
        std::fs::write(&path, SCENARIO).unwrap();

        let pb = load_scenario(&path).unwrap();
        assert_eq!(pb.satellites().len(), 2);
        assert!(matches!(
            load_scenario(dir.path().join("missing.yaml")),
            Err(ScenarioError::Io(_))
        ));
    }
}
