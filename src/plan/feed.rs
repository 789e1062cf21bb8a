//! Text feeds exchanged with the acquisition optimizer and downstream tools.
//!
//! Acquisition feed lines: `<candidate> <window> <start> <end>`.
//! Download feed lines: `<REC|CAND> <acquisition> <download window> <start> <end>`.

use std::fmt::Write as _;
use std::path::Path;

use crate::plan::{
    AcquisitionAssignment, AcquisitionKind, AcquisitionRef, DownloadAssignment, FeedError,
    SolutionPlan,
};
use crate::problem::{CandidateId, DownloadWindowId};

pub fn parse_acquisition_feed(content: &str) -> Result<Vec<AcquisitionAssignment>, FeedError> {
    records(content)
        .map(|(line_no, fields)| {
            let err = |msg: String| FeedError::Line(line_no, msg);
            let [candidate, window, start, end] = fields_array::<4>(&fields).map_err(err)?;
            Ok(AcquisitionAssignment {
                candidate: CandidateId(parse_field(candidate, "candidate index").map_err(err)?),
                window: parse_field(window, "window index").map_err(err)?,
                start: parse_field(start, "start time").map_err(err)?,
                end: parse_field(end, "end time").map_err(err)?,
            })
        })
        .collect()
}

pub fn parse_download_feed(content: &str) -> Result<Vec<DownloadAssignment>, FeedError> {
    records(content)
        .map(|(line_no, fields)| {
            let err = |msg: String| FeedError::Line(line_no, msg);
            let [kind, index, window, start, end] = fields_array::<5>(&fields).map_err(err)?;
            let kind: AcquisitionKind = kind.parse().map_err(err)?;
            Ok(DownloadAssignment {
                acquisition: AcquisitionRef::new(
                    kind,
                    parse_field(index, "acquisition index").map_err(err)?,
                ),
                window: DownloadWindowId(parse_field(window, "window index").map_err(err)?),
                start: parse_field(start, "start time").map_err(err)?,
                end: parse_field(end, "end time").map_err(err)?,
            })
        })
        .collect()
}

/// Apply an acquisition feed to a plan; returns how many records were taken.
pub fn read_acquisition_plan(
    plan: &mut SolutionPlan<'_>,
    path: impl AsRef<Path>,
) -> Result<usize, FeedError> {
    let content = std::fs::read_to_string(path)?;
    let mut applied = 0;
    for (i, assignment) in parse_acquisition_feed(&content)?.into_iter().enumerate() {
        if plan
            .apply_acquisition_assignment(assignment)
            .map_err(|e| FeedError::Apply(i + 1, e))?
        {
            applied += 1;
        }
    }
    Ok(applied)
}

pub fn read_download_plan(
    plan: &mut SolutionPlan<'_>,
    path: impl AsRef<Path>,
) -> Result<usize, FeedError> {
    let content = std::fs::read_to_string(path)?;
    let assignments = parse_download_feed(&content)?;
    for (i, assignment) in assignments.iter().enumerate() {
        plan.apply_download_assignment(*assignment)
            .map_err(|e| FeedError::Apply(i + 1, e))?;
    }
    Ok(assignments.len())
}

pub fn format_acquisition_feed(assignments: &[AcquisitionAssignment]) -> String {
    let mut out = String::new();
    for a in assignments {
        let _ = writeln!(out, "{} {} {:?} {:?}", a.candidate, a.window, a.start, a.end);
    }
    out
}

pub fn format_download_feed(assignments: &[DownloadAssignment]) -> String {
    let mut out = String::new();
    for a in assignments {
        let _ = writeln!(
            out,
            "{} {} {} {:?} {:?}",
            a.acquisition.kind(),
            a.acquisition.index(),
            a.window,
            a.start,
            a.end
        );
    }
    out
}

pub fn write_download_plan(plan: &SolutionPlan<'_>, path: impl AsRef<Path>) -> Result<(), FeedError> {
    std::fs::write(path, format_download_feed(&plan.download_assignments()))?;
    Ok(())
}

/// Non-blank lines, split on whitespace, with 1-based line numbers.
fn records(content: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, fields)| !fields.is_empty())
}

fn fields_array<'a, const N: usize>(fields: &[&'a str]) -> Result<[&'a str; N], String> {
    <[&str; N]>::try_from(fields)
        .map_err(|_| format!("expected {} fields, found {}", N, fields.len()))
}

fn parse_field<T: std::str::FromStr>(value: &str, what: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| format!("invalid {} '{}': {}", what, value, e))
}
