mod config;
mod downlink;
mod plan;
mod problem;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;

use crate::config::PlannerConfig;
use crate::downlink::{DownlinkScheduler, DownlinkSummary};
use crate::plan::{feed, DownloadAssignment, SolutionPlan};
use crate::problem::{load_scenario, PlanningProblem, SatelliteId};

#[derive(Parser)]
#[command(name = "sat-o-plan")]
#[command(about = "Earth observation acquisition and downlink planning")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file and print its statistics
    Validate { scenario: String },
    /// Plan downloads for an acquisition plan
    Plan {
        scenario: String,
        /// Acquisition assignment feed from the optimizer
        #[arg(long)]
        acquisitions: String,
        #[arg(long)]
        config: Option<String>,
        /// Only plan downloads for this satellite
        #[arg(long)]
        satellite: Option<String>,
        /// Where to write the download feed (stdout if omitted)
        #[arg(long, short)]
        output: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Rebuild a plan from acquisition and download feeds
    Replay {
        scenario: String,
        #[arg(long)]
        acquisitions: String,
        #[arg(long)]
        downloads: String,
    },
    /// Print transition time estimates between a satellite's acquisition windows
    Transitions {
        scenario: String,
        #[arg(long)]
        satellite: String,
        #[arg(long)]
        config: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario } => validate(&scenario),
        Commands::Plan {
            scenario,
            acquisitions,
            config,
            satellite,
            output,
            format,
        } => plan(
            &scenario,
            &acquisitions,
            config.as_deref(),
            satellite.as_deref(),
            output.as_deref(),
            format,
        ),
        Commands::Replay {
            scenario,
            acquisitions,
            downloads,
        } => replay(&scenario, &acquisitions, &downloads),
        Commands::Transitions {
            scenario,
            satellite,
            config,
        } => transitions(&scenario, &satellite, config.as_deref()),
    }
}

fn load_problem(path: &str) -> Option<PlanningProblem> {
    match load_scenario(path) {
        Ok(pb) => Some(pb),
        Err(e) => {
            eprintln!("Error loading scenario {}: {}", path, e);
            None
        }
    }
}

fn load_config(path: Option<&str>) -> Option<PlannerConfig> {
    let Some(path) = path else {
        return Some(PlannerConfig::default());
    };
    match PlannerConfig::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            None
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(pb) = load_problem(path) else {
        return ExitCode::FAILURE;
    };

    let horizon = pb.horizon();
    println!(
        "Scenario is valid (horizon [{}, {}])",
        fmt_time(&pb, horizon.start),
        fmt_time(&pb, horizon.end)
    );
    println!("{}", pb.statistics());
    ExitCode::SUCCESS
}

#[derive(Serialize)]
struct PlanReport<'a> {
    summary: &'a DownlinkSummary,
    downloads: &'a [DownloadAssignment],
}

fn plan(
    path: &str,
    acquisitions: &str,
    config: Option<&str>,
    satellite: Option<&str>,
    output: Option<&str>,
    format: Format,
) -> ExitCode {
    let Some(config) = load_config(config) else {
        return ExitCode::FAILURE;
    };
    let Some(pb) = load_problem(path) else {
        return ExitCode::FAILURE;
    };

    let mut plan = SolutionPlan::new(&pb);
    match feed::read_acquisition_plan(&mut plan, acquisitions) {
        Ok(n) => log::info!("Applied {} acquisition assignments", n),
        Err(e) => {
            eprintln!("Error reading acquisition feed {}: {}", acquisitions, e);
            return ExitCode::FAILURE;
        }
    }

    let scheduler = DownlinkScheduler::new(&config);
    let result = match satellite {
        Some(name) => {
            let Some(sat) = find_satellite(&pb, name) else {
                return ExitCode::FAILURE;
            };
            scheduler
                .schedule_satellite(&mut plan, sat)
                .map(|run| DownlinkSummary {
                    satellites: vec![run],
                })
        }
        None => scheduler.schedule_all(&mut plan),
    };
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Downlink planning failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let downloads = plan.download_assignments();

    if let Some(out) = output {
        if let Err(e) = feed::write_download_plan(&plan, out) {
            eprintln!("Error writing download feed {}: {}", out, e);
            return ExitCode::FAILURE;
        }
    }

    match format {
        Format::Json => {
            let report = PlanReport {
                summary: &summary,
                downloads: &downloads,
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing report: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        Format::Text => {
            if output.is_none() {
                print!("{}", feed::format_download_feed(&downloads));
            }
            print_summary(&pb, &summary);
        }
    }
    ExitCode::SUCCESS
}

fn replay(path: &str, acquisitions: &str, downloads: &str) -> ExitCode {
    let Some(pb) = load_problem(path) else {
        return ExitCode::FAILURE;
    };

    let mut plan = SolutionPlan::new(&pb);
    if let Err(e) = feed::read_acquisition_plan(&mut plan, acquisitions) {
        eprintln!("Error reading acquisition feed {}: {}", acquisitions, e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = feed::read_download_plan(&mut plan, downloads) {
        eprintln!("Error reading download feed {}: {}", downloads, e);
        return ExitCode::FAILURE;
    }

    println!("Acquisitions ({}):", plan.planned_acquisitions().len());
    for a in plan.acquisition_assignments() {
        let name = pb
            .candidate_acquisition(a.candidate)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!(
            "  {} window {} [{}, {}]",
            name,
            a.window,
            fmt_time(&pb, a.start),
            fmt_time(&pb, a.end)
        );
    }

    println!("Downloads ({}):", plan.planned_downloads().len());
    for d in plan.download_assignments() {
        let name = plan
            .acquisition(d.acquisition)
            .map(|a| {
                let user = pb.user(a.user()).map(|u| u.name.as_str()).unwrap_or("?");
                format!("{} ({}, p{})", a.name(), user, a.priority())
            })
            .unwrap_or_else(|_| format!("{} {}", d.acquisition.kind(), d.acquisition.index()));
        let route = pb
            .download_window(d.window)
            .ok()
            .and_then(|w| {
                let sat = pb.satellite(w.satellite).ok()?;
                let station = pb.station(w.station).ok()?;
                Some(format!("{}/{}", sat.name, station.name))
            })
            .unwrap_or_else(|| "?".to_string());
        println!(
            "  {} window {} ({}) [{}, {}]",
            name,
            d.window,
            route,
            fmt_time(&pb, d.start),
            fmt_time(&pb, d.end)
        );
    }
    ExitCode::SUCCESS
}

fn transitions(path: &str, satellite: &str, config: Option<&str>) -> ExitCode {
    let Some(config) = load_config(config) else {
        return ExitCode::FAILURE;
    };
    let Some(pb) = load_problem(path) else {
        return ExitCode::FAILURE;
    };
    let Some(sat) = find_satellite(&pb, satellite) else {
        return ExitCode::FAILURE;
    };

    let windows: Vec<_> = pb
        .acquisition_windows()
        .filter(|w| w.satellite == sat)
        .collect();
    println!("{} acquisition windows on {}", windows.len(), satellite);
    for from in &windows {
        let row: Vec<String> = windows
            .iter()
            .map(|to| format!("{:.2}", pb.transition_time(from, to, &config)))
            .collect();
        println!("  {}/{}: {}", from.candidate, from.idx, row.join(" "));
    }
    ExitCode::SUCCESS
}

fn find_satellite(pb: &PlanningProblem, name: &str) -> Option<SatelliteId> {
    let found = pb.satellites().iter().find(|s| s.name == name).map(|s| s.idx);
    if found.is_none() {
        eprintln!("Unknown satellite: {}", name);
    }
    found
}

fn print_summary(pb: &PlanningProblem, summary: &DownlinkSummary) {
    for run in &summary.satellites {
        let name = pb
            .satellite(run.satellite)
            .map(|s| s.name.as_str())
            .unwrap_or("?");
        println!(
            "{}: {}/{} downloaded, {} left on board, downlink {}",
            name,
            run.downloaded(),
            run.eligible,
            run.stranded(),
            fmt_duration(run.downlink_seconds())
        );
    }
    println!(
        "Total: {}/{} downloaded, {} left on board",
        summary.downloaded(),
        summary.eligible(),
        summary.stranded()
    );
}

fn fmt_time(pb: &PlanningProblem, seconds: f64) -> String {
    match pb.instant(seconds) {
        Some(t) => t.to_rfc3339(),
        None => format!("{}", seconds),
    }
}

fn fmt_duration(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round().max(0.0) as u64;
    humantime::format_duration(Duration::from_millis(millis)).to_string()
}
