use crate::infra::{parse_date, today_or_local};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::fmt::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use team_probation::config::AppConfig;
use team_probation::deltas::{point_deltas, DeltaRange, DeltaReport};
use team_probation::error::AppError;
use team_probation::notifications::{
    FailureNotice, JsonFileLedger, NotificationLedger, ProbationNotifier, TracingSink,
    PROBATION_FAILED,
};
use team_probation::probation::{evaluate_team, MemberReport, ProbationStatus, TeamEvaluation};
use team_probation::snapshots::{SnapshotDirectory, SnapshotSeries};
use team_probation::telemetry;

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Folder holding the dated snapshot CSVs (overrides DATA_FOLDER)
    #[arg(long)]
    pub(crate) data_folder: Option<PathBuf>,
    /// Print the full evaluation as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DeltaArgs {
    /// last_day, last_week, last_month, last_year or custom
    #[arg(long, default_value = "last_day")]
    pub(crate) range: String,
    /// Custom range start (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Custom range end (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: Option<NaiveDate>,
    /// Date the named ranges are resolved against. Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    #[arg(long)]
    pub(crate) data_folder: Option<PathBuf>,
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct NotifyArgs {
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    #[arg(long)]
    pub(crate) data_folder: Option<PathBuf>,
    /// List pending notices without delivering or recording anything
    #[arg(long)]
    pub(crate) dry_run: bool,
}

fn prepare(data_folder: Option<PathBuf>) -> Result<(AppConfig, SnapshotDirectory), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(folder) = data_folder {
        config.snapshots.data_folder = folder;
    }
    telemetry::init(&config.telemetry)?;

    let directory = SnapshotDirectory::from_config(&config.snapshots);
    Ok((config, directory))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let (_, directory) = prepare(args.data_folder)?;
    let series = directory.load_series()?;
    let evaluation = evaluate_team(&series, today_or_local(args.today));

    if args.json {
        print_json(&evaluation)
    } else {
        print!("{}", render_evaluation(&evaluation));
        Ok(())
    }
}

pub(crate) fn run_delta(args: DeltaArgs) -> Result<(), AppError> {
    let (_, directory) = prepare(args.data_folder)?;
    let series = directory.load_series()?;
    let range = DeltaRange::parse(&args.range, args.start, args.end)?;
    let report = point_deltas(&series, range, today_or_local(args.today))?;

    if args.json {
        print_json(&report)
    } else {
        print!("{}", render_deltas(&report));
        Ok(())
    }
}

pub(crate) fn run_notify(args: NotifyArgs) -> Result<(), AppError> {
    let (config, directory) = prepare(args.data_folder)?;
    let series = directory.load_series()?;
    let today = today_or_local(args.today);
    let evaluation = evaluate_team(&series, today);
    let snapshot = snapshot_label(&directory, &series)?;

    let ledger = Arc::new(JsonFileLedger::open(&config.notifications.history_file)?);

    if args.dry_run {
        println!("Dry run against {snapshot}");
        for report in evaluation.failed() {
            if ledger.has_been_notified(&report.name, PROBATION_FAILED)? {
                println!("- {}: already notified", report.name);
            } else {
                let notice = FailureNotice::from_report(report);
                println!("- {}: would notify\n{}", report.name, notice.body);
            }
        }
        return Ok(());
    }

    let notifier = ProbationNotifier::new(
        ledger,
        Arc::new(TracingSink),
        config.notifications.admin_emails.clone(),
    );
    match notifier.notify(&evaluation, &snapshot, today)? {
        Some(summary) => println!(
            "Checked {} failed member(s): {} sent, {} already notified, {} delivery failure(s)",
            summary.checked, summary.sent, summary.skipped, summary.failed
        ),
        None => println!("{snapshot} already processed on {today}; nothing to do"),
    }
    Ok(())
}

/// File name of the evaluated snapshot, falling back to its date.
fn snapshot_label(
    directory: &SnapshotDirectory,
    series: &SnapshotSeries,
) -> Result<String, AppError> {
    let Some(latest) = series.latest() else {
        return Ok("no-snapshot".to_string());
    };
    Ok(directory
        .file_for(latest.date)?
        .map(|file| file.file_name())
        .unwrap_or_else(|| latest.date.to_string()))
}

pub(crate) fn render_evaluation(evaluation: &TeamEvaluation) -> String {
    render(|out| write_evaluation(out, evaluation))
}

pub(crate) fn render_deltas(report: &DeltaReport) -> String {
    render(|out| write_deltas(out, report))
}

/// Formatting into a `String` cannot fail; a failed render yields what was written so far.
fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    if let Err(err) = write(&mut out) {
        tracing::warn!(error = %err, "report rendering stopped early");
    }
    out
}

fn write_evaluation<W: Write>(out: &mut W, evaluation: &TeamEvaluation) -> fmt::Result {
    let latest = evaluation
        .latest_snapshot
        .map(|date| date.to_string())
        .unwrap_or_else(|| "none".to_string());
    writeln!(
        out,
        "Probation report as of {} ({} snapshot(s), latest {latest})",
        evaluation.evaluated_on, evaluation.snapshot_count
    )?;
    writeln!(
        out,
        "- {} failed | {} in progress | {} passed",
        evaluation.count(ProbationStatus::Failed),
        evaluation.count(ProbationStatus::InProgress),
        evaluation.count(ProbationStatus::Passed)
    )?;

    for report in &evaluation.reports {
        write_member(out, report)?;
    }

    if !evaluation.skipped.is_empty() {
        writeln!(out, "\nSkipped members:")?;
        for skipped in &evaluation.skipped {
            writeln!(out, "- {}: {}", skipped.name, skipped.reason)?;
        }
    }
    Ok(())
}

fn write_member<W: Write>(out: &mut W, report: &MemberReport) -> fmt::Result {
    writeln!(
        out,
        "\n{} [{}] joined {} ({} days) | {} points",
        report.name,
        report.probation_status.label(),
        report.joined_date,
        report.days_since_joined,
        report.current_points
    )?;
    for milestone in &report.milestones {
        let at_deadline = milestone
            .points_at_deadline
            .map(|points| points.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        writeln!(
            out,
            "  {}: {} (deadline {}, target {}, at deadline {at_deadline}, {} day(s) left)",
            milestone.label,
            milestone.outcome.label(),
            milestone.deadline,
            milestone.target_points,
            milestone.days_left
        )?;
    }

    let Some(status) = report.post_probation_status else {
        return Ok(());
    };
    writeln!(out, "  Post-probation: {}", status.label())?;
    for period in &report.periods {
        let earned = period
            .earned
            .map(|points| points.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        let marker = if period.is_current { " (current)" } else { "" };
        writeln!(
            out,
            "    Period {} {}..{}{marker}: {} (earned {earned} of {})",
            period.index,
            period.start,
            period.end,
            period.status.label(),
            period.target_points
        )?;
        if let Some(projection) = &period.projection {
            writeln!(
                out,
                "      {:.0}/day over {} day(s), projected {:.0}, needs {:.0}/day for the remaining {}",
                projection.daily_rate,
                projection.days_elapsed,
                projection.projected_total,
                projection.daily_needed,
                projection.days_remaining
            )?;
        }
    }
    Ok(())
}

fn write_deltas<W: Write>(out: &mut W, report: &DeltaReport) -> fmt::Result {
    writeln!(
        out,
        "Point deltas {} -> {}: {} total, {} active member(s)",
        report.start, report.end, report.total, report.active_members
    )?;
    for entry in &report.deltas {
        writeln!(
            out,
            "- {}: {:+} ({} -> {})",
            entry.member, entry.delta, entry.start_points, entry.end_points
        )?;
    }
    Ok(())
}
