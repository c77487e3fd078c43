use super::aggregate::resolve_post_probation;
use super::classifier::classify_probation;
use super::domain::{Member, Milestone, Period, PostProbationStatus, ProbationStatus};
use super::milestones::evaluate_milestones;
use super::periods::generate_periods;
use crate::snapshots::{parse_joined_date, SnapshotSeries};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberReport {
    pub name: String,
    pub joined_date: NaiveDate,
    pub days_since_joined: i64,
    pub current_points: u64,
    pub probation_status: ProbationStatus,
    pub probation_end: NaiveDate,
    pub milestones: Vec<Milestone>,
    /// Only evaluated once probation has been passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_probation_status: Option<PostProbationStatus>,
    pub periods: Vec<Period>,
}

impl MemberReport {
    pub fn failed_milestones(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones
            .iter()
            .filter(|milestone| milestone.outcome.passed() == Some(false))
    }
}

/// Member left out of a run because no evaluation was possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMember {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamEvaluation {
    pub evaluated_on: NaiveDate,
    pub latest_snapshot: Option<NaiveDate>,
    pub snapshot_count: usize,
    pub reports: Vec<MemberReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedMember>,
}

impl TeamEvaluation {
    pub fn count(&self, status: ProbationStatus) -> usize {
        self.reports
            .iter()
            .filter(|report| report.probation_status == status)
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &MemberReport> {
        self.reports
            .iter()
            .filter(|report| report.probation_status == ProbationStatus::Failed)
    }
}

/// Evaluates one member against the full series as of `today`.
pub fn evaluate_member(member: &Member, series: &SnapshotSeries, today: NaiveDate) -> MemberReport {
    let milestones = evaluate_milestones(member, series, today);
    let probation_status = classify_probation(&milestones, today);
    let probation_end = member.probation_end();

    let (post_probation_status, periods) = if probation_status == ProbationStatus::Passed {
        if today < probation_end {
            (Some(PostProbationStatus::TooEarly), Vec::new())
        } else {
            let periods = generate_periods(member, series, probation_end, today);
            (Some(resolve_post_probation(&periods)), periods)
        }
    } else {
        (None, Vec::new())
    };

    debug!(
        member = %member.name,
        probation = ?probation_status,
        post_probation = ?post_probation_status,
        "member evaluated"
    );

    MemberReport {
        name: member.name.clone(),
        joined_date: member.joined_date,
        days_since_joined: member.days_since_joined(today),
        current_points: member.current_points,
        probation_status,
        probation_end,
        milestones,
        post_probation_status,
        periods,
    }
}

/// Builds members from the latest snapshot. Members whose join date is
/// missing or unreadable cannot be evaluated and are returned separately.
pub fn members_from_latest(series: &SnapshotSeries) -> (Vec<Member>, Vec<SkippedMember>) {
    let Some(latest) = series.latest() else {
        return (Vec::new(), Vec::new());
    };

    let mut members = Vec::with_capacity(latest.len());
    let mut skipped = Vec::new();

    for (name, points) in latest.members() {
        let joined = latest.joined_for(name);
        match joined.and_then(parse_joined_date) {
            Some(joined_date) => members.push(Member::new(name, joined_date, points)),
            None => {
                let reason = match joined {
                    Some(raw) => format!("unparseable join date '{raw}'"),
                    None => "no join date in latest snapshot".to_string(),
                };
                warn!(member = %name, %reason, "skipping member");
                skipped.push(SkippedMember {
                    name: name.to_string(),
                    reason,
                });
            }
        }
    }

    (members, skipped)
}

/// Orders reports failures first, then in-progress, then everyone else;
/// most recent joiners first within each group.
pub fn sort_reports(reports: &mut [MemberReport]) {
    reports.sort_by(|a, b| {
        a.probation_status
            .priority()
            .cmp(&b.probation_status.priority())
            .then_with(|| a.days_since_joined.cmp(&b.days_since_joined))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Evaluates every member of the latest snapshot.
pub fn evaluate_team(series: &SnapshotSeries, today: NaiveDate) -> TeamEvaluation {
    let (members, skipped) = members_from_latest(series);

    let mut reports: Vec<MemberReport> = members
        .iter()
        .map(|member| evaluate_member(member, series, today))
        .collect();
    sort_reports(&mut reports);

    let evaluation = TeamEvaluation {
        evaluated_on: today,
        latest_snapshot: series.latest().map(|snapshot| snapshot.date),
        snapshot_count: series.len(),
        reports,
        skipped,
    };

    info!(
        evaluated = evaluation.reports.len(),
        skipped = evaluation.skipped.len(),
        failed = evaluation.count(ProbationStatus::Failed),
        in_progress = evaluation.count(ProbationStatus::InProgress),
        passed = evaluation.count(ProbationStatus::Passed),
        "team probation evaluation complete"
    );

    evaluation
}
