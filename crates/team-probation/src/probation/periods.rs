use super::domain::{
    Member, Period, PeriodProjection, PeriodStatus, AT_RISK_FROM_DAY, MAX_PLAUSIBLE_EARNED,
    PERIOD_LENGTH_DAYS, PERIOD_TARGET_POINTS, RETAINED_PERIODS,
};
use crate::snapshots::SnapshotSeries;
use chrono::{Duration, NaiveDate};
use std::collections::VecDeque;
use tracing::debug;

/// Walks 90-day windows forward from `probation_end` up to and including the
/// window that is still open on `today`, keeping only the most recent ones.
///
/// Closed windows take their boundary points from snapshots dated exactly on
/// the boundary. The open window's end reading is the latest snapshot in the
/// series, whatever its date, so its figures are "as of the latest snapshot".
pub fn generate_periods(
    member: &Member,
    series: &SnapshotSeries,
    probation_end: NaiveDate,
    today: NaiveDate,
) -> Vec<Period> {
    if today < probation_end {
        return Vec::new();
    }

    let latest_points = series
        .latest()
        .and_then(|snapshot| snapshot.points_for(&member.name));

    let mut retained: VecDeque<Period> = VecDeque::with_capacity(RETAINED_PERIODS + 1);
    let mut start = probation_end;
    let mut index = 1u32;

    loop {
        let period = build_period(index, start, member, series, latest_points, today);
        let next_start = period.end;
        let is_current = period.is_current;

        retained.push_back(period);
        if retained.len() > RETAINED_PERIODS {
            retained.pop_front();
        }

        if is_current {
            break;
        }
        start = next_start;
        index += 1;
    }

    retained.into()
}

fn build_period(
    index: u32,
    start: NaiveDate,
    member: &Member,
    series: &SnapshotSeries,
    latest_points: Option<u64>,
    today: NaiveDate,
) -> Period {
    let end = start + Duration::days(PERIOD_LENGTH_DAYS);
    let is_current = today < end;

    let points_at_start = series.points_on(start, &member.name);
    let points_at_end = if is_current {
        latest_points
    } else {
        series.points_on(end, &member.name)
    };

    let (earned, status) = match (points_at_start, points_at_end) {
        (Some(at_start), Some(at_end)) => {
            let earned = at_end.saturating_sub(at_start);
            if earned > MAX_PLAUSIBLE_EARNED {
                debug!(
                    member = %member.name,
                    index,
                    earned,
                    "implausible point velocity, treating period as insufficient data"
                );
                (Some(0), PeriodStatus::InsufficientData)
            } else {
                (Some(earned), judge(earned, is_current, start, today))
            }
        }
        _ => (None, PeriodStatus::InsufficientData),
    };

    let projection = match earned {
        Some(earned) if is_current && status != PeriodStatus::InsufficientData => {
            Some(project(earned, start, today))
        }
        _ => None,
    };

    Period {
        index,
        start,
        end,
        points_at_start,
        points_at_end,
        earned,
        target_points: PERIOD_TARGET_POINTS,
        status,
        is_current,
        projection,
    }
}

fn days_elapsed(start: NaiveDate, today: NaiveDate) -> i64 {
    (today - start).num_days().max(1)
}

fn judge(earned: u64, is_current: bool, start: NaiveDate, today: NaiveDate) -> PeriodStatus {
    if !is_current {
        return if earned >= PERIOD_TARGET_POINTS {
            PeriodStatus::Compliant
        } else {
            PeriodStatus::NonCompliant
        };
    }

    let elapsed = days_elapsed(start, today);
    if !(1..=PERIOD_LENGTH_DAYS).contains(&elapsed) {
        return PeriodStatus::JustStarted;
    }

    if earned >= PERIOD_TARGET_POINTS {
        PeriodStatus::Compliant
    } else if elapsed >= AT_RISK_FROM_DAY {
        PeriodStatus::AtRisk
    } else {
        PeriodStatus::OnTrack
    }
}

fn project(earned: u64, start: NaiveDate, today: NaiveDate) -> PeriodProjection {
    let days_elapsed = days_elapsed(start, today);
    let days_remaining = (PERIOD_LENGTH_DAYS - days_elapsed).max(0);
    let daily_rate = earned as f64 / days_elapsed as f64;
    let remaining_needed = PERIOD_TARGET_POINTS.saturating_sub(earned);

    PeriodProjection {
        days_elapsed,
        days_remaining,
        daily_rate,
        projected_total: daily_rate * PERIOD_LENGTH_DAYS as f64,
        remaining_needed,
        daily_needed: remaining_needed as f64 / days_remaining.max(1) as f64,
    }
}
