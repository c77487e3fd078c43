//! Point deltas between two dated snapshots and headline team statistics.
//! Independent of the probation engine; both read the same series.

use crate::snapshots::{Snapshot, SnapshotSeries};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

const TOP_PERFORMERS: usize = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeltaError {
    #[error("no snapshots available")]
    NoSnapshots,
    #[error("no snapshot recorded for {0}")]
    MissingSnapshot(NaiveDate),
    #[error("range start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("unknown range type '{0}'")]
    UnknownRange(String),
    #[error("custom ranges need both a start and an end date")]
    MissingBounds,
}

/// Named reporting windows, resolved against an explicit `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaRange {
    /// Latest snapshot against the day before it.
    LastDay,
    /// Monday of the previous week through the following Sunday.
    LastWeek,
    LastMonth,
    LastYear,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl DeltaRange {
    pub fn parse(
        kind: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, DeltaError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "last_day" | "day" => Ok(Self::LastDay),
            "last_week" | "week" => Ok(Self::LastWeek),
            "last_month" | "month" => Ok(Self::LastMonth),
            "last_year" | "year" => Ok(Self::LastYear),
            "custom" => match (start, end) {
                (Some(start), Some(end)) => Ok(Self::Custom { start, end }),
                _ => Err(DeltaError::MissingBounds),
            },
            other => Err(DeltaError::UnknownRange(other.to_string())),
        }
    }

    pub fn resolve(
        self,
        series: &SnapshotSeries,
        today: NaiveDate,
    ) -> Result<(NaiveDate, NaiveDate), DeltaError> {
        let (start, end) = match self {
            Self::LastDay => {
                let latest = series.latest().ok_or(DeltaError::NoSnapshots)?.date;
                (latest - Duration::days(1), latest)
            }
            Self::LastWeek => {
                let monday = today
                    - Duration::days(i64::from(today.weekday().num_days_from_monday()) + 7);
                (monday, monday + Duration::days(6))
            }
            Self::LastMonth => {
                let first_of_month = today.with_day(1).unwrap_or(today);
                let end = first_of_month - Duration::days(1);
                (end.with_day(1).unwrap_or(end), end)
            }
            Self::LastYear => {
                let year = today.year() - 1;
                let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(today);
                let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(today);
                (start, end)
            }
            Self::Custom { start, end } => (start, end),
        };

        if start > end {
            return Err(DeltaError::InvertedRange { start, end });
        }
        Ok((start, end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointDelta {
    pub member: String,
    pub start_points: u64,
    pub end_points: u64,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeltaReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total: i64,
    pub active_members: usize,
    pub deltas: Vec<PointDelta>,
}

fn signed_difference(end: u64, start: u64) -> i64 {
    let magnitude = |value: u64| i64::try_from(value).unwrap_or(i64::MAX);
    if end >= start {
        magnitude(end - start)
    } else {
        magnitude(start - end).saturating_neg()
    }
}

/// Compares two snapshots. Members new in `end` count from zero; members
/// that disappeared are left out.
pub fn compare_snapshots(start: &Snapshot, end: &Snapshot) -> DeltaReport {
    let mut deltas: Vec<PointDelta> = end
        .members()
        .map(|(member, end_points)| {
            let start_points = start.points_for(member).unwrap_or(0);
            PointDelta {
                member: member.to_string(),
                start_points,
                end_points,
                delta: signed_difference(end_points, start_points),
            }
        })
        .collect();
    deltas.sort_by(|a, b| b.delta.cmp(&a.delta).then_with(|| a.member.cmp(&b.member)));

    DeltaReport {
        start: start.date,
        end: end.date,
        total: deltas
            .iter()
            .fold(0i64, |total, entry| total.saturating_add(entry.delta)),
        active_members: deltas.iter().filter(|entry| entry.delta > 0).count(),
        deltas,
    }
}

/// Deltas between the snapshots dated exactly on the range boundaries.
pub fn point_deltas(
    series: &SnapshotSeries,
    range: DeltaRange,
    today: NaiveDate,
) -> Result<DeltaReport, DeltaError> {
    let (start, end) = range.resolve(series, today)?;
    let start_snapshot = series
        .exact(start)
        .ok_or(DeltaError::MissingSnapshot(start))?;
    let end_snapshot = series.exact(end).ok_or(DeltaError::MissingSnapshot(end))?;
    Ok(compare_snapshots(start_snapshot, end_snapshot))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberPoints {
    pub name: String,
    pub points: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamStats {
    pub snapshot_date: NaiveDate,
    pub total_points: u64,
    pub active_members: usize,
    pub top_performers: Vec<MemberPoints>,
}

pub fn team_stats(series: &SnapshotSeries) -> Result<TeamStats, DeltaError> {
    let latest = series.latest().ok_or(DeltaError::NoSnapshots)?;

    let mut active: Vec<MemberPoints> = latest
        .members()
        .filter(|(_, points)| *points > 0)
        .map(|(name, points)| MemberPoints {
            name: name.to_string(),
            points,
        })
        .collect();
    active.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));

    Ok(TeamStats {
        snapshot_date: latest.date,
        total_points: latest
            .members()
            .fold(0u64, |total, (_, points)| total.saturating_add(points)),
        active_members: active.len(),
        top_performers: active.into_iter().take(TOP_PERFORMERS).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn series() -> SnapshotSeries {
        SnapshotSeries::new(vec![
            Snapshot::new(day(2024, 5, 6))
                .with_member("ada", 1_000)
                .with_member("grace", 500)
                .with_member("linus", 50),
            Snapshot::new(day(2024, 5, 12))
                .with_member("ada", 1_600)
                .with_member("grace", 500)
                .with_member("ken", 200),
        ])
    }

    #[test]
    fn new_members_start_from_zero_and_leavers_drop_out() {
        let series = series();
        let report = point_deltas(
            &series,
            DeltaRange::Custom {
                start: day(2024, 5, 6),
                end: day(2024, 5, 12),
            },
            day(2024, 5, 20),
        )
        .expect("delta");

        let members: Vec<_> = report
            .deltas
            .iter()
            .map(|entry| (entry.member.as_str(), entry.delta))
            .collect();
        assert_eq!(members, vec![("ada", 600), ("ken", 200), ("grace", 0)]);
        assert_eq!(report.total, 800);
        assert_eq!(report.active_members, 2);
    }

    #[test]
    fn last_week_spans_previous_monday_to_sunday() {
        // 2024-05-15 is a Wednesday.
        let range = DeltaRange::LastWeek
            .resolve(&series(), day(2024, 5, 15))
            .expect("range");
        assert_eq!(range, (day(2024, 5, 6), day(2024, 5, 12)));
    }

    #[test]
    fn last_month_and_year_cover_whole_calendar_units() {
        let series = series();
        assert_eq!(
            DeltaRange::LastMonth.resolve(&series, day(2024, 3, 10)),
            Ok((day(2024, 2, 1), day(2024, 2, 29)))
        );
        assert_eq!(
            DeltaRange::LastYear.resolve(&series, day(2024, 3, 10)),
            Ok((day(2023, 1, 1), day(2023, 12, 31)))
        );
    }

    #[test]
    fn last_day_requires_consecutive_snapshots() {
        let error = point_deltas(&series(), DeltaRange::LastDay, day(2024, 5, 20))
            .expect_err("no snapshot for 2024-05-11");
        assert_eq!(error, DeltaError::MissingSnapshot(day(2024, 5, 11)));
    }

    #[test]
    fn parse_validates_custom_bounds() {
        assert_eq!(
            DeltaRange::parse("custom", Some(day(2024, 1, 1)), None),
            Err(DeltaError::MissingBounds)
        );
        assert_eq!(
            DeltaRange::parse("fortnight", None, None),
            Err(DeltaError::UnknownRange("fortnight".to_string()))
        );
        let inverted = DeltaRange::Custom {
            start: day(2024, 2, 1),
            end: day(2024, 1, 1),
        };
        assert!(matches!(
            inverted.resolve(&series(), day(2024, 3, 1)),
            Err(DeltaError::InvertedRange { .. })
        ));
    }

    #[test]
    fn huge_point_values_saturate_instead_of_wrapping() {
        let start = Snapshot::new(day(2024, 1, 1)).with_member("ada", 0);
        let end = Snapshot::new(day(2024, 1, 2))
            .with_member("ada", u64::MAX)
            .with_member("bob", 5);
        let report = compare_snapshots(&start, &end);

        let ada = report
            .deltas
            .iter()
            .find(|entry| entry.member == "ada")
            .expect("ada listed");
        assert_eq!(ada.delta, i64::MAX);
        assert_eq!(report.total, i64::MAX);
        assert_eq!(signed_difference(0, u64::MAX), -i64::MAX);

        let stats = team_stats(&SnapshotSeries::new(vec![end])).expect("stats");
        assert_eq!(stats.total_points, u64::MAX);
        assert_eq!(stats.top_performers[0].name, "ada");
    }

    #[test]
    fn stats_summarize_latest_snapshot() {
        let stats = team_stats(&series()).expect("stats");
        assert_eq!(stats.snapshot_date, day(2024, 5, 12));
        assert_eq!(stats.total_points, 2_300);
        assert_eq!(stats.active_members, 3);
        assert_eq!(stats.top_performers[0].name, "ada");
        assert!(team_stats(&SnapshotSeries::default()).is_err());
    }
}
