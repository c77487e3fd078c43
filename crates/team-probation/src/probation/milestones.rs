use super::domain::{Member, Milestone, MilestoneKey, Outcome};
use crate::snapshots::SnapshotSeries;
use chrono::NaiveDate;

/// Resolves the three probation milestones for one member.
pub fn evaluate_milestones(
    member: &Member,
    series: &SnapshotSeries,
    today: NaiveDate,
) -> Vec<Milestone> {
    MilestoneKey::ordered()
        .into_iter()
        .map(|key| evaluate_milestone(key, member, series, today))
        .collect()
}

fn evaluate_milestone(
    key: MilestoneKey,
    member: &Member,
    series: &SnapshotSeries,
    today: NaiveDate,
) -> Milestone {
    let target = key.target_points();
    let deadline = key.deadline(member.joined_date);
    let expired = today >= deadline;

    // The ninety-day mark is judged on current points; earlier marks need a
    // reading taken on or after the deadline.
    let points_at_deadline = match key {
        MilestoneKey::Month3 => Some(member.current_points),
        MilestoneKey::Week1 | MilestoneKey::Month1 => series
            .first_on_or_after(deadline.max(member.joined_date), &member.name)
            .map(|(_, points)| points),
    };

    let reached_now = member.current_points >= target;
    let outcome = match (expired, points_at_deadline) {
        (true, Some(points)) => Outcome::from_threshold(points, target),
        (_, _) if reached_now => Outcome::Pass,
        _ => Outcome::Unknown,
    };

    let remaining_points = if expired {
        0
    } else {
        target.saturating_sub(member.current_points)
    };

    Milestone {
        key,
        label: key.label(),
        target_points: target,
        deadline,
        points_at_deadline,
        outcome,
        remaining_points,
        days_left: (deadline - today).num_days().max(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshots::Snapshot;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn find(milestones: &[Milestone], key: MilestoneKey) -> &Milestone {
        milestones
            .iter()
            .find(|milestone| milestone.key == key)
            .expect("milestone present")
    }

    #[test]
    fn week_one_uses_first_reading_on_or_after_deadline() {
        let joined = day(2024, 1, 1);
        let series = SnapshotSeries::new(vec![
            Snapshot::new(day(2024, 1, 7)).with_member("ada", 240_000),
            Snapshot::new(day(2024, 1, 9)).with_member("ada", 255_000),
            Snapshot::new(day(2024, 1, 20)).with_member("ada", 400_000),
        ]);
        let member = Member::new("ada", joined, 400_000);

        let milestones = evaluate_milestones(&member, &series, day(2024, 1, 20));
        let week = find(&milestones, MilestoneKey::Week1);
        assert_eq!(week.deadline, day(2024, 1, 8));
        assert_eq!(week.points_at_deadline, Some(255_000));
        assert_eq!(week.outcome, Outcome::Pass);
        assert_eq!(week.remaining_points, 0);
        assert_eq!(week.days_left, 0);
    }

    #[test]
    fn historical_shortfall_is_a_failure() {
        let joined = day(2024, 1, 1);
        let series = SnapshotSeries::new(vec![
            Snapshot::new(day(2024, 1, 8)).with_member("ada", 100_000),
            Snapshot::new(day(2024, 1, 12)).with_member("ada", 120_000),
        ]);
        let member = Member::new("ada", joined, 120_000);

        let milestones = evaluate_milestones(&member, &series, day(2024, 1, 12));
        assert_eq!(find(&milestones, MilestoneKey::Week1).outcome, Outcome::Fail);
    }

    #[test]
    fn late_recovery_does_not_overturn_recorded_shortfall() {
        let joined = day(2024, 1, 1);
        let series = SnapshotSeries::new(vec![
            Snapshot::new(day(2024, 1, 8)).with_member("ada", 100_000),
            Snapshot::new(day(2024, 1, 20)).with_member("ada", 300_000),
        ]);
        let member = Member::new("ada", joined, 300_000);

        let milestones = evaluate_milestones(&member, &series, day(2024, 1, 20));
        let week = find(&milestones, MilestoneKey::Week1);
        assert_eq!(week.points_at_deadline, Some(100_000));
        assert_eq!(week.outcome, Outcome::Fail);
        assert_eq!(
            crate::probation::classify_probation(&milestones, day(2024, 1, 20)),
            crate::probation::domain::ProbationStatus::Failed
        );
    }

    #[test]
    fn missing_history_after_deadline_stays_unknown() {
        let joined = day(2024, 1, 1);
        let series =
            SnapshotSeries::new(vec![Snapshot::new(day(2024, 1, 5)).with_member("ada", 90_000)]);
        let member = Member::new("ada", joined, 90_000);

        let milestones = evaluate_milestones(&member, &series, day(2024, 1, 15));
        let week = find(&milestones, MilestoneKey::Week1);
        assert_eq!(week.points_at_deadline, None);
        assert_eq!(week.outcome, Outcome::Unknown);
    }

    #[test]
    fn missing_history_is_rescued_by_current_points() {
        let joined = day(2024, 1, 1);
        let series =
            SnapshotSeries::new(vec![Snapshot::new(day(2024, 1, 5)).with_member("ada", 300_000)]);
        let member = Member::new("ada", joined, 300_000);

        let milestones = evaluate_milestones(&member, &series, day(2024, 1, 15));
        assert_eq!(find(&milestones, MilestoneKey::Week1).outcome, Outcome::Pass);
    }

    #[test]
    fn early_achievement_passes_before_deadline() {
        let joined = day(2024, 1, 1);
        let series = SnapshotSeries::new(vec![
            Snapshot::new(day(2024, 1, 20)).with_member("ada", 1_200_000)
        ]);
        let member = Member::new("ada", joined, 1_200_000);

        let milestones = evaluate_milestones(&member, &series, day(2024, 1, 20));
        let month = find(&milestones, MilestoneKey::Month1);
        assert_eq!(month.outcome, Outcome::Pass);
        assert_eq!(month.remaining_points, 0);
        assert_eq!(month.days_left, 11);

        let quarter = find(&milestones, MilestoneKey::Month3);
        assert_eq!(quarter.outcome, Outcome::Unknown);
        assert_eq!(quarter.remaining_points, 1_800_000);
    }

    #[test]
    fn ninety_day_mark_always_reads_current_points() {
        let joined = day(2024, 1, 1);
        let series = SnapshotSeries::default();
        let member = Member::new("ada", joined, 2_000_000);

        let milestones = evaluate_milestones(&member, &series, day(2024, 4, 10));
        let quarter = find(&milestones, MilestoneKey::Month3);
        assert_eq!(quarter.points_at_deadline, Some(2_000_000));
        assert_eq!(quarter.outcome, Outcome::Fail);
        assert_eq!(quarter.remaining_points, 0);
    }
}
