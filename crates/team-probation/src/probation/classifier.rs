use super::domain::{Milestone, Outcome, ProbationStatus};
use chrono::NaiveDate;

/// Folds milestone outcomes into one probation status. Unknown milestones
/// never produce a failure.
pub fn classify_probation(milestones: &[Milestone], today: NaiveDate) -> ProbationStatus {
    if !milestones.is_empty()
        && milestones
            .iter()
            .all(|milestone| milestone.outcome == Outcome::Pass)
    {
        return ProbationStatus::Passed;
    }

    let failed = milestones
        .iter()
        .rev()
        .any(|milestone| today >= milestone.deadline && milestone.outcome == Outcome::Fail);

    if failed {
        ProbationStatus::Failed
    } else {
        ProbationStatus::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probation::domain::MilestoneKey;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn milestone(key: MilestoneKey, outcome: Outcome) -> Milestone {
        let deadline = key.deadline(day(2024, 1, 1));
        Milestone {
            key,
            label: key.label(),
            target_points: key.target_points(),
            deadline,
            points_at_deadline: None,
            outcome,
            remaining_points: 0,
            days_left: 0,
        }
    }

    fn set(outcomes: [Outcome; 3]) -> Vec<Milestone> {
        MilestoneKey::ordered()
            .into_iter()
            .zip(outcomes)
            .map(|(key, outcome)| milestone(key, outcome))
            .collect()
    }

    #[test]
    fn all_passed_milestones_pass_probation() {
        let milestones = set([Outcome::Pass, Outcome::Pass, Outcome::Pass]);
        assert_eq!(
            classify_probation(&milestones, day(2024, 1, 15)),
            ProbationStatus::Passed
        );
    }

    #[test]
    fn any_expired_failure_fails_probation() {
        let milestones = set([Outcome::Pass, Outcome::Fail, Outcome::Unknown]);
        assert_eq!(
            classify_probation(&milestones, day(2024, 2, 5)),
            ProbationStatus::Failed
        );
    }

    #[test]
    fn unknown_milestones_keep_probation_in_progress() {
        let milestones = set([Outcome::Unknown, Outcome::Unknown, Outcome::Unknown]);
        assert_eq!(
            classify_probation(&milestones, day(2024, 6, 1)),
            ProbationStatus::InProgress
        );
    }

    #[test]
    fn failure_before_deadline_is_not_counted() {
        let milestones = set([Outcome::Pass, Outcome::Pass, Outcome::Fail]);
        assert_eq!(
            classify_probation(&milestones, day(2024, 3, 1)),
            ProbationStatus::InProgress
        );
    }
}
