use super::domain::{Period, PeriodStatus, PostProbationStatus};

/// Reduces the retained periods to one post-probation status.
///
/// A closed non-compliant window outranks everything until it ages out of
/// the retained set.
pub fn resolve_post_probation(periods: &[Period]) -> PostProbationStatus {
    let with_data: Vec<&Period> = periods
        .iter()
        .filter(|period| period.status != PeriodStatus::InsufficientData)
        .collect();

    if with_data.is_empty() {
        return PostProbationStatus::InsufficientData;
    }

    if with_data
        .iter()
        .any(|period| !period.is_current && period.status == PeriodStatus::NonCompliant)
    {
        return PostProbationStatus::NonCompliant;
    }

    match with_data.iter().find(|period| period.is_current) {
        Some(current) => match current.status {
            PeriodStatus::Compliant => PostProbationStatus::Compliant,
            PeriodStatus::OnTrack => PostProbationStatus::OnTrack,
            PeriodStatus::AtRisk => PostProbationStatus::AtRisk,
            _ => PostProbationStatus::InProgress,
        },
        None => PostProbationStatus::Compliant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probation::domain::PERIOD_TARGET_POINTS;
    use chrono::{Duration, NaiveDate};

    fn period(index: u32, status: PeriodStatus, is_current: bool) -> Period {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).expect("date")
            + Duration::days(90 * i64::from(index - 1));
        Period {
            index,
            start,
            end: start + Duration::days(90),
            points_at_start: None,
            points_at_end: None,
            earned: None,
            target_points: PERIOD_TARGET_POINTS,
            status,
            is_current,
            projection: None,
        }
    }

    #[test]
    fn no_usable_periods_is_insufficient_data() {
        let periods = vec![
            period(1, PeriodStatus::InsufficientData, false),
            period(2, PeriodStatus::InsufficientData, true),
        ];
        assert_eq!(
            resolve_post_probation(&periods),
            PostProbationStatus::InsufficientData
        );
        assert_eq!(
            resolve_post_probation(&[]),
            PostProbationStatus::InsufficientData
        );
    }

    #[test]
    fn closed_shortfall_outranks_current_progress() {
        let periods = vec![
            period(1, PeriodStatus::NonCompliant, false),
            period(2, PeriodStatus::Compliant, true),
        ];
        assert_eq!(
            resolve_post_probation(&periods),
            PostProbationStatus::NonCompliant
        );
    }

    #[test]
    fn current_period_status_is_adopted() {
        for (status, expected) in [
            (PeriodStatus::Compliant, PostProbationStatus::Compliant),
            (PeriodStatus::OnTrack, PostProbationStatus::OnTrack),
            (PeriodStatus::AtRisk, PostProbationStatus::AtRisk),
            (PeriodStatus::JustStarted, PostProbationStatus::InProgress),
        ] {
            let periods = vec![
                period(1, PeriodStatus::Compliant, false),
                period(2, status, true),
            ];
            assert_eq!(resolve_post_probation(&periods), expected);
        }
    }

    #[test]
    fn only_closed_compliant_periods_are_compliant() {
        let periods = vec![
            period(1, PeriodStatus::Compliant, false),
            period(2, PeriodStatus::InsufficientData, true),
        ];
        assert_eq!(
            resolve_post_probation(&periods),
            PostProbationStatus::Compliant
        );
    }
}
