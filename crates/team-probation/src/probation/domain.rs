use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of every post-probation compliance window.
pub const PERIOD_LENGTH_DAYS: i64 = 90;
/// Points that must be earned inside each post-probation window.
pub const PERIOD_TARGET_POINTS: u64 = 3_000_000;
/// Anything above this inside one window is treated as corrupt or mismatched data.
pub const MAX_PLAUSIBLE_EARNED: u64 = 50_000_000;
/// From this many elapsed days an unmet open window is flagged at risk.
pub const AT_RISK_FROM_DAY: i64 = 85;
/// Only the most recent windows are kept in a report.
pub const RETAINED_PERIODS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneKey {
    #[serde(rename = "week_1")]
    Week1,
    #[serde(rename = "month_1")]
    Month1,
    #[serde(rename = "month_3")]
    Month3,
}

impl MilestoneKey {
    pub const fn ordered() -> [Self; 3] {
        [Self::Week1, Self::Month1, Self::Month3]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Week1 => "First Week",
            Self::Month1 => "First Month",
            Self::Month3 => "Three Months",
        }
    }

    pub const fn target_points(self) -> u64 {
        match self {
            Self::Week1 => 250_000,
            Self::Month1 => 1_000_000,
            Self::Month3 => 3_000_000,
        }
    }

    pub const fn offset_days(self) -> i64 {
        match self {
            Self::Week1 => 7,
            Self::Month1 => 30,
            Self::Month3 => 90,
        }
    }

    pub fn deadline(self, joined_date: NaiveDate) -> NaiveDate {
        joined_date + Duration::days(self.offset_days())
    }
}

/// Tri-state milestone verdict. `Unknown` means the history cannot prove
/// either way and must never be read as a failure.
///
/// Serialized as `true` / `false` / `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Unknown,
    Pass,
    Fail,
}

impl Outcome {
    pub fn from_threshold(points: u64, target: u64) -> Self {
        if points >= target {
            Self::Pass
        } else {
            Self::Fail
        }
    }

    pub const fn passed(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Pass => Some(true),
            Self::Fail => Some(false),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "In Progress",
            Self::Pass => "Passed",
            Self::Fail => "Failed",
        }
    }
}

impl From<Option<bool>> for Outcome {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unknown,
            Some(true) => Self::Pass,
            Some(false) => Self::Fail,
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.passed().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<bool>::deserialize(deserializer).map(Self::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub key: MilestoneKey,
    pub label: &'static str,
    pub target_points: u64,
    pub deadline: NaiveDate,
    pub points_at_deadline: Option<u64>,
    #[serde(rename = "passed")]
    pub outcome: Outcome,
    pub remaining_points: u64,
    pub days_left: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbationStatus {
    InProgress,
    Passed,
    Failed,
}

impl ProbationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::Passed => "Passed",
            Self::Failed => "Failed",
        }
    }

    /// Report ordering: failures first, then members still on probation.
    pub const fn priority(self) -> u8 {
        match self {
            Self::Failed => 0,
            Self::InProgress => 1,
            Self::Passed => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    InsufficientData,
    JustStarted,
    OnTrack,
    AtRisk,
    Compliant,
    NonCompliant,
}

impl PeriodStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::InsufficientData => "Insufficient Data",
            Self::JustStarted => "Just Started",
            Self::OnTrack => "On Track",
            Self::AtRisk => "At Risk",
            Self::Compliant => "Compliant",
            Self::NonCompliant => "Non-Compliant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProbationStatus {
    TooEarly,
    InsufficientData,
    NonCompliant,
    Compliant,
    OnTrack,
    AtRisk,
    InProgress,
}

impl PostProbationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::TooEarly => "Too Early",
            Self::InsufficientData => "Insufficient Data",
            Self::NonCompliant => "Non-Compliant",
            Self::Compliant => "Compliant",
            Self::OnTrack => "On Track",
            Self::AtRisk => "At Risk",
            Self::InProgress => "In Progress",
        }
    }
}

/// Pace figures for the window that is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodProjection {
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub daily_rate: f64,
    pub projected_total: f64,
    pub remaining_needed: u64,
    pub daily_needed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub index: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points_at_start: Option<u64>,
    pub points_at_end: Option<u64>,
    pub earned: Option<u64>,
    pub target_points: u64,
    pub status: PeriodStatus,
    pub is_current: bool,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<PeriodProjection>,
}

/// A tracked team member as of the latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub joined_date: NaiveDate,
    pub current_points: u64,
}

impl Member {
    pub fn new(name: impl Into<String>, joined_date: NaiveDate, current_points: u64) -> Self {
        Self {
            name: name.into(),
            joined_date,
            current_points,
        }
    }

    pub fn probation_end(&self) -> NaiveDate {
        MilestoneKey::Month3.deadline(self.joined_date)
    }

    pub fn days_since_joined(&self, today: NaiveDate) -> i64 {
        (today - self.joined_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestone_keys_serialize_with_underscored_names() {
        let keys = serde_json::to_string(&MilestoneKey::ordered()).expect("serialize");
        assert_eq!(keys, r#"["week_1","month_1","month_3"]"#);
    }

    #[test]
    fn outcome_round_trips_through_nullable_bool() {
        assert_eq!(serde_json::to_string(&Outcome::Unknown).expect("json"), "null");
        assert_eq!(serde_json::to_string(&Outcome::Fail).expect("json"), "false");
        let parsed: Outcome = serde_json::from_str("true").expect("parse");
        assert_eq!(parsed, Outcome::Pass);
    }

    #[test]
    fn probation_end_is_ninety_days_after_joining() {
        let joined = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let member = Member::new("ada", joined, 0);
        assert_eq!(
            member.probation_end(),
            NaiveDate::from_ymd_opt(2024, 3, 31).expect("date")
        );
    }
}
