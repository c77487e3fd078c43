//! Probation and post-probation compliance engine.
//!
//! Every function here is pure: the snapshot series and the evaluation date
//! are explicit inputs, nothing reads the clock or touches disk, and running
//! twice with the same inputs produces the same reports.
//!
//! Missing history resolves to `Unknown` milestones and `InsufficientData`
//! periods, never to a failure.

mod aggregate;
mod classifier;
pub mod domain;
mod milestones;
mod periods;
mod report;

pub use aggregate::resolve_post_probation;
pub use classifier::classify_probation;
pub use domain::{
    Member, Milestone, MilestoneKey, Outcome, Period, PeriodProjection, PeriodStatus,
    PostProbationStatus, ProbationStatus,
};
pub use milestones::evaluate_milestones;
pub use periods::generate_periods;
pub use report::{
    evaluate_member, evaluate_team, members_from_latest, sort_reports, MemberReport,
    SkippedMember, TeamEvaluation,
};
