use crate::probation::{MemberReport, Milestone, Outcome};
use serde::Serialize;
use std::fmt::{self, Write};

/// Plain-text alert for a member who failed probation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureNotice {
    pub member: String,
    pub subject: String,
    pub body: String,
}

impl FailureNotice {
    pub fn from_report(report: &MemberReport) -> Self {
        let failed: Vec<&str> = report
            .failed_milestones()
            .map(|milestone| milestone.label)
            .collect();
        let failed = if failed.is_empty() {
            "none recorded".to_string()
        } else {
            failed.join(", ")
        };

        let mut body = String::new();
        if write_body(&mut body, report, &failed).is_err() {
            body.clear();
        }

        Self {
            member: report.name.clone(),
            subject: format!("PROBATION FAILURE ALERT: {}", report.name),
            body,
        }
    }
}

fn write_body<W: Write>(out: &mut W, report: &MemberReport, failed: &str) -> fmt::Result {
    writeln!(out, "PROBATION FAILURE ALERT - {}", report.name)?;
    writeln!(out)?;
    writeln!(out, "Member {} has FAILED probation requirements.", report.name)?;
    writeln!(out)?;
    writeln!(out, "Member details:")?;
    writeln!(out, "- Joined: {}", report.joined_date)?;
    writeln!(out, "- Days since joining: {}", report.days_since_joined)?;
    writeln!(out, "- Current points: {}", group_thousands(report.current_points))?;
    writeln!(out, "- Failed milestone(s): {failed}")?;
    writeln!(out)?;
    writeln!(out, "Milestone status:")?;
    for milestone in &report.milestones {
        writeln!(out, "{}", milestone_line(milestone, report.current_points))?;
    }
    Ok(())
}

fn milestone_line(milestone: &Milestone, current_points: u64) -> String {
    let status = match milestone.outcome {
        Outcome::Pass => "PASSED",
        Outcome::Fail => "FAILED",
        Outcome::Unknown => "IN PROGRESS",
    };
    let achieved = milestone.points_at_deadline.unwrap_or(current_points);
    format!(
        "- {}: {status} (target: {}, achieved: {})",
        milestone.label,
        group_thousands(milestone.target_points),
        group_thousands(achieved)
    )
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
