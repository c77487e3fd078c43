use super::ledger::{should_check, NotificationLedger};
use super::notice::FailureNotice;
use super::{NotificationError, PROBATION_FAILED};
use crate::probation::TeamEvaluation;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outbound transport for failure notices (e-mail, chat webhook, ...).
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, recipients: &[String], notice: &FailureNotice)
        -> Result<(), NotificationError>;
}

/// Sink that only logs; the default when no transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(
        &self,
        recipients: &[String],
        notice: &FailureNotice,
    ) -> Result<(), NotificationError> {
        warn!(
            member = %notice.member,
            recipients = recipients.len(),
            subject = %notice.subject,
            "probation failure notice"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationSummary {
    /// Failed members examined.
    pub checked: usize,
    pub sent: usize,
    /// Already notified earlier.
    pub skipped: usize,
    /// Delivery attempts that errored; retried on the next run.
    pub failed: usize,
}

pub struct ProbationNotifier<L, S> {
    ledger: Arc<L>,
    sink: Arc<S>,
    recipients: Vec<String>,
}

impl<L, S> ProbationNotifier<L, S>
where
    L: NotificationLedger + 'static,
    S: NotificationSink + 'static,
{
    pub fn new(ledger: Arc<L>, sink: Arc<S>, recipients: Vec<String>) -> Self {
        Self {
            ledger,
            sink,
            recipients,
        }
    }

    /// Sends one notice per newly failed member. Returns `None` when
    /// `snapshot` was already processed on `today`.
    pub fn notify(
        &self,
        evaluation: &TeamEvaluation,
        snapshot: &str,
        today: NaiveDate,
    ) -> Result<Option<NotificationSummary>, NotificationError> {
        if !should_check(self.ledger.as_ref(), snapshot, today)? {
            return Ok(None);
        }
        if self.recipients.is_empty() {
            warn!("no notification recipients configured");
        }

        let mut summary = NotificationSummary::default();
        for report in evaluation.failed() {
            summary.checked += 1;
            if self.ledger.has_been_notified(&report.name, PROBATION_FAILED)? {
                summary.skipped += 1;
                continue;
            }

            let notice = FailureNotice::from_report(report);
            match self.sink.deliver(&self.recipients, &notice) {
                Ok(()) => {
                    self.ledger
                        .mark_notified(&report.name, PROBATION_FAILED, today)?;
                    summary.sent += 1;
                }
                Err(err) => {
                    warn!(member = %report.name, error = %err, "failed to deliver notice");
                    summary.failed += 1;
                }
            }
        }

        self.ledger.record_processed(snapshot, today)?;
        info!(
            snapshot,
            checked = summary.checked,
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "notification run complete"
        );
        Ok(Some(summary))
    }
}
