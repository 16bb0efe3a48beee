//! Report Workflow
//!
//! State machine for misconduct reports: `Pending -> {Verified, Rejected}`,
//! terminal after one transition. This is the sole caller of the ledger for
//! report-driven adjustments.
//!
//! Submission applies an immediate penalty to the reported identity before
//! any adjudication. A later rejection penalizes the reporter but does not
//! refund that penalty; the asymmetry is deliberate.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::karma::error::KarmaError;
use crate::karma::ledger::KarmaLedger;
use crate::karma::report::{Report, ReportStatus};
use crate::store::KarmaStore;

pub struct ReportWorkflow {
    store: Arc<dyn KarmaStore>,
    ledger: KarmaLedger,
}

impl ReportWorkflow {
    pub fn new(store: Arc<dyn KarmaStore>, ledger: KarmaLedger) -> Self {
        Self { store, ledger }
    }

    /// Submit a report against another identity.
    ///
    /// Self-reports fail with `InvalidRequest` regardless of karma state.
    /// Banned reporters fail with `AccessDenied`. On success the reported
    /// identity takes the configured submission penalty immediately.
    pub async fn submit(
        &self,
        reporter_device_id: &str,
        reported_device_id: &str,
        reason: &str,
    ) -> Result<Report, KarmaError> {
        if reporter_device_id == reported_device_id {
            return Err(KarmaError::InvalidRequest(
                "cannot report yourself".to_string(),
            ));
        }

        let tier = self.ledger.tier(reporter_device_id).await?;
        if tier.is_banned() {
            warn!(
                reporter = %reporter_device_id,
                tier = %tier,
                "Rejected report from banned account"
            );
            return Err(KarmaError::AccessDenied { tier });
        }

        let report = Report::new(reporter_device_id, reported_device_id, reason);
        self.store.insert_report(&report).await?;

        let penalty = self.ledger.settings().report_penalty;
        let new_score = self.ledger.adjust(reported_device_id, penalty).await?;

        info!(
            report_id = %report.id,
            reporter = %reporter_device_id,
            reported = %reported_device_id,
            new_score = new_score,
            "Report submitted, initial penalty applied"
        );

        Ok(report)
    }

    /// Adjudicate a pending report.
    ///
    /// Valid reports compound the penalty on the reported identity; invalid
    /// ones penalize the reporter instead. A report can be adjudicated
    /// exactly once: the store's compare-and-set guarantees that of two
    /// concurrent calls only one succeeds and the other gets `InvalidState`.
    pub async fn verify(&self, report_id: Uuid, is_valid: bool) -> Result<Report, KarmaError> {
        let status = if is_valid {
            ReportStatus::Verified
        } else {
            ReportStatus::Rejected
        };

        let resolved = self
            .store
            .resolve_report(report_id, status, chrono::Utc::now())
            .await?;

        let report = match resolved {
            Some(report) => report,
            None => {
                // Either the report never existed or it already left Pending.
                return match self.store.get_report(report_id).await? {
                    Some(existing) => Err(KarmaError::InvalidState {
                        status: existing.status,
                    }),
                    None => Err(KarmaError::NotFound(report_id)),
                };
            }
        };

        // The transition above and the adjustment below are separate store
        // calls. If the adjustment fails the report is already terminal and
        // the penalty is lost; a retry observes InvalidState rather than
        // re-applying it.
        let settings = self.ledger.settings();
        if is_valid {
            self.ledger
                .adjust(&report.reported_device_id, settings.verified_report_penalty)
                .await?;
        } else {
            // The reported identity's submission penalty stays in place.
            self.ledger
                .adjust(&report.reporter_device_id, settings.false_report_penalty)
                .await?;
        }

        info!(
            report_id = %report.id,
            status = %report.status,
            "Report adjudicated"
        );

        Ok(report)
    }
}
