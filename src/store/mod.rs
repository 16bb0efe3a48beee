//! Persistence seam for identities and reports
//!
//! The core treats storage as an external collaborator that provides
//! get-or-create, atomic per-key adjust, and resolve-once semantics. Two
//! backends implement the trait: PostgreSQL (production) and an in-memory
//! table (tests, or when postgres is disabled).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::karma::{Identity, Report, ReportStatus};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A report row carries a status string outside the known set. Never
    /// mapped to a usable report: a default would re-open a terminal report.
    #[error("corrupt status {value:?} on report {id}")]
    CorruptReportStatus { id: Uuid, value: String },
}

/// Decode a persisted status string, refusing unknown values.
pub(crate) fn parse_report_status(id: Uuid, value: &str) -> Result<ReportStatus, StoreError> {
    ReportStatus::parse(value).ok_or_else(|| StoreError::CorruptReportStatus {
        id,
        value: value.to_string(),
    })
}

/// Storage contract consumed by the karma core.
///
/// Implementations must make `adjust_karma` an atomic read-modify-write on
/// the identity row and `resolve_report` a compare-and-set on the pending
/// status, so concurrent adjustments never lose updates and concurrent
/// adjudications never both succeed.
#[async_trait]
pub trait KarmaStore: Send + Sync {
    async fn get_identity(&self, device_id: &str) -> Result<Option<Identity>, StoreError>;

    /// Return the existing identity or create one with the given starting
    /// karma. Idempotent.
    async fn get_or_create_identity(
        &self,
        device_id: &str,
        initial_karma: i32,
    ) -> Result<Identity, StoreError>;

    /// Apply `max(0, current + delta)` atomically, creating the identity if
    /// it does not exist yet. Returns the new score.
    async fn adjust_karma(
        &self,
        device_id: &str,
        delta: i32,
        initial_karma: i32,
    ) -> Result<i32, StoreError>;

    /// Update profile fields. Returns `None` when the identity is unknown.
    async fn update_profile(
        &self,
        device_id: &str,
        nickname: &str,
        bio: &str,
    ) -> Result<Option<Identity>, StoreError>;

    /// Persist the classification label for an existing identity.
    async fn set_verification_label(
        &self,
        device_id: &str,
        label: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Stamp `last_active_date` with `now` iff its current date precedes
    /// `today` (UTC). Returns whether the stamp was applied, i.e. whether
    /// this is the first login of the day.
    async fn mark_daily_login(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<bool, StoreError>;

    /// Zero both daily counters iff `last_active_date`'s date precedes
    /// `today` (UTC). Never fires mid-day.
    async fn reset_daily_counters(
        &self,
        device_id: &str,
        today: NaiveDate,
    ) -> Result<(), StoreError>;

    /// Record one match started today; `used_filter` also consumes one
    /// filtered-match slot.
    async fn increment_daily_counters(
        &self,
        device_id: &str,
        used_filter: bool,
    ) -> Result<(), StoreError>;

    async fn insert_report(&self, report: &Report) -> Result<(), StoreError>;

    async fn get_report(&self, id: Uuid) -> Result<Option<Report>, StoreError>;

    /// Move a report out of `Pending` exactly once. Returns the updated
    /// report iff it was still pending; `None` means the report is missing
    /// or already terminal (the caller distinguishes via `get_report`).
    async fn resolve_report(
        &self,
        id: Uuid,
        status: ReportStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<Report>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses_decode() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_report_status(id, "pending").unwrap(),
            ReportStatus::Pending
        );
        assert_eq!(
            parse_report_status(id, "verified").unwrap(),
            ReportStatus::Verified
        );
        assert_eq!(
            parse_report_status(id, "rejected").unwrap(),
            ReportStatus::Rejected
        );
    }

    #[test]
    fn test_corrupt_status_is_an_error_not_pending() {
        let id = Uuid::new_v4();
        let err = parse_report_status(id, "escalated").unwrap_err();
        assert!(matches!(
            err,
            StoreError::CorruptReportStatus { id: got, ref value }
                if got == id && value == "escalated"
        ));
    }
}
