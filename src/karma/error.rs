//! Karma Error Taxonomy
//!
//! Business-rule violations surfaced to the caller unchanged; none are
//! retried in-process. Transient store failures travel as `Store` and are
//! the storage client's concern.

use thiserror::Error;
use uuid::Uuid;

use crate::karma::report::ReportStatus;
use crate::karma::tier::AccessTier;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum KarmaError {
    /// Caller-side contract violation (e.g. self-report), rejected before
    /// any state is mutated
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The actor's access tier forbids the requested action
    #[error("access denied: account tier is {tier}")]
    AccessDenied { tier: AccessTier },

    /// Reference to a nonexistent report
    #[error("report {0} not found")]
    NotFound(Uuid),

    /// Attempted transition out of a non-pending report
    #[error("report already resolved as {status}")]
    InvalidState { status: ReportStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}
