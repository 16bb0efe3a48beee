//! Misconduct Reports
//!
//! A report is adjudicated exactly once: it starts `Pending` and moves to
//! `Verified` or `Rejected`, both terminal. The transition itself is a
//! compare-and-set in the store so concurrent adjudications can't both win.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Verified,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Verified => "verified",
            ReportStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ReportStatus::Pending),
            "verified" => Some(ReportStatus::Verified),
            "rejected" => Some(ReportStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportStatus::Pending)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complaint from one identity against another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub reporter_device_id: String,
    pub reported_device_id: String,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, on the transition out of `Pending`
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn new(reporter_device_id: &str, reported_device_id: &str, reason: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            reporter_device_id: reporter_device_id.to_string(),
            reported_device_id: reported_device_id.to_string(),
            reason: reason.to_string(),
            status: ReportStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}
