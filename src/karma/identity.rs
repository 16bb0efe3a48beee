//! Identity Record
//!
//! One record per device fingerprint. No PII is stored: the device token is
//! the only key, and the verification label is the only output of the
//! classification flow that survives the request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-device identity tied to an opaque fingerprint token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque device fingerprint, the sole account key
    pub device_id: String,

    /// Karma score (floored at 0, no ceiling)
    pub karma_score: i32,

    /// Optional display name (no uniqueness enforced)
    pub nickname: Option<String>,

    /// Optional short bio
    pub bio: Option<String>,

    /// Classification outcome, absent until verification succeeds
    pub verification_label: Option<String>,

    /// Matches started today (reset at day boundary)
    pub daily_match_count: u32,

    /// Filtered matches used today (reset at day boundary)
    pub daily_filter_count: u32,

    /// When the classification label was last set
    pub last_verified_at: Option<DateTime<Utc>>,

    /// Most recent activity; drives the daily bonus and counter reset
    pub last_active_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Create a fresh identity with the configured starting karma.
    ///
    /// `last_active_date` is stamped at creation, so the daily login bonus
    /// is not credited on the creation day itself.
    pub fn new(device_id: String, initial_karma: i32) -> Self {
        let now = Utc::now();
        Self {
            device_id,
            karma_score: initial_karma.max(0),
            nickname: None,
            bio: None,
            verification_label: None,
            daily_match_count: 0,
            daily_filter_count: 0,
            last_verified_at: None,
            last_active_date: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verification_label.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identity_starts_with_initial_karma() {
        let identity = Identity::new("device_1".to_string(), 100);
        assert_eq!(identity.karma_score, 100);
        assert_eq!(identity.daily_match_count, 0);
        assert!(identity.last_active_date.is_some());
        assert!(!identity.is_verified());
    }

    #[test]
    fn test_negative_initial_karma_is_floored() {
        let identity = Identity::new("device_1".to_string(), -5);
        assert_eq!(identity.karma_score, 0);
    }
}
