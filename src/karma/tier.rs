//! Access Tiers and Karma Thresholds
//!
//! The access tier is a pure projection of the karma score over three
//! configured thresholds. It is recomputed on demand and never persisted,
//! so the stored score can't drift from the tier derived for it.

use serde::{Deserialize, Serialize};

/// Access tier derived from karma. Ordered strictest-first so a higher
/// score never yields a stricter tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    /// Karma exhausted (score 0); no participation
    PermanentBan,
    /// Below the temp-ban threshold
    TempBan,
    /// Below the warning threshold
    Warning,
    /// Normal participation, reduced perks
    Standard,
    /// Full participation
    Full,
}

impl AccessTier {
    /// Map a karma score to its tier.
    ///
    /// The five ranges partition the non-negative integers with no gaps:
    /// `<= 0`, `(0, temp_ban)`, `[temp_ban, warning)`,
    /// `[warning, full_access)`, `[full_access, ..)`.
    pub fn for_score(score: i32, settings: &KarmaSettings) -> Self {
        if score <= 0 {
            AccessTier::PermanentBan
        } else if score < settings.temp_ban_threshold {
            AccessTier::TempBan
        } else if score < settings.warning_threshold {
            AccessTier::Warning
        } else if score < settings.full_access_threshold {
            AccessTier::Standard
        } else {
            AccessTier::Full
        }
    }

    pub fn is_banned(&self) -> bool {
        matches!(self, AccessTier::TempBan | AccessTier::PermanentBan)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTier::PermanentBan => "permanent_ban",
            AccessTier::TempBan => "temp_ban",
            AccessTier::Warning => "warning",
            AccessTier::Standard => "standard",
            AccessTier::Full => "full",
        }
    }
}

impl std::fmt::Display for AccessTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Karma deltas and tier thresholds, fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarmaSettings {
    /// Starting karma for a freshly created identity
    pub initial_karma: i32,

    /// Bonus for completing a chat without reports
    pub chat_complete_bonus: i32,

    /// Once-per-day login bonus
    pub daily_login_bonus: i32,

    /// Penalty applied to the reported identity at submission time (negative)
    pub report_penalty: i32,

    /// Additional penalty when a report is verified (negative)
    pub verified_report_penalty: i32,

    /// Penalty applied to the reporter of a rejected report (negative)
    pub false_report_penalty: i32,

    /// Score below which the identity is temp-banned
    pub temp_ban_threshold: i32,

    /// Score below which the identity gets warning-tier access
    pub warning_threshold: i32,

    /// Score at or above which the identity has full access
    pub full_access_threshold: i32,

    /// Filtered matches allowed per day
    pub daily_filter_limit: u32,
}

impl Default for KarmaSettings {
    fn default() -> Self {
        Self {
            initial_karma: 100,
            chat_complete_bonus: 10,
            daily_login_bonus: 5,
            report_penalty: -20,
            verified_report_penalty: -30,
            false_report_penalty: -15,
            temp_ban_threshold: 20,
            warning_threshold: 50,
            full_access_threshold: 80,
            daily_filter_limit: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let s = KarmaSettings::default();
        assert_eq!(AccessTier::for_score(0, &s), AccessTier::PermanentBan);
        assert_eq!(AccessTier::for_score(1, &s), AccessTier::TempBan);
        assert_eq!(AccessTier::for_score(19, &s), AccessTier::TempBan);
        assert_eq!(AccessTier::for_score(20, &s), AccessTier::Warning);
        assert_eq!(AccessTier::for_score(49, &s), AccessTier::Warning);
        assert_eq!(AccessTier::for_score(50, &s), AccessTier::Standard);
        assert_eq!(AccessTier::for_score(79, &s), AccessTier::Standard);
        assert_eq!(AccessTier::for_score(80, &s), AccessTier::Full);
        assert_eq!(AccessTier::for_score(10_000, &s), AccessTier::Full);
    }

    #[test]
    fn test_tier_is_monotonic_and_gap_free() {
        let s = KarmaSettings::default();
        let mut previous = AccessTier::for_score(0, &s);
        for score in 1..=200 {
            let tier = AccessTier::for_score(score, &s);
            assert!(tier >= previous, "tier regressed at score {}", score);
            previous = tier;
        }
        // Every tier is reachable
        for expected in [
            AccessTier::PermanentBan,
            AccessTier::TempBan,
            AccessTier::Warning,
            AccessTier::Standard,
            AccessTier::Full,
        ] {
            assert!(
                (0..=200).any(|score| AccessTier::for_score(score, &s) == expected),
                "tier {:?} unreachable",
                expected
            );
        }
    }

    #[test]
    fn test_banned_tiers() {
        assert!(AccessTier::PermanentBan.is_banned());
        assert!(AccessTier::TempBan.is_banned());
        assert!(!AccessTier::Warning.is_banned());
        assert!(!AccessTier::Standard.is_banned());
        assert!(!AccessTier::Full.is_banned());
    }
}
