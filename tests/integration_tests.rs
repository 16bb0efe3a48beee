//! Integration tests for the karma gate
//!
//! These tests verify end-to-end functionality of the karma system,
//! including the ledger, access tiers, the report lifecycle, and the
//! daily cycle, against the in-memory store.

use std::sync::Arc;

use veil_gate::{
    AccessTier, DailyCycleManager, KarmaError, KarmaLedger, KarmaSettings, KarmaStore,
    MemoryStore, ReportStatus, ReportWorkflow,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct Gate {
    ledger: KarmaLedger,
    workflow: ReportWorkflow,
    daily: DailyCycleManager,
}

/// Assemble the full component stack over a fresh in-memory store
fn create_test_gate() -> Gate {
    create_test_gate_with(KarmaSettings::default())
}

fn create_test_gate_with(settings: KarmaSettings) -> Gate {
    let store: Arc<dyn KarmaStore> = Arc::new(MemoryStore::new());
    let ledger = KarmaLedger::new(store.clone(), settings);
    Gate {
        workflow: ReportWorkflow::new(store.clone(), ledger.clone()),
        daily: DailyCycleManager::new(store, ledger.clone()),
        ledger,
    }
}

fn device(n: u32) -> String {
    format!("{:0>32}", format!("device-{}", n))
}

// ============================================================================
// Ledger and Tier Tests
// ============================================================================

#[tokio::test]
async fn test_new_identity_starts_with_full_access() {
    let gate = create_test_gate();
    let d = device(1);

    let identity = gate.ledger.get_or_create(&d).await.unwrap();
    assert_eq!(identity.karma_score, 100);
    assert_eq!(gate.ledger.tier(&d).await.unwrap(), AccessTier::Full);
    assert!(identity.nickname.is_none());
    assert!(identity.verification_label.is_none());
}

#[tokio::test]
async fn test_tier_degrades_with_score() {
    let gate = create_test_gate();
    let d = device(2);

    gate.ledger.get_or_create(&d).await.unwrap();

    // 100 -> 79: below full access
    gate.ledger.adjust(&d, -21).await.unwrap();
    assert_eq!(gate.ledger.tier(&d).await.unwrap(), AccessTier::Standard);

    // 79 -> 49: warning tier
    gate.ledger.adjust(&d, -30).await.unwrap();
    assert_eq!(gate.ledger.tier(&d).await.unwrap(), AccessTier::Warning);

    // 49 -> 19: temp ban
    gate.ledger.adjust(&d, -30).await.unwrap();
    assert_eq!(gate.ledger.tier(&d).await.unwrap(), AccessTier::TempBan);

    // down to the floor: permanent ban
    gate.ledger.adjust(&d, -1000).await.unwrap();
    assert_eq!(gate.ledger.current_score(&d).await.unwrap(), 0);
    assert_eq!(
        gate.ledger.tier(&d).await.unwrap(),
        AccessTier::PermanentBan
    );
}

#[tokio::test]
async fn test_recovery_from_the_floor() {
    let gate = create_test_gate();
    let d = device(3);

    gate.ledger.adjust(&d, -500).await.unwrap();
    assert_eq!(gate.ledger.current_score(&d).await.unwrap(), 0);

    // Chat completions climb back out of the ban
    for _ in 0..3 {
        gate.ledger.award_chat_completion(&d).await.unwrap();
    }
    assert_eq!(gate.ledger.current_score(&d).await.unwrap(), 30);
    assert_eq!(gate.ledger.tier(&d).await.unwrap(), AccessTier::Warning);
}

#[tokio::test]
async fn test_custom_settings_flow_through() {
    let settings = KarmaSettings {
        initial_karma: 50,
        chat_complete_bonus: 1,
        ..KarmaSettings::default()
    };
    let gate = create_test_gate_with(settings);
    let d = device(4);

    assert_eq!(gate.ledger.current_score(&d).await.unwrap(), 50);
    assert_eq!(gate.ledger.award_chat_completion(&d).await.unwrap(), 51);
    assert_eq!(gate.ledger.tier(&d).await.unwrap(), AccessTier::Standard);
}

// ============================================================================
// Report Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_report_lifecycle_verified() {
    let gate = create_test_gate();
    let reporter = device(10);
    let reported = device(11);

    let report = gate
        .workflow
        .submit(&reporter, &reported, "explicit content on camera")
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::Pending);

    // Submission penalty lands immediately, tier still Full
    assert_eq!(gate.ledger.current_score(&reported).await.unwrap(), 80);
    assert_eq!(gate.ledger.tier(&reported).await.unwrap(), AccessTier::Full);

    let resolved = gate.workflow.verify(report.id, true).await.unwrap();
    assert_eq!(resolved.status, ReportStatus::Verified);
    assert!(resolved.resolved_at.is_some());

    // Verification compounds: 100 - 20 - 30 = 50, Standard tier
    assert_eq!(gate.ledger.current_score(&reported).await.unwrap(), 50);
    assert_eq!(
        gate.ledger.tier(&reported).await.unwrap(),
        AccessTier::Standard
    );
    assert_eq!(gate.ledger.current_score(&reporter).await.unwrap(), 100);
}

#[tokio::test]
async fn test_report_lifecycle_rejected() {
    let gate = create_test_gate();
    let reporter = device(12);
    let reported = device(13);

    let report = gate
        .workflow
        .submit(&reporter, &reported, "claimed harassment, unfounded")
        .await
        .unwrap();
    let resolved = gate.workflow.verify(report.id, false).await.unwrap();
    assert_eq!(resolved.status, ReportStatus::Rejected);

    // Reporter pays for the false report; the submission penalty stands
    assert_eq!(gate.ledger.current_score(&reporter).await.unwrap(), 85);
    assert_eq!(gate.ledger.current_score(&reported).await.unwrap(), 80);
}

#[tokio::test]
async fn test_report_is_terminal_after_adjudication() {
    let gate = create_test_gate();
    let report = gate
        .workflow
        .submit(&device(14), &device(15), "spam in the chat window")
        .await
        .unwrap();

    gate.workflow.verify(report.id, false).await.unwrap();

    let err = gate.workflow.verify(report.id, true).await.unwrap_err();
    assert!(matches!(
        err,
        KarmaError::InvalidState {
            status: ReportStatus::Rejected
        }
    ));
    // Scores are unchanged by the failed retry
    assert_eq!(gate.ledger.current_score(&device(15)).await.unwrap(), 80);
}

#[tokio::test]
async fn test_repeat_offender_slides_into_ban() {
    let gate = create_test_gate();
    let offender = device(16);

    // Three verified reports from distinct reporters: 100 - 3*(20+30) = 0
    for n in 20..23 {
        let report = gate
            .workflow
            .submit(&device(n), &offender, "repeated misconduct reports")
            .await
            .unwrap();
        gate.workflow.verify(report.id, true).await.unwrap();
    }

    assert_eq!(gate.ledger.current_score(&offender).await.unwrap(), 0);
    assert_eq!(
        gate.ledger.tier(&offender).await.unwrap(),
        AccessTier::PermanentBan
    );

    // And a banned identity cannot retaliate
    let err = gate
        .workflow
        .submit(&offender, &device(20), "retaliation for the report")
        .await
        .unwrap_err();
    assert!(matches!(err, KarmaError::AccessDenied { .. }));
}

// ============================================================================
// Daily Cycle Tests
// ============================================================================

#[tokio::test]
async fn test_session_initiation_sequence() {
    let gate = create_test_gate();
    let d = device(30);

    // First session: create, reset, award. Creation stamps today, so no
    // same-day bonus applies.
    gate.ledger.get_or_create(&d).await.unwrap();
    gate.daily.reset_daily_limits(&d).await.unwrap();
    let score = gate.daily.award_daily_login(&d).await.unwrap();
    assert_eq!(score, 100);

    // Second session the same day changes nothing
    gate.daily.reset_daily_limits(&d).await.unwrap();
    let score = gate.daily.award_daily_login(&d).await.unwrap();
    assert_eq!(score, 100);
}

#[tokio::test]
async fn test_filter_budget_consumed_by_matches() {
    let gate = create_test_gate();
    let d = device(31);

    assert_eq!(gate.daily.filters_remaining(&d).await.unwrap(), 5);

    gate.daily.record_match(&d, true).await.unwrap();
    gate.daily.record_match(&d, false).await.unwrap();
    gate.daily.record_match(&d, true).await.unwrap();

    // Only filtered matches consume the budget
    assert_eq!(gate.daily.filters_remaining(&d).await.unwrap(), 3);
}

#[tokio::test]
async fn test_chat_completion_awards_and_records() {
    let gate = create_test_gate();
    let d = device(32);

    let score = gate.ledger.award_chat_completion(&d).await.unwrap();
    gate.daily.record_match(&d, true).await.unwrap();

    assert_eq!(score, 110);
    assert_eq!(gate.daily.filters_remaining(&d).await.unwrap(), 4);
}

// ============================================================================
// Verification Tests
// ============================================================================

#[tokio::test]
async fn test_verification_label_persists_without_image() {
    let gate = create_test_gate();
    let d = device(40);

    gate.ledger.record_verification(&d, "Man").await.unwrap();

    let identity = gate.ledger.get_or_create(&d).await.unwrap();
    assert_eq!(identity.verification_label.as_deref(), Some("Man"));
    assert!(identity.is_verified());
    // Karma is unaffected by verification
    assert_eq!(identity.karma_score, 100);
}

#[tokio::test]
async fn test_reverification_overwrites_label() {
    let gate = create_test_gate();
    let d = device(41);

    gate.ledger.record_verification(&d, "Woman").await.unwrap();
    gate.ledger.record_verification(&d, "Man").await.unwrap();

    let identity = gate.ledger.get_or_create(&d).await.unwrap();
    assert_eq!(identity.verification_label.as_deref(), Some("Man"));
}

// ============================================================================
// Full Scenario Walk
// ============================================================================

#[tokio::test]
async fn test_full_user_journey() {
    let gate = create_test_gate();
    let alice = device(50);
    let bob = device(51);

    // Both arrive with full access
    assert_eq!(gate.ledger.tier(&alice).await.unwrap(), AccessTier::Full);
    assert_eq!(gate.ledger.tier(&bob).await.unwrap(), AccessTier::Full);

    // They match and both finish a clean chat
    gate.ledger.award_chat_completion(&alice).await.unwrap();
    gate.ledger.award_chat_completion(&bob).await.unwrap();
    gate.daily.record_match(&alice, false).await.unwrap();
    gate.daily.record_match(&bob, true).await.unwrap();

    assert_eq!(gate.ledger.current_score(&alice).await.unwrap(), 110);
    assert_eq!(gate.daily.filters_remaining(&bob).await.unwrap(), 4);

    // A later chat goes badly and alice reports bob
    let report = gate
        .workflow
        .submit(&alice, &bob, "abusive language during chat")
        .await
        .unwrap();
    assert_eq!(gate.ledger.current_score(&bob).await.unwrap(), 90);

    // Moderation confirms it
    gate.workflow.verify(report.id, true).await.unwrap();
    assert_eq!(gate.ledger.current_score(&bob).await.unwrap(), 60);
    assert_eq!(gate.ledger.tier(&bob).await.unwrap(), AccessTier::Standard);

    // Alice's standing is untouched throughout
    assert_eq!(gate.ledger.current_score(&alice).await.unwrap(), 110);
    assert_eq!(gate.ledger.tier(&alice).await.unwrap(), AccessTier::Full);
}
