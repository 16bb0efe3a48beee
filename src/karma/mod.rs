//! Karma System
//!
//! Reputation core for the anonymous matching gate: a floored integer score
//! per device identity, a pure score-to-tier policy, a resolve-once report
//! state machine, and per-day activity bookkeeping.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐      ┌───────────────┐
//! │ DailyCycleManager│─────►│  KarmaLedger  │◄─────┐
//! │ (counters, bonus)│      │ (score owner) │      │
//! └──────────────────┘      └───────┬───────┘      │
//!                                   │       ┌──────┴─────────┐
//!                           ┌───────▼─────┐ │ ReportWorkflow │
//!                           │ AccessTier  │ │ (submit/verify)│
//!                           │ (pure, from │ └────────────────┘
//!                           │  thresholds)│
//!                           └─────────────┘
//! ```
//!
//! ## Score model
//!
//! - Scores start at the configured initial value and are floored at 0
//! - Positive events (daily login, chat completion) have no ceiling
//! - Reports penalize immediately on submission; adjudication compounds the
//!   penalty or penalizes the reporter, never refunds

mod daily;
mod error;
mod identity;
mod ledger;
mod report;
mod tier;
mod workflow;

pub use daily::DailyCycleManager;
pub use error::KarmaError;
pub use identity::Identity;
pub use ledger::KarmaLedger;
pub use report::{Report, ReportStatus};
pub use tier::{AccessTier, KarmaSettings};
pub use workflow::ReportWorkflow;
