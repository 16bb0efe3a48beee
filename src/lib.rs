//! Veil Gate
//!
//! Karma-gated access control for an anonymous, device-fingerprinted
//! peer-matching service: a reputation ledger, a score-to-tier access
//! policy, a resolve-once misconduct report workflow, and daily-cycle
//! bookkeeping, fronted by a small HTTP API.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs       - Crate root with re-exports
//! ├── main.rs      - Server entrypoint
//! ├── config.rs    - Configuration management
//! ├── karma/       - Reputation core
//! │   ├── identity.rs - Identity record (device-keyed, no PII)
//! │   ├── tier.rs     - Access tiers & karma thresholds
//! │   ├── ledger.rs   - Karma ledger (sole score mutator)
//! │   ├── report.rs   - Report record & status machine
//! │   ├── workflow.rs - Report submit/adjudicate workflow
//! │   ├── daily.rs    - Daily counters & login bonus
//! │   └── error.rs    - Error taxonomy
//! ├── store/       - Persistence (PostgreSQL + in-memory)
//! ├── classify/    - External classification service client
//! └── api/         - HTTP endpoints
//!     ├── auth.rs     - Session, profile, verification
//!     ├── reports.rs  - Reports, karma, adjudication
//!     └── middleware.rs - Device-ID extraction, admin key
//! ```

pub mod api;
pub mod classify;
pub mod config;
pub mod karma;
pub mod store;

// Re-export main types for convenience
pub use config::VeilConfig;
pub use classify::{Classifier, ClassifierConfig, ClassifyError, HttpClassifier};
pub use karma::{
    AccessTier, DailyCycleManager, Identity, KarmaError, KarmaLedger, KarmaSettings, Report,
    ReportStatus, ReportWorkflow,
};
pub use store::{KarmaStore, MemoryStore, PostgresStore, StoreError};

// Re-export API types
pub use api::{
    create_auth_router, create_report_router, AuthApiState, DeviceId, ReportApiState,
};
