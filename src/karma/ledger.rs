//! Karma Ledger
//!
//! The only component allowed to mutate karma. Every adjustment is
//! `max(0, current + delta)` applied atomically by the store, so penalties
//! can never drive a score negative and concurrent adjustments on the same
//! identity never lose updates. The access tier is derived from the score on
//! demand and never persisted.

use std::sync::Arc;
use tracing::debug;

use crate::karma::error::KarmaError;
use crate::karma::identity::Identity;
use crate::karma::tier::{AccessTier, KarmaSettings};
use crate::store::KarmaStore;

#[derive(Clone)]
pub struct KarmaLedger {
    store: Arc<dyn KarmaStore>,
    settings: KarmaSettings,
}

impl KarmaLedger {
    pub fn new(store: Arc<dyn KarmaStore>, settings: KarmaSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &KarmaSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn KarmaStore> {
        &self.store
    }

    /// Get the identity for a device, creating it with the configured
    /// starting karma on first reference. Idempotent.
    pub async fn get_or_create(&self, device_id: &str) -> Result<Identity, KarmaError> {
        let identity = self
            .store
            .get_or_create_identity(device_id, self.settings.initial_karma)
            .await?;
        Ok(identity)
    }

    /// Apply a karma delta, flooring at zero. Creates the identity if it
    /// does not exist yet. Returns the new score.
    pub async fn adjust(&self, device_id: &str, delta: i32) -> Result<i32, KarmaError> {
        let new_score = self
            .store
            .adjust_karma(device_id, delta, self.settings.initial_karma)
            .await?;
        debug!(device_id = %device_id, delta = delta, new_score = new_score, "Adjusted karma");
        Ok(new_score)
    }

    /// Read-only projection of the current score.
    pub async fn current_score(&self, device_id: &str) -> Result<i32, KarmaError> {
        Ok(self.get_or_create(device_id).await?.karma_score)
    }

    /// Derive the access tier for a device from its current score.
    pub async fn tier(&self, device_id: &str) -> Result<AccessTier, KarmaError> {
        let score = self.current_score(device_id).await?;
        Ok(AccessTier::for_score(score, &self.settings))
    }

    /// Bonus for finishing a chat without being reported.
    pub async fn award_chat_completion(&self, device_id: &str) -> Result<i32, KarmaError> {
        self.adjust(device_id, self.settings.chat_complete_bonus)
            .await
    }

    /// Persist the classification label returned by the external service.
    /// Only the label is stored; the image never reaches this layer.
    pub async fn record_verification(
        &self,
        device_id: &str,
        label: &str,
    ) -> Result<(), KarmaError> {
        self.get_or_create(device_id).await?;
        self.store
            .set_verification_label(device_id, label, chrono::Utc::now())
            .await?;
        debug!(device_id = %device_id, label = %label, "Recorded verification label");
        Ok(())
    }
}
