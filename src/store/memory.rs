//! In-memory store
//!
//! Backs the test suite and deployments with postgres disabled. A single
//! write lock over both tables is the serialization point, which gives the
//! same read-modify-write atomicity the SQL statements provide.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::karma::{Identity, Report, ReportStatus};
use crate::store::{KarmaStore, StoreError};

#[derive(Default)]
struct Tables {
    identities: HashMap<String, Identity>,
    reports: HashMap<Uuid, Report>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn get_or_create(&mut self, device_id: &str, initial_karma: i32) -> &mut Identity {
        self.identities
            .entry(device_id.to_string())
            .or_insert_with(|| Identity::new(device_id.to_string(), initial_karma))
    }
}

#[async_trait]
impl KarmaStore for MemoryStore {
    async fn get_identity(&self, device_id: &str) -> Result<Option<Identity>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.identities.get(device_id).cloned())
    }

    async fn get_or_create_identity(
        &self,
        device_id: &str,
        initial_karma: i32,
    ) -> Result<Identity, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.get_or_create(device_id, initial_karma).clone())
    }

    async fn adjust_karma(
        &self,
        device_id: &str,
        delta: i32,
        initial_karma: i32,
    ) -> Result<i32, StoreError> {
        let mut tables = self.tables.write().await;
        let identity = tables.get_or_create(device_id, initial_karma);
        identity.karma_score = (identity.karma_score + delta).max(0);
        identity.updated_at = Utc::now();
        Ok(identity.karma_score)
    }

    async fn update_profile(
        &self,
        device_id: &str,
        nickname: &str,
        bio: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.identities.get_mut(device_id).map(|identity| {
            identity.nickname = Some(nickname.to_string());
            identity.bio = Some(bio.to_string());
            identity.updated_at = Utc::now();
            identity.clone()
        }))
    }

    async fn set_verification_label(
        &self,
        device_id: &str,
        label: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(identity) = tables.identities.get_mut(device_id) {
            identity.verification_label = Some(label.to_string());
            identity.last_verified_at = Some(verified_at);
            identity.updated_at = verified_at;
        }
        Ok(())
    }

    async fn mark_daily_login(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(identity) = tables.identities.get_mut(device_id) else {
            return Ok(false);
        };
        let stale = match identity.last_active_date {
            Some(last) => last.date_naive() < today,
            None => true,
        };
        if stale {
            identity.last_active_date = Some(now);
            identity.updated_at = now;
        }
        Ok(stale)
    }

    async fn reset_daily_counters(
        &self,
        device_id: &str,
        today: NaiveDate,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(identity) = tables.identities.get_mut(device_id) {
            if matches!(identity.last_active_date, Some(last) if last.date_naive() < today) {
                identity.daily_match_count = 0;
                identity.daily_filter_count = 0;
                identity.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn increment_daily_counters(
        &self,
        device_id: &str,
        used_filter: bool,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(identity) = tables.identities.get_mut(device_id) {
            identity.daily_match_count += 1;
            if used_filter {
                identity.daily_filter_count += 1;
            }
            identity.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_report(&self, report: &Report) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.reports.insert(report.id, report.clone());
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<Report>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.reports.get(&id).cloned())
    }

    async fn resolve_report(
        &self,
        id: Uuid,
        status: ReportStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<Report>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(report) = tables.reports.get_mut(&id) else {
            return Ok(None);
        };
        if report.status != ReportStatus::Pending {
            return Ok(None);
        }
        report.status = status;
        report.resolved_at = Some(resolved_at);
        Ok(Some(report.clone()))
    }
}
