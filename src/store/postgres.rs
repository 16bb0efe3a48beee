//! PostgreSQL store using sqlx
//!
//! Karma adjustments and report resolution are each a single statement, so
//! row-level atomicity comes from the database itself:
//! `GREATEST(0, karma + delta)` for the floor-at-zero adjust and
//! `UPDATE .. WHERE status = 'pending'` for the resolve-once transition.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::karma::{Identity, Report, ReportStatus};
use crate::store::{parse_report_status, KarmaStore, StoreError};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(connection_string: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(connection_string)
            .await?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        info!("Initializing karma schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS identities (
                device_id VARCHAR(64) PRIMARY KEY,
                karma_score INTEGER NOT NULL,
                nickname VARCHAR(50),
                bio VARCHAR(200),
                verification_label VARCHAR(32),
                daily_match_count INTEGER NOT NULL DEFAULT 0,
                daily_filter_count INTEGER NOT NULL DEFAULT 0,
                last_verified_at TIMESTAMP WITH TIME ZONE,
                last_active_date TIMESTAMP WITH TIME ZONE,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id UUID PRIMARY KEY,
                reporter_device_id VARCHAR(64) NOT NULL,
                reported_device_id VARCHAR(64) NOT NULL,
                reason VARCHAR(500) NOT NULL,
                status VARCHAR(16) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                resolved_at TIMESTAMP WITH TIME ZONE
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_reporter ON reports(reporter_device_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_reported ON reports(reported_device_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status)")
            .execute(&self.pool)
            .await?;

        info!("Karma schema initialized");
        Ok(())
    }

    fn identity_from_row(row: &sqlx::postgres::PgRow) -> Identity {
        let daily_match_count: i32 = row.get("daily_match_count");
        let daily_filter_count: i32 = row.get("daily_filter_count");
        Identity {
            device_id: row.get("device_id"),
            karma_score: row.get("karma_score"),
            nickname: row.get("nickname"),
            bio: row.get("bio"),
            verification_label: row.get("verification_label"),
            daily_match_count: daily_match_count.max(0) as u32,
            daily_filter_count: daily_filter_count.max(0) as u32,
            last_verified_at: row.get("last_verified_at"),
            last_active_date: row.get("last_active_date"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn report_from_row(row: &sqlx::postgres::PgRow) -> Result<Report, StoreError> {
        let id: Uuid = row.get("id");
        let status: String = row.get("status");
        Ok(Report {
            id,
            reporter_device_id: row.get("reporter_device_id"),
            reported_device_id: row.get("reported_device_id"),
            reason: row.get("reason"),
            status: parse_report_status(id, &status)?,
            created_at: row.get("created_at"),
            resolved_at: row.get("resolved_at"),
        })
    }
}

const IDENTITY_COLUMNS: &str = "device_id, karma_score, nickname, bio, verification_label, \
     daily_match_count, daily_filter_count, last_verified_at, last_active_date, \
     created_at, updated_at";

#[async_trait]
impl KarmaStore for PostgresStore {
    async fn get_identity(&self, device_id: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE device_id = $1"
        ))
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::identity_from_row))
    }

    async fn get_or_create_identity(
        &self,
        device_id: &str,
        initial_karma: i32,
    ) -> Result<Identity, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO identities (device_id, karma_score, last_active_date)
            VALUES ($1, GREATEST(0, $2), NOW())
            ON CONFLICT (device_id) DO UPDATE SET device_id = EXCLUDED.device_id
            RETURNING {IDENTITY_COLUMNS}
        "#,
        ))
        .bind(device_id)
        .bind(initial_karma)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::identity_from_row(&row))
    }

    async fn adjust_karma(
        &self,
        device_id: &str,
        delta: i32,
        initial_karma: i32,
    ) -> Result<i32, StoreError> {
        // Single statement: insert-or-adjust with the floor applied in SQL,
        // so concurrent adjustments on the same row cannot lose updates.
        let row = sqlx::query(
            r#"
            INSERT INTO identities (device_id, karma_score, last_active_date)
            VALUES ($1, GREATEST(0, $2 + $3), NOW())
            ON CONFLICT (device_id) DO UPDATE SET
                karma_score = GREATEST(0, identities.karma_score + $3),
                updated_at = NOW()
            RETURNING karma_score
        "#,
        )
        .bind(device_id)
        .bind(initial_karma)
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("karma_score"))
    }

    async fn update_profile(
        &self,
        device_id: &str,
        nickname: &str,
        bio: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE identities SET nickname = $2, bio = $3, updated_at = NOW()
            WHERE device_id = $1
            RETURNING {IDENTITY_COLUMNS}
        "#,
        ))
        .bind(device_id)
        .bind(nickname)
        .bind(bio)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::identity_from_row))
    }

    async fn set_verification_label(
        &self,
        device_id: &str,
        label: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE identities
            SET verification_label = $2, last_verified_at = $3, updated_at = NOW()
            WHERE device_id = $1
        "#,
        )
        .bind(device_id)
        .bind(label)
        .bind(verified_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_daily_login(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE identities SET last_active_date = $2, updated_at = NOW()
            WHERE device_id = $1
              AND (last_active_date IS NULL
                   OR (last_active_date AT TIME ZONE 'UTC')::date < $3)
        "#,
        )
        .bind(device_id)
        .bind(now)
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn reset_daily_counters(
        &self,
        device_id: &str,
        today: NaiveDate,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE identities
            SET daily_match_count = 0, daily_filter_count = 0, updated_at = NOW()
            WHERE device_id = $1
              AND last_active_date IS NOT NULL
              AND (last_active_date AT TIME ZONE 'UTC')::date < $2
        "#,
        )
        .bind(device_id)
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn increment_daily_counters(
        &self,
        device_id: &str,
        used_filter: bool,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE identities
            SET daily_match_count = daily_match_count + 1,
                daily_filter_count = daily_filter_count + CASE WHEN $2 THEN 1 ELSE 0 END,
                updated_at = NOW()
            WHERE device_id = $1
        "#,
        )
        .bind(device_id)
        .bind(used_filter)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_report(&self, report: &Report) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reports
                (id, reporter_device_id, reported_device_id, reason, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
        )
        .bind(report.id)
        .bind(&report.reporter_device_id)
        .bind(&report.reported_device_id)
        .bind(&report.reason)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<Report>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, reporter_device_id, reported_device_id, reason, status,
                   created_at, resolved_at
            FROM reports WHERE id = $1
        "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::report_from_row).transpose()
    }

    async fn resolve_report(
        &self,
        id: Uuid,
        status: ReportStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<Report>, StoreError> {
        // Compare-and-set on the pending status: of two concurrent
        // adjudications, exactly one sees a row here.
        let row = sqlx::query(
            r#"
            UPDATE reports SET status = $2, resolved_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING id, reporter_device_id, reported_device_id, reason, status,
                      created_at, resolved_at
        "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(resolved_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::report_from_row).transpose()
    }
}
