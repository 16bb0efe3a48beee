//! Configuration management
//!
//! All knobs come from `VEIL_*` environment variables over built-in
//! defaults, are validated once at startup, and are immutable afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::classify::ClassifierConfig;
use crate::karma::KarmaSettings;

/// Top-level configuration for the gate service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeilConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Karma deltas and tier thresholds
    pub karma: KarmaConfig,
    /// Classification service client
    pub classifier: ClassifierConfig,
    /// Admin API key for adjudication endpoints
    pub admin_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, uses the in-memory store)
    pub postgres_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Enable request/response span logging
    pub log_requests: bool,
}

/// Karma configuration as loaded from the environment. Converted to
/// `KarmaSettings` for the domain components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarmaConfig {
    /// Starting karma for new identities
    pub initial_karma: i32,
    /// Bonus for completing a chat without reports
    pub chat_complete_bonus: i32,
    /// Once-per-day login bonus
    pub daily_login_bonus: i32,
    /// Penalty applied to the reported identity at submission (negative)
    pub report_penalty: i32,
    /// Additional penalty on a verified report (negative)
    pub verified_report_penalty: i32,
    /// Penalty to the reporter of a rejected report (negative)
    pub false_report_penalty: i32,
    /// Score below which the identity is temp-banned
    pub temp_ban_threshold: i32,
    /// Score below which access drops to warning tier
    pub warning_threshold: i32,
    /// Score at or above which access is full
    pub full_access_threshold: i32,
    /// Filtered matches allowed per day
    pub daily_filter_limit: u32,
}

impl Default for KarmaConfig {
    fn default() -> Self {
        let s = KarmaSettings::default();
        Self {
            initial_karma: s.initial_karma,
            chat_complete_bonus: s.chat_complete_bonus,
            daily_login_bonus: s.daily_login_bonus,
            report_penalty: s.report_penalty,
            verified_report_penalty: s.verified_report_penalty,
            false_report_penalty: s.false_report_penalty,
            temp_ban_threshold: s.temp_ban_threshold,
            warning_threshold: s.warning_threshold,
            full_access_threshold: s.full_access_threshold,
            daily_filter_limit: s.daily_filter_limit,
        }
    }
}

impl KarmaConfig {
    /// Convert to `KarmaSettings` for use by the karma components
    pub fn to_settings(&self) -> KarmaSettings {
        KarmaSettings {
            initial_karma: self.initial_karma,
            chat_complete_bonus: self.chat_complete_bonus,
            daily_login_bonus: self.daily_login_bonus,
            report_penalty: self.report_penalty,
            verified_report_penalty: self.verified_report_penalty,
            false_report_penalty: self.false_report_penalty,
            temp_ban_threshold: self.temp_ban_threshold,
            warning_threshold: self.warning_threshold,
            full_access_threshold: self.full_access_threshold,
            daily_filter_limit: self.daily_filter_limit,
        }
    }
}

impl Default for VeilConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8420,
            },
            database: DatabaseConfig {
                postgres_url: "postgresql://localhost:5432/veil_gate".to_string(),
                postgres_enabled: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                log_requests: false,
            },
            karma: KarmaConfig::default(),
            classifier: ClassifierConfig::default(),
            admin_api_key: None,
        }
    }
}

impl VeilConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("VEIL_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = env::var("VEIL_PORT") {
            config.server.port = port.parse().context("Invalid VEIL_PORT value")?;
        }

        if let Ok(url) = env::var("VEIL_POSTGRES_URL") {
            config.database.postgres_url = url;
        }

        if let Ok(enabled) = env::var("VEIL_POSTGRES_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("Invalid VEIL_POSTGRES_ENABLED value")?;
        }

        if let Ok(level) = env::var("VEIL_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(log_requests) = env::var("VEIL_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("Invalid VEIL_LOG_REQUESTS value")?;
        }

        // Karma deltas and thresholds
        if let Ok(value) = env::var("VEIL_KARMA_INITIAL") {
            config.karma.initial_karma =
                value.parse().context("Invalid VEIL_KARMA_INITIAL value")?;
        }

        if let Ok(value) = env::var("VEIL_KARMA_CHAT_COMPLETE") {
            config.karma.chat_complete_bonus = value
                .parse()
                .context("Invalid VEIL_KARMA_CHAT_COMPLETE value")?;
        }

        if let Ok(value) = env::var("VEIL_KARMA_DAILY_LOGIN") {
            config.karma.daily_login_bonus = value
                .parse()
                .context("Invalid VEIL_KARMA_DAILY_LOGIN value")?;
        }

        if let Ok(value) = env::var("VEIL_KARMA_REPORT_PENALTY") {
            config.karma.report_penalty = value
                .parse()
                .context("Invalid VEIL_KARMA_REPORT_PENALTY value")?;
        }

        if let Ok(value) = env::var("VEIL_KARMA_VERIFIED_REPORT_PENALTY") {
            config.karma.verified_report_penalty = value
                .parse()
                .context("Invalid VEIL_KARMA_VERIFIED_REPORT_PENALTY value")?;
        }

        if let Ok(value) = env::var("VEIL_KARMA_FALSE_REPORT_PENALTY") {
            config.karma.false_report_penalty = value
                .parse()
                .context("Invalid VEIL_KARMA_FALSE_REPORT_PENALTY value")?;
        }

        if let Ok(value) = env::var("VEIL_KARMA_TEMP_BAN_THRESHOLD") {
            config.karma.temp_ban_threshold = value
                .parse()
                .context("Invalid VEIL_KARMA_TEMP_BAN_THRESHOLD value")?;
        }

        if let Ok(value) = env::var("VEIL_KARMA_WARNING_THRESHOLD") {
            config.karma.warning_threshold = value
                .parse()
                .context("Invalid VEIL_KARMA_WARNING_THRESHOLD value")?;
        }

        if let Ok(value) = env::var("VEIL_KARMA_FULL_ACCESS_THRESHOLD") {
            config.karma.full_access_threshold = value
                .parse()
                .context("Invalid VEIL_KARMA_FULL_ACCESS_THRESHOLD value")?;
        }

        if let Ok(value) = env::var("VEIL_DAILY_FILTER_LIMIT") {
            config.karma.daily_filter_limit = value
                .parse()
                .context("Invalid VEIL_DAILY_FILTER_LIMIT value")?;
        }

        // Classification service
        if let Ok(url) = env::var("VEIL_CLASSIFIER_URL") {
            config.classifier.service_url = url;
        }

        config.classifier.api_key = env::var("VEIL_CLASSIFIER_API_KEY").ok();

        if let Ok(timeout) = env::var("VEIL_CLASSIFIER_TIMEOUT_SECS") {
            config.classifier.timeout_secs = timeout
                .parse()
                .context("Invalid VEIL_CLASSIFIER_TIMEOUT_SECS value")?;
        }

        config.admin_api_key = env::var("VEIL_ADMIN_API_KEY").ok();

        config.validate()?;

        Ok(config)
    }

    /// Validate threshold ordering and delta signs
    pub fn validate(&self) -> Result<()> {
        let k = &self.karma;

        if k.initial_karma < 0 {
            return Err(anyhow::anyhow!(
                "Initial karma must be non-negative, got {}",
                k.initial_karma
            ));
        }

        if !(0 < k.temp_ban_threshold
            && k.temp_ban_threshold < k.warning_threshold
            && k.warning_threshold < k.full_access_threshold)
        {
            return Err(anyhow::anyhow!(
                "Tier thresholds must satisfy 0 < temp_ban ({}) < warning ({}) < full_access ({})",
                k.temp_ban_threshold,
                k.warning_threshold,
                k.full_access_threshold
            ));
        }

        if k.report_penalty > 0 || k.verified_report_penalty > 0 || k.false_report_penalty > 0 {
            return Err(anyhow::anyhow!(
                "Report penalties must not be positive deltas"
            ));
        }

        if k.daily_login_bonus < 0 || k.chat_complete_bonus < 0 {
            return Err(anyhow::anyhow!("Bonuses must not be negative deltas"));
        }

        Ok(())
    }
}
