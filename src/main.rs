use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use veil_gate::{
    api::{create_auth_router, create_report_router, AuthApiState, ReportApiState},
    Classifier, DailyCycleManager, HttpClassifier, KarmaLedger, KarmaStore, MemoryStore,
    PostgresStore, ReportWorkflow, VeilConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - this validates thresholds and delta signs
    let config = VeilConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        eprintln!("Please check VEIL_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting Veil Gate karma server");
    info!(
        "Karma settings: initial={}, thresholds={}/{}/{}",
        config.karma.initial_karma,
        config.karma.temp_ban_threshold,
        config.karma.warning_threshold,
        config.karma.full_access_threshold
    );

    // Select the store backend
    let store: Arc<dyn KarmaStore> = if config.database.postgres_enabled {
        let postgres = PostgresStore::connect(&config.database.postgres_url).await?;
        postgres.init_schema().await?;
        info!("Connected to PostgreSQL store");
        Arc::new(postgres)
    } else {
        info!("Using in-memory store (data is lost on restart)");
        Arc::new(MemoryStore::new())
    };

    // Assemble the karma components
    let settings = config.karma.to_settings();
    let ledger = KarmaLedger::new(store.clone(), settings);
    let workflow = Arc::new(ReportWorkflow::new(store.clone(), ledger.clone()));
    let daily = Arc::new(DailyCycleManager::new(store.clone(), ledger.clone()));

    let classifier: Arc<dyn Classifier> = Arc::new(
        HttpClassifier::new(config.classifier.clone())
            .map_err(|e| anyhow::anyhow!("Failed to create classifier client: {}", e))?,
    );
    info!("Classification service: {}", config.classifier.service_url);

    if config.admin_api_key.is_none() {
        info!("No admin API key configured - adjudication endpoints are disabled");
    }

    // Build the application with routes
    let app = Router::new()
        // Session, profile and verification routes
        .nest(
            "/api/auth",
            create_auth_router(AuthApiState {
                ledger: ledger.clone(),
                daily: daily.clone(),
                classifier,
            }),
        )
        // Report and karma routes
        .nest(
            "/api/reports",
            create_report_router(ReportApiState {
                ledger,
                workflow,
                daily,
                admin_api_key: config.admin_api_key.clone(),
            }),
        )
        // Health check
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http());

    // Start the server on configured host/port
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Veil Gate server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging from configuration
fn init_logging(config: &VeilConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
