use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use k1s0_form_builder_server::adapter;
use k1s0_form_builder_server::domain;
use k1s0_form_builder_server::infrastructure;
use k1s0_form_builder_server::usecase;

use adapter::handler::{self, AppState};
use adapter::middleware::auth::AuthState;
use infrastructure::auth::JwtTokenVerifier;
use infrastructure::config::Config;
use infrastructure::telemetry::{init_telemetry, TelemetryConfig};

static MIGRATOR: sqlx::migrate::Migrator =
    sqlx::migrate!("../../../database/form-builder-db/migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Config
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    // 2. Telemetry
    init_telemetry(&TelemetryConfig {
        service_name: cfg.app.name.clone(),
        version: cfg.app.version.clone(),
        environment: cfg.app.environment.clone(),
        log_level: cfg.log.level.clone(),
        log_format: cfg.log.format.clone(),
    })?;
    info!("starting {}", cfg.app.name);

    // 3. Database
    let db_pool = if let Some(ref db_cfg) = cfg.database {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| db_cfg.connection_url());
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(db_cfg.max_connections)
            .connect(&url)
            .await?;
        MIGRATOR.run(&pool).await?;
        info!("database connected, migrations applied");
        Some(pool)
    } else {
        tracing::warn!("no database configured, using in-memory store");
        None
    };

    // 4. Repositories
    let template_repo: Arc<dyn domain::repository::FormTemplateRepository>;
    let record_repo: Arc<dyn domain::repository::RecordRepository>;
    if let Some(ref pool) = db_pool {
        template_repo = Arc::new(
            infrastructure::persistence::FormTemplatePostgresRepository::new(pool.clone()),
        );
        record_repo = Arc::new(infrastructure::persistence::RecordPostgresRepository::new(
            pool.clone(),
        ));
    } else {
        let store = Arc::new(infrastructure::persistence::InMemoryStore::new());
        template_repo = store.clone();
        record_repo = store;
    }

    // 5. Use Cases
    let manage_templates_uc = Arc::new(usecase::ManageFormTemplatesUseCase::new(
        template_repo.clone(),
    ));
    let manage_records_uc = Arc::new(usecase::ManageRecordsUseCase::new(
        template_repo.clone(),
        record_repo.clone(),
    ));
    let query_records_uc = Arc::new(usecase::QueryRecordsUseCase::new(record_repo.clone()));

    // 6. Auth
    let verifier = Arc::new(JwtTokenVerifier::new(
        &cfg.auth.jwt_secret,
        &cfg.auth.issuer,
        &cfg.auth.audience,
    ));
    let auth_state = AuthState { verifier };

    // 7. AppState + Router
    let state = AppState {
        manage_templates_uc,
        manage_records_uc,
        query_records_uc,
        auth_state,
        page_size: cfg.pagination.page_size,
        db_pool,
    };
    let app = handler::router(state);

    // 8. Start REST server
    let rest_addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!("REST server listening on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
