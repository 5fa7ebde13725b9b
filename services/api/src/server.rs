use crate::cli::ServeArgs;
use crate::infra::{clock_for, seed_declarations, seed_users, AppState};
use crate::routes::app_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use civil_registry::auth::InMemoryAuthProvider;
use civil_registry::config::AppConfig;
use civil_registry::declarations::InMemoryDeclarationStore;
use civil_registry::error::AppError;
use civil_registry::settings::JsonFileSettingsStore;
use civil_registry::telemetry;
use civil_registry::users::InMemoryUserDirectory;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryDeclarationStore::new());
    let auth = Arc::new(InMemoryAuthProvider::new());
    let settings = Arc::new(JsonFileSettingsStore::new(config.settings.path.clone()));
    let users = Arc::new(InMemoryUserDirectory::new());

    if config.environment.seeds_demo_data() {
        seed_declarations(store.clone(), clock_for(None)).await?;
        seed_users(users.as_ref()).await?;
    }

    let settings_path = settings.path().display().to_string();
    let app = app_router(store, auth, settings, users)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        %settings_path,
        "civil registry back office ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
