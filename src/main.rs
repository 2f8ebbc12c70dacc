use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use once_cell::sync::Lazy;
use portfolio_projects::{
    constants::START_TIME,
    db::postgres::{create_pool, run_migrations},
    graceful_shutdown::shutdown_signal,
    middlewares::cors::build_cors,
    routes::configure_routes,
    settings::AppConfig,
    telemetry::init_tracing,
    AppState,
};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    Lazy::force(&START_TIME);

    let config = match AppConfig::new() {
        Ok(cfg) => {
            init_tracing(cfg.is_production());
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        }
        Err(e) => {
            init_tracing(false);
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match create_pool(&config.database_url, config.database_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        tracing::error!("Failed to initialise the database schema: {}", e);
        std::process::exit(1);
    }

    let app_state = match AppState::new(&config, pool) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            tracing::error!("Failed to set up the object store client: {}", e);
            std::process::exit(1);
        }
    };

    let server_addr = format!("{}:{}", config.host, config.port);
    let max_upload_bytes = config.max_upload_bytes();

    tracing::info!(
        "🚀 Starting {} v{} on {} ({} workers)",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr,
        config.worker_count
    );

    let cors_config = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(build_cors(&cors_config))
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(configure_routes(max_upload_bytes))
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
