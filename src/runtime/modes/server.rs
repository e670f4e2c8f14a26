//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It configures and starts the HTTP server with all necessary routes.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    http::{Method, header},
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::{AppStartTime, api_config, health_routes};
use crate::config::{ApiConfig, get_config};
use crate::runtime::lifetime;

/// Validate CORS configuration at startup (runs once)
fn validate_cors_config(api: &ApiConfig) {
    if api.cors_allowed_origins.is_empty() {
        info!("CORS: no allowed origins configured, same-origin only");
    } else if api.cors_allowed_origins.iter().any(|o| o == "*") {
        warn!("CORS: any origin may call the admin API");
    }
}

/// Build CORS middleware from configuration
fn build_cors_middleware(api: &ApiConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::HeaderName::from_static(
            crate::api::middleware::request_id::REQUEST_ID_HEADER,
        )])
        .max_age(3600);

    // Empty origins = same-origin only
    if api.cors_allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &api.cors_allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

/// Run the HTTP server
///
/// This function:
/// 1. Records startup time
/// 2. Builds the service objects and the shared query cache
/// 3. Configures and starts the HTTP server
/// 4. Listens for graceful shutdown signals
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime::now();
    let config = get_config();

    let startup = lifetime::startup::prepare_services(&config).map_err(|e| {
        tracing::error!("Server startup failed: {}", e);
        e
    })?;

    let cache = startup.cache.clone();
    let admin_service = startup.admin_service.clone();
    let analytics_service = startup.analytics_service.clone();

    let admin_token = config.api.admin_token.clone();
    if admin_token.is_empty() {
        warn!("Admin API is disabled (api.admin_token not set)");
    } else {
        info!("Admin API available at: /api");
    }

    let api = config.api.clone();
    validate_cors_config(&api);

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} CPU cores for the server", cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(build_cors_middleware(&api))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .app_data(web::Data::new(analytics_service.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(4 * 1024 * 1024))
            .service(health_routes())
            .configure(api_config(admin_token.clone()))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .workers(cpu_count)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    info!("Starting server at http://{}", bind_address);

    let handle = server.handle();
    tokio::select! {
        res = server => {
            res.context("HTTP server error")?;
        }
        _ = lifetime::shutdown::shutdown_signal() => {
            handle.stop(true).await;
            warn!("Graceful shutdown: server stopped");
        }
    }

    Ok(())
}
