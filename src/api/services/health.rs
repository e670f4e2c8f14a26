use actix_web::{Responder, web};
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

use crate::api::services::admin::success_response;
use crate::cache::QueryCache;

// 应用启动时间
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (chrono::Utc::now() - self.start_datetime).num_seconds().max(0)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub started_at: String,
    pub uptime_seconds: i64,
    pub cached_queries: u64,
}

/// Liveness only; the external services are not probed
pub async fn health_check(
    app_start_time: web::Data<AppStartTime>,
    cache: web::Data<Arc<QueryCache>>,
) -> impl Responder {
    trace!("Received health check request");
    success_response(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        started_at: app_start_time.start_datetime.to_rfc3339(),
        uptime_seconds: app_start_time.uptime_seconds(),
        cached_queries: cache.entry_count(),
    })
}

pub fn health_routes() -> actix_web::Resource {
    web::resource("/health").route(web::get().to(health_check))
}
