use anyhow::{Result, bail};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analytics::PostHogClient;
use crate::cache::QueryCache;
use crate::config::StaticConfig;
use crate::services::{AdminService, AdminSettings, AnalyticsService, Backends, HttpRevalidator};
use crate::storage::AppwriteClient;

pub struct StartupContext {
    pub cache: Arc<QueryCache>,
    pub admin_service: Arc<AdminService>,
    pub analytics_service: Arc<AnalyticsService>,
}

/// 组装外部服务客户端、查询缓存和两个服务对象
///
/// 不会发起任何网络请求；连接问题会在第一次请求时以 502 暴露。
pub fn prepare_services(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    if config.database.project_id.is_empty() {
        bail!("database.project_id is not set");
    }
    if config.database.api_key.is_empty() {
        warn!("database.api_key is empty; Appwrite calls will be unauthenticated");
    }
    if config.analytics.project_id.is_empty() {
        warn!("analytics.project_id is empty; trend endpoints will fail");
    }
    if config.revalidation.token.as_deref().is_none_or(str::is_empty) {
        warn!("revalidation.token is not set; subject changes will not reach the main app");
    }

    let appwrite = Arc::new(AppwriteClient::new(&config.database));
    let backends = Backends {
        store: appwrite.clone(),
        files: appwrite.clone(),
        functions: appwrite,
        revalidator: Arc::new(HttpRevalidator::new(&config.revalidation)),
    };

    let cache = Arc::new(QueryCache::new(&config.cache));
    let admin_service = Arc::new(AdminService::new(
        backends,
        cache.clone(),
        AdminSettings::from_config(config),
    ));
    let analytics_service = Arc::new(AnalyticsService::new(
        Arc::new(PostHogClient::new(&config.analytics)),
        cache.clone(),
    ));

    info!(
        "Services ready in {} ms (Appwrite: {}, PostHog: {})",
        start_time.elapsed().as_millis(),
        config.database.endpoint,
        config.analytics.host
    );

    Ok(StartupContext {
        cache,
        admin_service,
        analytics_service,
    })
}
