//! Admin API 分析趋势（PostHog）

use actix_web::{Responder, web};
use std::sync::Arc;

use crate::analytics::DevicePeriod;
use crate::services::AnalyticsService;

use super::helpers::api_result;
use super::types::{DevicePeriodQuery, SessionsQuery};

pub async fn daily_active_users(service: web::Data<Arc<AnalyticsService>>) -> impl Responder {
    api_result(service.daily_active_users().await)
}

/// `?period=1m|3m|1y`，缺省或未知值按 1m
pub async fn device_users(
    query: web::Query<DevicePeriodQuery>,
    service: web::Data<Arc<AnalyticsService>>,
) -> impl Responder {
    let period = DevicePeriod::parse(query.period.as_deref());
    api_result(service.device_users(period).await)
}

pub async fn top_pages(service: web::Data<Arc<AnalyticsService>>) -> impl Responder {
    api_result(service.top_pages().await)
}

pub async fn top_users(service: web::Data<Arc<AnalyticsService>>) -> impl Responder {
    api_result(service.top_users().await)
}

pub async fn user_sessions(
    path: web::Path<String>,
    query: web::Query<SessionsQuery>,
    service: web::Data<Arc<AnalyticsService>>,
) -> impl Responder {
    api_result(
        service
            .user_sessions(&path, query.limit, query.offset)
            .await,
    )
}
