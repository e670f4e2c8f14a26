//! Admin API 仪表盘与手动刷新

use actix_web::{Responder, web};
use std::sync::Arc;
use tracing::info;

use crate::cache::Entity;
use crate::errors::AdminError;
use crate::pagination::filters::normalize;
use crate::services::AdminService;

use super::helpers::{api_result, error_from_admin, success_response};
use super::types::{InvalidateRequest, MessageResponse};

pub async fn dashboard_stats(service: web::Data<Arc<AdminService>>) -> impl Responder {
    api_result(service.dashboard_stats().await)
}

pub async fn recent_activity(service: web::Data<Arc<AdminService>>) -> impl Responder {
    api_result(service.recent_activity().await)
}

pub async fn teacher_contributions(service: web::Data<Arc<AdminService>>) -> impl Responder {
    api_result(service.teacher_contributions().await)
}

/// 手动失效缓存（对应仪表盘的刷新按钮）
pub async fn invalidate_cache(
    body: Option<web::Json<InvalidateRequest>>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    let request = body.map(web::Json::into_inner).unwrap_or_default();
    let entity = match normalize(request.entity.as_deref()) {
        Some(raw) => match raw.parse::<Entity>() {
            Ok(entity) => Some(entity),
            Err(_) => {
                return error_from_admin(&AdminError::validation(format!(
                    "entity: Unknown entity '{}'",
                    raw
                )));
            }
        },
        None => None,
    };

    service.invalidate(entity).await;
    let scope = entity.map_or_else(|| "all".to_string(), |e| e.to_string());
    info!("Admin API: cache invalidated ({})", scope);
    success_response(MessageResponse::new(format!("Invalidated {}", scope)))
}
