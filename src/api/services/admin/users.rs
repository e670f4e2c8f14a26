//! Admin API 用户管理

use actix_web::{Responder, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::pagination::{ListParams, PageRequest, PageResponse, Selection, UserFilter};
use crate::services::{AdminService, NewUser, UserUpdate};

use super::helpers::{
    api_result, check_batch_size, created_response, error_from_admin, success_response,
};
use super::types::{BulkResponse, MessageResponse, UsersBulkDeleteRequest};

pub async fn list_users(
    query: web::Query<ListParams>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    trace!("Admin API: list users {:?}", query);
    let filter = match UserFilter::from_params(&query) {
        Ok(filter) => filter,
        Err(e) => return error_from_admin(&e),
    };
    let request = PageRequest::from_params(&query);
    api_result(
        service
            .list_users(filter, request)
            .await
            .map(|page| PageResponse::new(page, request)),
    )
}

/// 注册单个用户（`POST /api/register`）
pub async fn register_user(
    body: web::Json<NewUser>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    match service.register_user(body.into_inner()).await {
        Ok(user) => created_response(user),
        Err(e) => error_from_admin(&e),
    }
}

pub async fn update_user(
    path: web::Path<String>,
    body: web::Json<UserUpdate>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    api_result(service.update_user(&path, body.into_inner()).await)
}

pub async fn delete_user(
    path: web::Path<String>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    api_result(
        service
            .delete_user(&path)
            .await
            .map(|_| MessageResponse::new("User deleted")),
    )
}

pub async fn bulk_delete_users(
    body: web::Json<UsersBulkDeleteRequest>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    let ids = body.into_inner().ids;
    if let Err(e) = check_batch_size(ids.len(), service.settings().bulk.max_batch_size) {
        return error_from_admin(&e);
    }
    info!("Admin API: bulk delete request - {} users", ids.len());

    let selection = Selection::new(ids.iter().cloned());
    let outcome = service.bulk_delete_users(ids).await;
    success_response(BulkResponse::new(outcome, selection, "users"))
}

/// CSV 导入，请求体为 `text/csv`
pub async fn import_users(body: String, service: web::Data<Arc<AdminService>>) -> impl Responder {
    info!("Admin API: CSV import request ({} bytes)", body.len());
    api_result(service.import_users_csv(&body).await)
}
