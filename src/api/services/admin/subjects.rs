//! Admin API 学科管理

use actix_web::{Responder, web};
use std::sync::Arc;
use tracing::trace;

use crate::pagination::{ListParams, PageRequest, PageResponse, SubjectFilter};
use crate::services::{AdminService, SubjectInput};

use super::helpers::{api_result, created_response, error_from_admin};
use super::types::MessageResponse;

pub async fn list_subjects(
    query: web::Query<ListParams>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    trace!("Admin API: list subjects {:?}", query);
    let filter = SubjectFilter::from_params(&query);
    let request = PageRequest::from_params(&query);
    api_result(
        service
            .list_subjects(filter, request)
            .await
            .map(|page| PageResponse::new(page, request)),
    )
}

pub async fn semester_options(service: web::Data<Arc<AdminService>>) -> impl Responder {
    api_result(service.semester_options().await)
}

pub async fn create_subject(
    body: web::Json<SubjectInput>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    match service.create_subject(body.into_inner()).await {
        Ok(subject) => created_response(subject),
        Err(e) => error_from_admin(&e),
    }
}

pub async fn update_subject(
    path: web::Path<String>,
    body: web::Json<SubjectInput>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    api_result(service.update_subject(&path, body.into_inner()).await)
}

pub async fn delete_subject(
    path: web::Path<String>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    api_result(
        service
            .delete_subject(&path)
            .await
            .map(|_| MessageResponse::new("Subject deleted")),
    )
}
