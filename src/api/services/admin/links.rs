//! Admin API 链接管理（YouTube 与表单）

use actix_web::{Responder, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::pagination::{LinkFilter, ListParams, PageRequest, PageResponse, Selection};
use crate::services::{AdminService, LinkUpdate, parse_link_kind};

use super::helpers::{api_result, check_batch_size, error_from_admin, success_response};
use super::types::{BulkResponse, LinkTypeQuery, LinksBulkDeleteRequest, MessageResponse};

pub async fn list_links(
    query: web::Query<ListParams>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    trace!("Admin API: list links {:?}", query);
    let filter = match LinkFilter::from_params(&query) {
        Ok(filter) => filter,
        Err(e) => return error_from_admin(&e),
    };
    let request = PageRequest::from_params(&query);
    api_result(
        service
            .list_links(filter, request)
            .await
            .map(|page| PageResponse::new(page, request)),
    )
}

pub async fn link_filter_options(service: web::Data<Arc<AdminService>>) -> impl Responder {
    api_result(service.link_filter_options().await)
}

pub async fn update_link(
    path: web::Path<String>,
    query: web::Query<LinkTypeQuery>,
    body: web::Json<LinkUpdate>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    let kind = match parse_link_kind(query.kind.as_deref()) {
        Ok(kind) => kind,
        Err(e) => return error_from_admin(&e),
    };
    api_result(service.update_link(&path, kind, body.into_inner()).await)
}

pub async fn delete_link(
    path: web::Path<String>,
    query: web::Query<LinkTypeQuery>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    let kind = match parse_link_kind(query.kind.as_deref()) {
        Ok(kind) => kind,
        Err(e) => return error_from_admin(&e),
    };
    api_result(
        service
            .delete_link(&path, kind)
            .await
            .map(|_| MessageResponse::new("Link deleted")),
    )
}

pub async fn bulk_delete_links(
    body: web::Json<LinksBulkDeleteRequest>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    let links = body.into_inner().links;
    if let Err(e) = check_batch_size(links.len(), service.settings().bulk.max_batch_size) {
        return error_from_admin(&e);
    }
    info!("Admin API: bulk delete request - {} links", links.len());

    let selection = Selection::new(links.iter().map(|l| l.id.clone()));
    let outcome = service.bulk_delete_links(links).await;
    success_response(BulkResponse::new(outcome, selection, "links"))
}
