//! Admin API 笔记管理

use actix_web::{Responder, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::pagination::{ListParams, NoteFilter, PageRequest, PageResponse, Selection};
use crate::services::{AdminService, NoteRef, NoteUpdate};

use super::helpers::{api_result, check_batch_size, error_from_admin, success_response};
use super::types::{BulkResponse, NoteDeleteQuery, NotesBulkDeleteRequest};

pub async fn list_notes(
    query: web::Query<ListParams>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    trace!("Admin API: list notes {:?}", query);
    let filter = NoteFilter::from_params(&query);
    let request = PageRequest::from_params(&query);
    api_result(
        service
            .list_notes(filter, request)
            .await
            .map(|page| PageResponse::new(page, request)),
    )
}

pub async fn note_filter_options(service: web::Data<Arc<AdminService>>) -> impl Responder {
    api_result(service.note_filter_options().await)
}

pub async fn update_note(
    path: web::Path<String>,
    body: web::Json<NoteUpdate>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    api_result(service.update_note(&path, body.into_inner()).await)
}

/// 删除笔记及其文件；文件删除失败时在响应中返回 `orphanedFileId`
pub async fn delete_note(
    path: web::Path<String>,
    query: web::Query<NoteDeleteQuery>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    let note = NoteRef {
        note_id: path.into_inner(),
        file_id: query.into_inner().file_id,
    };
    api_result(service.delete_note(note).await)
}

pub async fn bulk_delete_notes(
    body: web::Json<NotesBulkDeleteRequest>,
    service: web::Data<Arc<AdminService>>,
) -> impl Responder {
    let notes = body.into_inner().notes;
    if let Err(e) = check_batch_size(notes.len(), service.settings().bulk.max_batch_size) {
        return error_from_admin(&e);
    }
    info!("Admin API: bulk delete request - {} notes", notes.len());

    let selection = Selection::new(notes.iter().map(|n| n.note_id.clone()));
    let (outcome, orphaned) = service.bulk_delete_notes(notes).await;
    success_response(BulkResponse::new(outcome, selection, "notes").with_orphaned_files(orphaned))
}
