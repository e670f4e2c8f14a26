//! Note management
//!
//! Deleting a note is two calls: the database record first, then the stored
//! file. The record is the source of truth, so a failed file delete after a
//! successful record delete is reported as an orphaned file, not an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::admin::AdminService;
use super::bulk::{BulkItem, BulkOutcome, run_bulk};
use crate::cache::{Entity, QueryKey};
use crate::errors::{AdminError, Result};
use crate::pagination::{NoteFilter, Page, PageRequest};
use crate::storage::models::Note;
use crate::storage::{CREATED_AT, Query};
use crate::utils::validation::{FieldErrors, require};

/// Uploader names: `"all"` plus one list per subject abbreviation
pub type UploaderOptions = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteUpdate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub type_of_file: String,
}

impl NoteUpdate {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check("title", require(&self.title, "Title is required"));
        errors.check(
            "type_of_file",
            require(&self.type_of_file, "Type of file is required"),
        );
        errors.into_result()
    }
}

/// Note reference for deletion; the file id is looked up when absent
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRef {
    pub note_id: String,
    #[serde(default)]
    pub file_id: Option<String>,
}

impl BulkItem for NoteRef {
    fn bulk_id(&self) -> String {
        self.note_id.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDeletion {
    pub note_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphaned_file_id: Option<String>,
}

impl AdminService {
    pub async fn list_notes(&self, filter: NoteFilter, page: PageRequest) -> Result<Page<Note>> {
        let key = QueryKey::Notes(filter.clone(), page);
        self.cache
            .get_or_fetch(key, || self.fetch_notes(filter, page))
            .await
    }

    async fn fetch_notes(&self, filter: NoteFilter, page: PageRequest) -> Result<Page<Note>> {
        let mut queries = vec![
            Query::order_desc(CREATED_AT),
            Query::limit(page.limit),
            Query::offset(page.offset),
        ];
        if let Some(search) = &filter.search {
            queries.push(Query::search("title", search));
        }
        if let Some(type_of_file) = &filter.type_of_file {
            queries.push(Query::equal("type_of_file", type_of_file.as_str()));
        }
        if let Some(teacher) = &filter.teacher {
            queries.push(Query::equal("userName", teacher.as_str()));
        }

        let list = self
            .store()
            .list_documents(&self.collections().notes, &queries)
            .await?;
        let notes = list.documents.into_iter().map(Note::from).collect();
        Ok(Page::new(notes, list.total))
    }

    /// Precomputed uploader names from the cache collection
    pub async fn note_filter_options(&self) -> Result<UploaderOptions> {
        self.cache
            .get_or_fetch(QueryKey::NotesFilterOptions, || async {
                let doc_id = self.settings.uploaders_document_id.clone();
                let mut options: UploaderOptions = match self.precomputed(&doc_id).await? {
                    Some(value) => serde_json::from_value(value).map_err(|e| {
                        AdminError::database_service(format!(
                            "Malformed uploader options document: {}",
                            e
                        ))
                    })?,
                    None => UploaderOptions::new(),
                };
                options.entry("all".to_string()).or_default();
                Ok(options)
            })
            .await
    }

    pub async fn update_note(&self, id: &str, update: NoteUpdate) -> Result<Note> {
        update.validate()?;
        let doc = self
            .store()
            .update_document(
                &self.collections().notes,
                id,
                json!({
                    "title": update.title.trim(),
                    "description": update.description,
                    "type_of_file": update.type_of_file,
                }),
            )
            .await?;
        info!("Updated note {}", id);
        self.committed(Entity::Note).await;
        Ok(Note::from(doc))
    }

    /// Delete record then file, without touching the cache
    async fn remove_note(&self, note: NoteRef) -> Result<NoteDeletion> {
        let file_id = match note.file_id.filter(|f| !f.is_empty()) {
            Some(file_id) => Some(file_id),
            None => {
                let doc = self
                    .store()
                    .get_document(&self.collections().notes, &note.note_id)
                    .await?;
                Some(Note::from(doc).file_id).filter(|f| !f.is_empty())
            }
        };

        self.store()
            .delete_document(&self.collections().notes, &note.note_id)
            .await?;

        let mut orphaned_file_id = None;
        if let Some(file_id) = file_id
            && let Err(e) = self.backends.files.delete_file(&file_id).await
        {
            warn!(
                "Note {} deleted but its file {} could not be removed: {}",
                note.note_id, file_id, e
            );
            orphaned_file_id = Some(file_id);
        }

        Ok(NoteDeletion {
            note_id: note.note_id,
            orphaned_file_id,
        })
    }

    pub async fn delete_note(&self, note: NoteRef) -> Result<NoteDeletion> {
        let deletion = self.remove_note(note).await?;
        info!("Deleted note {}", deletion.note_id);
        self.committed(Entity::Note).await;
        Ok(deletion)
    }

    /// Returns the aggregate outcome and any orphaned file ids
    pub async fn bulk_delete_notes(&self, notes: Vec<NoteRef>) -> (BulkOutcome, Vec<String>) {
        let results = run_bulk(notes, self.bulk_concurrency(), |note| self.remove_note(note)).await;

        let (outcome, deletions) = BulkOutcome::from_results(results);
        for failure in &outcome.failed {
            warn!("Bulk delete of note {} failed: {}", failure.id, failure.reason);
        }
        if outcome.any_succeeded() {
            self.committed(Entity::Note).await;
        }

        let orphaned = deletions
            .into_iter()
            .filter_map(|d| d.orphaned_file_id)
            .collect();
        (outcome, orphaned)
    }
}
