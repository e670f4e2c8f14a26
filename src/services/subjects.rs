//! Subject management
//!
//! Subject changes also push the `subjects` tag to the main application.

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::admin::AdminService;
use crate::cache::{Entity, QueryKey};
use crate::errors::Result;
use crate::pagination::{Page, PageRequest, SubjectFilter};
use crate::storage::Query;
use crate::storage::models::Subject;
use crate::utils::validation::{FieldErrors, require};

pub const SEMESTERS: [&str; 6] = ["1", "2", "3", "4", "5", "6"];

fn validate_semester(semester: &str) -> std::result::Result<(), String> {
    if SEMESTERS.contains(&semester.trim()) {
        Ok(())
    } else {
        Err("Semester must be between 1 and 6".to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectInput {
    pub name: String,
    pub abbreviation: String,
    pub code: String,
    pub semester: String,
    #[serde(default)]
    pub unit: Vec<String>,
}

impl SubjectInput {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check("name", require(&self.name, "Name is required"));
        errors.check(
            "abbreviation",
            require(&self.abbreviation, "Abbreviation is required"),
        );
        errors.check("code", require(&self.code, "Code is required"));
        errors.check("semester", validate_semester(&self.semester));
        errors.into_result()
    }

    fn to_data(&self) -> serde_json::Value {
        let unit: Vec<&str> = self
            .unit
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();
        json!({
            "name": self.name.trim(),
            "abbreviation": self.abbreviation.trim(),
            "code": self.code.trim(),
            "semester": self.semester.trim(),
            "unit": unit,
        })
    }
}

impl AdminService {
    pub async fn list_subjects(
        &self,
        filter: SubjectFilter,
        page: PageRequest,
    ) -> Result<Page<Subject>> {
        let key = QueryKey::Subjects(filter.clone(), page);
        self.cache
            .get_or_fetch(key, || async {
                let mut queries = vec![
                    Query::order_asc("semester"),
                    Query::order_asc("name"),
                    Query::limit(page.limit),
                    Query::offset(page.offset),
                ];
                if let Some(search) = &filter.search {
                    queries.push(Query::search("name", search));
                }
                if let Some(semester) = &filter.semester {
                    queries.push(Query::equal("semester", semester.as_str()));
                }

                let list = self
                    .store()
                    .list_documents(&self.collections().subjects, &queries)
                    .await?;
                let subjects = list.documents.into_iter().map(Subject::from).collect();
                Ok(Page::new(subjects, list.total))
            })
            .await
    }

    /// Fixed list, never goes stale
    pub async fn semester_options(&self) -> Result<Vec<String>> {
        self.cache
            .get_or_fetch(QueryKey::SemesterOptions, || async {
                Ok(SEMESTERS.iter().map(|s| s.to_string()).collect())
            })
            .await
    }

    pub async fn create_subject(&self, input: SubjectInput) -> Result<Subject> {
        input.validate()?;
        let doc = self
            .store()
            .create_document(&self.collections().subjects, input.to_data())
            .await?;
        info!("Created subject {} ({})", doc.id, input.abbreviation.trim());
        self.committed(Entity::Subject).await;
        Ok(Subject::from(doc))
    }

    pub async fn update_subject(&self, id: &str, input: SubjectInput) -> Result<Subject> {
        input.validate()?;
        let doc = self
            .store()
            .update_document(&self.collections().subjects, id, input.to_data())
            .await?;
        info!("Updated subject {}", id);
        self.committed(Entity::Subject).await;
        Ok(Subject::from(doc))
    }

    pub async fn delete_subject(&self, id: &str) -> Result<()> {
        self.store()
            .delete_document(&self.collections().subjects, id)
            .await?;
        info!("Deleted subject {}", id);
        self.committed(Entity::Subject).await;
        Ok(())
    }
}
