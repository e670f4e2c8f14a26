//! Typed views of the platform's documents
//!
//! Records are decoded from raw [`Document`]s at the storage boundary and
//! serialized to clients with the field names the admin dashboard expects.
//! Password hashes never leave this module.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::Document;
use crate::errors::{AdminError, Result};
use crate::pagination::Identified;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub prn_no: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl TryFrom<Document> for User {
    type Error = AdminError;

    fn try_from(doc: Document) -> Result<Self> {
        let role = doc
            .string("role")
            .and_then(|r| r.parse::<Role>().ok())
            .ok_or_else(|| {
                AdminError::database_service(format!("User {} has an invalid role", doc.id))
            })?;
        Ok(Self {
            prn_no: doc.string_or_default("prnNo"),
            name: doc.string_or_default("name"),
            email: doc.string_or_default("email"),
            role,
            created_at: doc.created_at,
            id: doc.id,
        })
    }
}

/// Uploader reference embedded in a note
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uploader {
    pub name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note_id: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub file_id: String,
    pub semester: String,
    #[serde(rename = "type_of_file")]
    pub type_of_file: String,
    pub unit: Vec<String>,
    #[serde(rename = "users")]
    pub uploader: Uploader,
    pub abbreviation: String,
    pub file_url: String,
    pub mime_type: String,
    pub file_size: String,
    #[serde(rename = "thumbNail")]
    pub thumbnail: String,
}

impl From<Document> for Note {
    fn from(doc: Document) -> Self {
        Self {
            title: doc.string_or_default("title"),
            description: doc.string_or_default("description"),
            file_id: doc.string_or_default("fileId"),
            semester: doc.string_or_default("semester"),
            type_of_file: doc.string_or_default("type_of_file"),
            unit: doc.string_list("unit"),
            uploader: Uploader {
                name: doc
                    .string("userName")
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "Unknown User".to_string()),
                user_id: doc.string_or_default("userId"),
            },
            abbreviation: doc.string_or_default("abbreviation"),
            file_url: doc.string_or_default("fileUrl"),
            mime_type: doc.string_or_default("mimeType"),
            file_size: doc.string_or_default("fileSize"),
            thumbnail: doc.string_or_default("thumbNail"),
            created_at: doc.created_at,
            note_id: doc.id,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkKind {
    Youtube,
    Form,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FormType {
    GoogleForm,
    Assignment,
    Other,
}

/// A YouTube or form link, merged from two collections
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLink {
    pub id: String,
    pub title: String,
    pub url: String,
    pub created_by: String,
    pub abbreviation: String,
    pub semester: String,
    pub created_at: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_type: Option<FormType>,
}

impl AdminLink {
    pub fn from_document(doc: Document, kind: LinkKind) -> Self {
        let form_type = match kind {
            LinkKind::Form => doc.string("formType").and_then(|f| f.parse().ok()),
            LinkKind::Youtube => None,
        };
        Self {
            title: doc.string_or_default("title"),
            url: doc.string_or_default("url"),
            created_by: doc.string_or_default("createdBy"),
            abbreviation: doc.string_or_default("abbreviation"),
            semester: doc.string_or_default("semester"),
            created_at: doc.created_at,
            id: doc.id,
            kind,
            form_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub subject_id: String,
    pub name: String,
    pub abbreviation: String,
    pub code: String,
    pub semester: String,
    pub unit: Vec<String>,
}

impl From<Document> for Subject {
    fn from(doc: Document) -> Self {
        Self {
            name: doc.string_or_default("name"),
            abbreviation: doc.string_or_default("abbreviation"),
            code: doc.string_or_default("code"),
            semester: doc.string_or_default("semester"),
            unit: doc.string_list("unit"),
            subject_id: doc.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Note,
    User,
    Youtube,
    Form,
}

/// One entry of the recent-activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub user: String,
    pub timestamp: String,
}

/// Precomputed per-teacher upload counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherContribution {
    pub name: String,
    #[serde(default)]
    pub notes: u64,
    #[serde(default)]
    pub forms: u64,
    #[serde(default)]
    pub youtube: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub students: u64,
    pub teachers: u64,
    pub admins: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDistribution {
    pub notes: u64,
    pub youtube: u64,
    pub forms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_notes: u64,
    pub total_youtube_links: u64,
    pub total_form_links: u64,
    pub total_subjects: u64,
    pub total_links: u64,
    pub user_roles: RoleCounts,
    pub content_distribution: ContentDistribution,
}

/// Decode a batch, skipping documents that fail to decode
pub fn decode_all<T>(docs: Vec<Document>) -> Vec<T>
where
    T: TryFrom<Document, Error = AdminError>,
{
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match T::try_from(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Skipping malformed document {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

impl Identified for User {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Note {
    fn id(&self) -> &str {
        &self.note_id
    }
}

impl Identified for AdminLink {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Subject {
    fn id(&self) -> &str {
        &self.subject_id
    }
}
