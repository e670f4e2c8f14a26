//! Admin API 请求/响应类型

use serde::{Deserialize, Serialize};

use crate::pagination::Selection;
use crate::services::{BulkFailure, BulkOutcome, LinkRef, NoteRef};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersBulkDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotesBulkDeleteRequest {
    pub notes: Vec<NoteRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinksBulkDeleteRequest {
    pub links: Vec<LinkRef>,
}

/// 批量操作响应
///
/// `remainingSelection` 只包含失败的 id，全部成功时为空。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponse {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
    pub partial_failure: bool,
    pub remaining_selection: Selection,
    pub summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orphaned_file_ids: Vec<String>,
}

impl BulkResponse {
    pub fn new(outcome: BulkOutcome, mut selection: Selection, noun: &str) -> Self {
        selection.retain_failed(outcome.failed_ids());
        Self {
            partial_failure: outcome.is_partial_failure(),
            summary: outcome.summary(noun),
            remaining_selection: selection,
            succeeded: outcome.succeeded,
            failed: outcome.failed,
            orphaned_file_ids: Vec::new(),
        }
    }

    pub fn with_orphaned_files(mut self, file_ids: Vec<String>) -> Self {
        self.orphaned_file_ids = file_ids;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDeleteQuery {
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkTypeQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevicePeriodQuery {
    pub period: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// 手动失效：`entity` 缺省或为 "all" 时失效全部
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateRequest {
    #[serde(default)]
    pub entity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AdminError;

    #[test]
    fn test_bulk_response_keeps_failed_selection() {
        let (outcome, _) = BulkOutcome::from_results::<()>(vec![
            ("a".into(), Ok(())),
            ("b".into(), Err(AdminError::database_service("down"))),
        ]);
        let resp = BulkResponse::new(outcome, Selection::new(["a", "b"]), "users");
        assert!(resp.partial_failure);
        assert_eq!(resp.remaining_selection, Selection::new(["b"]));

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["remainingSelection"], serde_json::json!(["b"]));
        assert_eq!(json["failed"][0]["reason"], "down");
        assert!(json.get("orphanedFileIds").is_none());
    }
}
