//! Dashboard data
//!
//! Entity counts are eight independent `limit(1)` list calls run together;
//! only their totals are used.

use tracing::debug;

use super::admin::AdminService;
use crate::cache::QueryKey;
use crate::errors::{AdminError, Result};
use crate::storage::Query;
use crate::storage::models::{
    ActivityItem, ContentDistribution, DashboardStats, Role, RoleCounts, TeacherContribution,
};

impl AdminService {
    async fn count(&self, collection: &str, role: Option<Role>) -> Result<u64> {
        let mut queries = vec![Query::limit(1)];
        if let Some(role) = role {
            queries.push(Query::equal("role", role.as_ref()));
        }
        Ok(self.store().list_documents(collection, &queries).await?.total)
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.cache
            .get_or_fetch(QueryKey::DashboardStats, || async {
                let c = self.collections();
                let (users, notes, youtube, forms, subjects, students, teachers, admins) =
                    tokio::try_join!(
                        self.count(&c.users, None),
                        self.count(&c.notes, None),
                        self.count(&c.youtube, None),
                        self.count(&c.forms, None),
                        self.count(&c.subjects, None),
                        self.count(&c.users, Some(Role::Student)),
                        self.count(&c.users, Some(Role::Teacher)),
                        self.count(&c.users, Some(Role::Admin)),
                    )?;
                debug!("Dashboard counts: {} users, {} notes", users, notes);

                Ok(DashboardStats {
                    total_users: users,
                    total_notes: notes,
                    total_youtube_links: youtube,
                    total_form_links: forms,
                    total_subjects: subjects,
                    total_links: youtube + forms,
                    user_roles: RoleCounts {
                        students,
                        teachers,
                        admins,
                    },
                    content_distribution: ContentDistribution {
                        notes,
                        youtube,
                        forms,
                    },
                })
            })
            .await
    }

    /// Feed produced by the recent-activity function
    pub async fn recent_activity(&self) -> Result<Vec<ActivityItem>> {
        self.cache
            .get_or_fetch(QueryKey::RecentActivity, || async {
                let value = self
                    .backends
                    .functions
                    .execute(&self.settings.activity_function_id)
                    .await?;
                serde_json::from_value(value).map_err(|e| {
                    AdminError::function_execution(format!(
                        "Unexpected recent activity payload: {}",
                        e
                    ))
                })
            })
            .await
    }

    /// Precomputed per-teacher upload counts, empty until first generated
    pub async fn teacher_contributions(&self) -> Result<Vec<TeacherContribution>> {
        self.cache
            .get_or_fetch(QueryKey::TeacherContributions, || async {
                let doc_id = self.settings.stats_document_id.clone();
                match self.precomputed(&doc_id).await? {
                    Some(value) => serde_json::from_value(value).map_err(|e| {
                        AdminError::database_service(format!(
                            "Malformed teacher contributions document: {}",
                            e
                        ))
                    }),
                    None => Ok(Vec::new()),
                }
            })
            .await
    }
}
