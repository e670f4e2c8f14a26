//! User management
//!
//! Registration, update, deletion and CSV import. Passwords are hashed with
//! Argon2id before they reach the database and never leave it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::admin::AdminService;
use super::bulk::{BulkFailure, BulkItem, BulkOutcome, run_bulk};
use crate::cache::{Entity, QueryKey};
use crate::errors::{AdminError, Result};
use crate::pagination::{Page, PageRequest, UserFilter};
use crate::storage::models::{Role, User, decode_all};
use crate::storage::{CREATED_AT, Query};
use crate::utils::csv_handler::parse_user_csv;
use crate::utils::password::{hash_if_present, hash_password};
use crate::utils::validation::{
    FieldErrors, MIN_PASSWORD_LENGTH, require, validate_email, validate_password, validate_prn,
};

fn validate_role(role: &str) -> std::result::Result<(), String> {
    role.parse::<Role>()
        .map(|_| ())
        .map_err(|_| "Role must be one of admin, teacher or student".to_string())
}

/// A user to be created, from the register form or a CSV row
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub prn_no: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

impl NewUser {
    /// Field-level checks; CSV rows only require a non-empty password
    pub fn field_errors(&self, min_password_len: usize) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.check("prnNo", validate_prn(&self.prn_no));
        errors.check("name", require(&self.name, "Name is required"));
        errors.check("email", validate_email(&self.email));
        errors.check("password", validate_password(&self.password, min_password_len));
        errors.check("role", validate_role(&self.role));
        errors
    }

    pub fn validate(&self) -> Result<Role> {
        self.field_errors(MIN_PASSWORD_LENGTH).into_result()?;
        self.role
            .parse()
            .map_err(|_| AdminError::validation("role: invalid role"))
    }
}

impl BulkItem for NewUser {
    fn bulk_id(&self) -> String {
        self.prn_no.clone()
    }
}

/// Profile changes; an absent or empty password keeps the stored hash
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub prn_no: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check("prnNo", validate_prn(&self.prn_no));
        errors.check("name", require(&self.name, "Name is required"));
        errors.check("email", validate_email(&self.email));
        errors.check("role", validate_role(&self.role));
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            errors.check("password", validate_password(password, MIN_PASSWORD_LENGTH));
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub created_count: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<BulkFailure>,
}

impl AdminService {
    pub async fn list_users(&self, filter: UserFilter, page: PageRequest) -> Result<Page<User>> {
        let key = QueryKey::Users(filter.clone(), page);
        self.cache
            .get_or_fetch(key, || self.fetch_users(filter, page))
            .await
    }

    async fn fetch_users(&self, filter: UserFilter, page: PageRequest) -> Result<Page<User>> {
        let mut queries = vec![
            Query::order_desc(CREATED_AT),
            Query::limit(page.limit),
            Query::offset(page.offset),
        ];
        if let Some(search) = &filter.search {
            queries.push(Query::search("name", search));
        }
        if let Some(role) = filter.role {
            queries.push(Query::equal("role", role.as_ref()));
        }

        let list = self
            .store()
            .list_documents(&self.collections().users, &queries)
            .await?;
        Ok(Page::new(decode_all(list.documents), list.total))
    }

    /// True when a user with this PRN or email already exists
    async fn user_exists(&self, prn_no: &str, email: &str) -> Result<bool> {
        let queries = [
            Query::or(vec![
                Query::equal("prnNo", prn_no),
                Query::equal("email", email),
            ]),
            Query::limit(1),
        ];
        let list = self
            .store()
            .list_documents(&self.collections().users, &queries)
            .await?;
        Ok(list.total > 0 || !list.documents.is_empty())
    }

    /// Create one user without touching the cache
    async fn create_user(&self, user: &NewUser, role: Role) -> Result<User> {
        let password = hash_password(&user.password)?;
        let doc = self
            .store()
            .create_document(
                &self.collections().users,
                json!({
                    "prnNo": user.prn_no,
                    "name": user.name.trim(),
                    "email": user.email,
                    "password": password,
                    "role": role.as_ref(),
                }),
            )
            .await?;
        User::try_from(doc)
    }

    pub async fn register_user(&self, user: NewUser) -> Result<User> {
        let role = user.validate()?;
        if self.user_exists(&user.prn_no, &user.email).await? {
            return Err(AdminError::conflict(
                "A user with this PRN or email already exists",
            ));
        }

        let created = self.create_user(&user, role).await?;
        info!("Registered user {} ({})", created.id, role);
        self.committed(Entity::User).await;
        Ok(created)
    }

    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User> {
        update.validate()?;

        let mut data = json!({
            "prnNo": update.prn_no,
            "name": update.name.trim(),
            "email": update.email,
            "role": update.role,
        });
        if let Some(hash) = hash_if_present(update.password.as_deref())? {
            data["password"] = hash.into();
        }

        let doc = self
            .store()
            .update_document(&self.collections().users, id, data)
            .await?;
        info!("Updated user {}", id);
        self.committed(Entity::User).await;
        User::try_from(doc)
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        self.store()
            .delete_document(&self.collections().users, id)
            .await?;
        info!("Deleted user {}", id);
        self.committed(Entity::User).await;
        Ok(())
    }

    pub async fn bulk_delete_users(&self, ids: Vec<String>) -> BulkOutcome {
        let collection = self.collections().users.clone();
        let results = run_bulk(ids, self.bulk_concurrency(), |id| {
            let collection = collection.clone();
            async move { self.store().delete_document(&collection, &id).await }
        })
        .await;

        let (outcome, _) = BulkOutcome::from_results(results);
        for failure in &outcome.failed {
            warn!("Bulk delete of user {} failed: {}", failure.id, failure.reason);
        }
        if outcome.any_succeeded() {
            self.committed(Entity::User).await;
        }
        outcome
    }

    /// Import users from CSV text
    ///
    /// Every row is validated before anything is written. Rows that match an
    /// existing user, or an earlier row of the same file, are skipped.
    pub async fn import_users_csv(&self, content: &str) -> Result<ImportOutcome> {
        let rows = parse_user_csv(content)?;
        let total = rows.len();

        // 只有保留的行才登记 prnNo 和邮箱
        let mut seen_prns = HashSet::new();
        let mut seen_emails = HashSet::new();
        let unique: Vec<NewUser> = rows
            .into_iter()
            .filter(|u| {
                let email = u.email.to_lowercase();
                if seen_prns.contains(&u.prn_no) || seen_emails.contains(&email) {
                    return false;
                }
                seen_prns.insert(u.prn_no.clone());
                seen_emails.insert(email);
                true
            })
            .collect();
        let mut skipped = total - unique.len();

        let results = run_bulk(unique, self.bulk_concurrency(), |user| async move {
            if self.user_exists(&user.prn_no, &user.email).await? {
                info!("Skipping duplicate user {} / {}", user.email, user.prn_no);
                return Ok(false);
            }
            let role = user
                .role
                .parse()
                .map_err(|_| AdminError::validation("role: invalid role"))?;
            self.create_user(&user, role).await.map(|_| true)
        })
        .await;

        let (outcome, created) = BulkOutcome::from_results(results);
        let created_count = created.iter().filter(|c| **c).count();
        skipped += created.len() - created_count;

        if created_count > 0 {
            self.committed(Entity::User).await;
        }
        info!(
            "CSV import finished: {} created, {} skipped, {} failed",
            created_count,
            skipped,
            outcome.failed.len()
        );

        Ok(ImportOutcome {
            created_count,
            skipped,
            failed: outcome.failed,
        })
    }
}
