//! Link management
//!
//! YouTube links and form links live in two collections. With no type filter
//! both are fetched and merged by recency.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::admin::AdminService;
use super::bulk::{BulkItem, BulkOutcome, run_bulk};
use crate::cache::{Entity, QueryKey};
use crate::errors::{AdminError, Result};
use crate::pagination::{LinkFilter, Page, PageRequest};
use crate::storage::models::{AdminLink, FormType, LinkKind, Role};
use crate::storage::{CREATED_AT, Query};
use crate::utils::time::parse_timestamp_utc;
use crate::utils::validation::{FieldErrors, require, validate_link_url};

/// Teacher names offered in the links "created by" filter
const TEACHER_OPTIONS_LIMIT: u64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkFilterOptions {
    pub teacher_options: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkUpdate {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub form_type: Option<FormType>,
}

impl LinkUpdate {
    pub fn validate(&self, kind: LinkKind) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check("title", require(&self.title, "Title is required"));
        errors.check("url", validate_link_url(&self.url));
        if kind == LinkKind::Form && self.form_type.is_none() {
            errors.check("formType", Err("Form type is required".to_string()));
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

impl BulkItem for LinkRef {
    fn bulk_id(&self) -> String {
        self.id.clone()
    }
}

/// Newest first, ties by id; unparseable timestamps sort last
fn by_recency(a: &AdminLink, b: &AdminLink) -> Ordering {
    let a_time = parse_timestamp_utc(&a.created_at);
    let b_time = parse_timestamp_utc(&b.created_at);
    match (a_time, b_time) {
        (Some(a_time), Some(b_time)) => b_time.cmp(&a_time),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

/// Merge both collections' leading windows and cut out the requested page
///
/// Each input must hold the first `offset + limit` records of its collection
/// in recency order.
pub fn merge_by_recency(mut links: Vec<AdminLink>, page: PageRequest) -> Vec<AdminLink> {
    links.sort_by(by_recency);
    links
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

impl AdminService {
    fn link_collection(&self, kind: LinkKind) -> &str {
        match kind {
            LinkKind::Youtube => &self.collections().youtube,
            LinkKind::Form => &self.collections().forms,
        }
    }

    pub async fn list_links(
        &self,
        filter: LinkFilter,
        page: PageRequest,
    ) -> Result<Page<AdminLink>> {
        let key = QueryKey::Links(filter.clone(), page);
        self.cache
            .get_or_fetch(key, || self.fetch_links(filter, page))
            .await
    }

    async fn fetch_links(&self, filter: LinkFilter, page: PageRequest) -> Result<Page<AdminLink>> {
        match filter.kind {
            Some(kind) => self.fetch_link_kind(kind, &filter, page.limit, page.offset).await,
            None => {
                let window = page.offset.saturating_add(page.limit);
                let (youtube, forms) = tokio::try_join!(
                    self.fetch_link_kind(LinkKind::Youtube, &filter, window, 0),
                    self.fetch_link_kind(LinkKind::Form, &filter, window, 0),
                )?;
                let total = youtube.total + forms.total;
                let mut links = youtube.documents;
                links.extend(forms.documents);
                Ok(Page::new(merge_by_recency(links, page), total))
            }
        }
    }

    async fn fetch_link_kind(
        &self,
        kind: LinkKind,
        filter: &LinkFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<AdminLink>> {
        let mut queries = vec![
            Query::order_desc(CREATED_AT),
            Query::limit(limit),
            Query::offset(offset),
        ];
        if let Some(search) = &filter.search {
            queries.push(Query::search("title", search));
        }
        if let Some(teacher) = &filter.teacher {
            queries.push(Query::equal("createdBy", teacher.as_str()));
        }

        let list = self
            .store()
            .list_documents(self.link_collection(kind), &queries)
            .await?;
        let links = list
            .documents
            .into_iter()
            .map(|doc| AdminLink::from_document(doc, kind))
            .collect();
        Ok(Page::new(links, list.total))
    }

    /// Distinct, sorted teacher names
    pub async fn link_filter_options(&self) -> Result<LinkFilterOptions> {
        self.cache
            .get_or_fetch(QueryKey::LinksFilterOptions, || async {
                let queries = [
                    Query::equal("role", Role::Teacher.as_ref()),
                    Query::limit(TEACHER_OPTIONS_LIMIT),
                    Query::select(&["$id", "name"]),
                ];
                let list = self
                    .store()
                    .list_documents(&self.collections().users, &queries)
                    .await?;

                let mut teacher_options: Vec<String> = list
                    .documents
                    .iter()
                    .filter_map(|doc| doc.string("name"))
                    .filter(|name| !name.trim().is_empty())
                    .collect();
                teacher_options.sort();
                teacher_options.dedup();
                Ok(LinkFilterOptions { teacher_options })
            })
            .await
    }

    pub async fn update_link(
        &self,
        id: &str,
        kind: LinkKind,
        update: LinkUpdate,
    ) -> Result<AdminLink> {
        update.validate(kind)?;

        let mut data = json!({
            "title": update.title.trim(),
            "url": update.url.trim(),
        });
        if let (LinkKind::Form, Some(form_type)) = (kind, update.form_type) {
            data["formType"] = form_type.as_ref().into();
        }

        let doc = self
            .store()
            .update_document(self.link_collection(kind), id, data)
            .await?;
        info!("Updated {} link {}", kind, id);
        self.committed(Entity::Link).await;
        Ok(AdminLink::from_document(doc, kind))
    }

    pub async fn delete_link(&self, id: &str, kind: LinkKind) -> Result<()> {
        self.store()
            .delete_document(self.link_collection(kind), id)
            .await?;
        info!("Deleted {} link {}", kind, id);
        self.committed(Entity::Link).await;
        Ok(())
    }

    pub async fn bulk_delete_links(&self, links: Vec<LinkRef>) -> BulkOutcome {
        let results = run_bulk(links, self.bulk_concurrency(), |link| async move {
            self.store()
                .delete_document(self.link_collection(link.kind), &link.id)
                .await
        })
        .await;

        let (outcome, _) = BulkOutcome::from_results(results);
        for failure in &outcome.failed {
            warn!("Bulk delete of link {} failed: {}", failure.id, failure.reason);
        }
        if outcome.any_succeeded() {
            self.committed(Entity::Link).await;
        }
        outcome
    }
}

/// Parse the `type` query parameter of single-link routes
pub fn parse_link_kind(raw: Option<&str>) -> Result<LinkKind> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        AdminError::validation("type: Link type is required (youtube or form)")
    })?;
    raw.parse()
        .map_err(|_| AdminError::validation(format!("type: Unknown link type '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str, created_at: &str, kind: LinkKind) -> AdminLink {
        AdminLink {
            id: id.into(),
            title: id.into(),
            url: format!("https://example.com/{}", id),
            created_by: "T".into(),
            abbreviation: String::new(),
            semester: "1".into(),
            created_at: created_at.into(),
            kind,
            form_type: None,
        }
    }

    #[test]
    fn test_merge_orders_across_collections() {
        let links = vec![
            link("y1", "2024-03-01T00:00:00.000+00:00", LinkKind::Youtube),
            link("y2", "2024-01-01T00:00:00.000+00:00", LinkKind::Youtube),
            link("f1", "2024-02-01T00:00:00.000+00:00", LinkKind::Form),
            link("f2", "2023-12-01T00:00:00.000+00:00", LinkKind::Form),
        ];

        let first = merge_by_recency(links.clone(), PageRequest::for_page(0, Some(2)));
        let ids: Vec<&str> = first.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["y1", "f1"]);

        let second = merge_by_recency(links, PageRequest::for_page(1, Some(2)));
        let ids: Vec<&str> = second.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["y2", "f2"]);
    }

    #[test]
    fn test_merge_ties_by_id() {
        let ts = "2024-01-01T00:00:00Z";
        let links = vec![link("b", ts, LinkKind::Form), link("a", ts, LinkKind::Youtube)];
        let merged = merge_by_recency(links, PageRequest::default());
        assert_eq!(merged[0].id, "a");
    }

    #[test]
    fn test_merge_offset_timezones() {
        let links = vec![
            link("late", "2024-01-01T11:00:00+05:30", LinkKind::Youtube),
            link("early", "2024-01-01T05:00:00Z", LinkKind::Form),
        ];
        let merged = merge_by_recency(links, PageRequest::default());
        assert_eq!(merged[0].id, "late");
    }

    #[test]
    fn test_form_update_requires_form_type() {
        let update = LinkUpdate {
            title: "Quiz".into(),
            url: "https://forms.gle/abc".into(),
            form_type: None,
        };
        assert!(update.validate(LinkKind::Youtube).is_ok());
        let err = update.validate(LinkKind::Form).unwrap_err();
        assert!(err.message().contains("formType"));
    }

    #[test]
    fn test_parse_link_kind() {
        assert_eq!(parse_link_kind(Some("form")).unwrap(), LinkKind::Form);
        assert!(parse_link_kind(None).is_err());
        assert!(parse_link_kind(Some("video")).is_err());
    }
}
