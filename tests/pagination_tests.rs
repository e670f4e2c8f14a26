//! Infinite pagination over the service layer
//!
//! Pages are fetched through `AdminService` from the in-memory store and
//! accumulated with `InfiniteList`, the same way the CLI export does.

mod common;

use std::collections::HashSet;

use common::TestEnv;
use studystack_admin::pagination::{
    Identified, InfiniteList, LinkFilter, ListParams, PageRequest, SubjectFilter, UserFilter,
};
use studystack_admin::storage::models::{LinkKind, Role, User};

fn seed_users(env: &TestEnv, n: i64) {
    for i in 0..n {
        let role = if i % 3 == 0 { "teacher" } else { "student" };
        env.add_user(&format!("u{:02}", i), i, &format!("User {}", i), role);
    }
}

async fn drain_users(env: &TestEnv, list: &mut InfiniteList<UserFilter, User>) {
    while list
        .fetch_next(|filter, page| env.admin.list_users(filter, page))
        .await
        .unwrap()
    {
        let ids: HashSet<&str> = list.items().iter().map(|u| u.id()).collect();
        assert_eq!(ids.len(), list.fetched_count(), "duplicate ids after a page");
    }
}

#[tokio::test]
async fn test_pages_reconstruct_full_list_newest_first() {
    let env = TestEnv::new();
    seed_users(&env, 23);

    let mut list = InfiniteList::new(UserFilter::default(), 5);
    drain_users(&env, &mut list).await;

    assert_eq!(list.pages_loaded(), 5);
    assert_eq!(list.total(), Some(23));
    let items = list.items();
    assert_eq!(items.len(), 23);
    assert_eq!(items.first().map(|u| u.id.as_str()), Some("u22"));
    assert_eq!(items.last().map(|u| u.id.as_str()), Some("u00"));
    assert!(!list.has_next_page());
}

#[tokio::test]
async fn test_every_filter_combination_has_no_duplicates() {
    let env = TestEnv::new();
    seed_users(&env, 17);

    for role in [None, Some(Role::Teacher), Some(Role::Student), Some(Role::Admin)] {
        for search in [None, Some("User 1".to_string())] {
            for limit in [1, 3, 10] {
                let filter = UserFilter {
                    search: search.clone(),
                    role,
                };
                let mut list = InfiniteList::new(filter, limit);
                drain_users(&env, &mut list).await;
                assert_eq!(list.items().len() as u64, list.total().unwrap_or(0));
            }
        }
    }
}

#[tokio::test]
async fn test_filter_change_resets_to_first_page() {
    let env = TestEnv::new();
    seed_users(&env, 12);

    let mut list = InfiniteList::new(UserFilter::default(), 4);
    for _ in 0..2 {
        list.fetch_next(|f, p| env.admin.list_users(f, p))
            .await
            .unwrap();
    }
    assert_eq!(list.fetched_count(), 8);

    let teachers = UserFilter {
        search: None,
        role: Some(Role::Teacher),
    };
    assert!(list.set_filter(teachers.clone()));
    assert_eq!(list.pages_loaded(), 0);

    list.fetch_next(|f, p| env.admin.list_users(f, p))
        .await
        .unwrap();
    let first_page = env
        .admin
        .list_users(teachers, PageRequest::for_page(0, Some(4)))
        .await
        .unwrap();

    let accumulated: Vec<&str> = list.items().iter().map(|u| u.id()).collect();
    let expected: Vec<&str> = first_page.documents.iter().map(|u| u.id()).collect();
    assert_eq!(accumulated, expected);
}

#[tokio::test]
async fn test_late_page_for_old_filter_is_dropped() {
    let env = TestEnv::new();
    seed_users(&env, 6);

    let old = UserFilter::default();
    let mut list = InfiniteList::new(old.clone(), 3);
    let late = env
        .admin
        .list_users(old, PageRequest::for_page(0, Some(3)))
        .await
        .unwrap();

    list.set_filter(UserFilter {
        search: Some("User 5".into()),
        role: None,
    });
    assert!(!list.append(&UserFilter::default(), late));
    assert!(list.items().is_empty());
}

#[tokio::test]
async fn test_subjects_ordered_by_semester_then_name() {
    let env = TestEnv::new();
    env.add_subject("s1", "Networks", "4");
    env.add_subject("s2", "Algebra", "1");
    env.add_subject("s3", "Databases", "4");
    env.add_subject("s4", "Calculus", "1");

    let mut list = InfiniteList::new(SubjectFilter::default(), 3);
    while list
        .fetch_next(|f, p| env.admin.list_subjects(f, p))
        .await
        .unwrap()
    {}

    let names: Vec<&str> = list.items().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Algebra", "Calculus", "Databases", "Networks"]);

    let params = ListParams {
        semester_filter: Some("4".into()),
        ..Default::default()
    };
    let page = env
        .admin
        .list_subjects(SubjectFilter::from_params(&params), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_merged_links_page_through_both_collections() {
    let env = TestEnv::new();
    for i in 0..7 {
        env.add_link("youtube", &format!("y{}", i), i * 2, "Lecture", "Asha");
    }
    for i in 0..5 {
        env.add_link("forms", &format!("f{}", i), i * 2 + 1, "Quiz", "Ravi");
    }

    let mut list = InfiniteList::new(LinkFilter::default(), 4);
    while list
        .fetch_next(|f, p| env.admin.list_links(f, p))
        .await
        .unwrap()
    {}

    let items = list.items();
    assert_eq!(list.total(), Some(12));
    assert_eq!(items.len(), 12);
    let created: Vec<&str> = items.iter().map(|l| l.created_at.as_str()).collect();
    let mut sorted = created.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(created, sorted);

    let forms_only = LinkFilter {
        kind: Some(LinkKind::Form),
        ..Default::default()
    };
    let page = env
        .admin
        .list_links(forms_only, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert!(page.documents.iter().all(|l| l.kind == LinkKind::Form));
}
