//! Read deduplication and mutation-driven invalidation

mod common;

use std::sync::atomic::Ordering;

use common::TestEnv;
use futures_util::future::join_all;
use studystack_admin::cache::{Entity, QueryFamily, QueryKey, RULES};
use studystack_admin::errors::AdminError;
use studystack_admin::pagination::{NoteFilter, PageRequest, SubjectFilter, UserFilter};
use studystack_admin::services::{NewUser, SubjectInput};

fn users_key() -> QueryKey {
    QueryKey::Users(UserFilter::default(), PageRequest::default())
}

fn notes_key() -> QueryKey {
    QueryKey::Notes(NoteFilter::default(), PageRequest::default())
}

fn subject_input(name: &str) -> SubjectInput {
    SubjectInput {
        name: name.into(),
        abbreviation: "DS".into(),
        code: "CS301".into(),
        semester: "3".into(),
        unit: vec!["1".into(), " ".into()],
    }
}

#[tokio::test]
async fn test_concurrent_identical_reads_share_one_call() {
    let env = TestEnv::new();
    env.add_user("u1", 1, "Asha", "student");

    let reads = (0..8).map(|_| env.admin.list_users(UserFilter::default(), PageRequest::default()));
    let results = join_all(reads).await;

    assert!(results.iter().all(|r| matches!(r, Ok(page) if page.total == 1)));
    assert_eq!(env.store.list_count(), 1);
}

#[tokio::test]
async fn test_distinct_keys_fetch_independently() {
    let env = TestEnv::new();
    env.add_user("u1", 1, "Asha", "student");

    env.admin
        .list_users(UserFilter::default(), PageRequest::for_page(0, Some(5)))
        .await
        .unwrap();
    env.admin
        .list_users(UserFilter::default(), PageRequest::for_page(1, Some(5)))
        .await
        .unwrap();
    env.admin
        .list_users(UserFilter::default(), PageRequest::for_page(0, Some(5)))
        .await
        .unwrap();

    assert_eq!(env.store.list_count(), 2);
}

#[tokio::test]
async fn test_user_mutation_invalidates_declared_families_only() {
    let env = TestEnv::new();
    env.add_user("u1", 1, "Asha", "teacher");
    env.add_user("u2", 2, "Ravi", "student");
    env.add_note("n1", 1, "Sets", "f1", "Asha");

    env.admin
        .list_users(UserFilter::default(), PageRequest::default())
        .await
        .unwrap();
    env.admin
        .list_notes(NoteFilter::default(), PageRequest::default())
        .await
        .unwrap();
    env.admin.link_filter_options().await.unwrap();
    env.admin.dashboard_stats().await.unwrap();
    assert!(env.cache.contains(&users_key()));
    assert!(env.cache.contains(&QueryKey::DashboardStats));

    env.admin.delete_user("u2").await.unwrap();

    assert!(!env.cache.contains(&users_key()));
    assert!(!env.cache.contains(&QueryKey::LinksFilterOptions));
    assert!(!env.cache.contains(&QueryKey::DashboardStats));
    assert!(env.cache.contains(&notes_key()));

    let page = env
        .admin
        .list_users(UserFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_failed_mutation_keeps_cache() {
    let env = TestEnv::new();
    env.add_user("u1", 1, "Asha", "student");
    env.admin
        .list_users(UserFilter::default(), PageRequest::default())
        .await
        .unwrap();

    let err = env.admin.delete_user("missing").await.unwrap_err();
    assert!(matches!(err, AdminError::NotFound(_)));
    assert!(env.cache.contains(&users_key()));
    assert_eq!(env.cache.generation(QueryFamily::AdminUsers), 0);
}

#[tokio::test]
async fn test_upstream_failure_is_not_cached() {
    let env = TestEnv::new();
    env.add_user("u1", 1, "Asha", "student");
    env.store.set_unavailable(true);

    let err = env
        .admin
        .list_users(UserFilter::default(), PageRequest::default())
        .await
        .unwrap_err();
    assert!(err.is_upstream());
    assert!(!env.cache.contains(&users_key()));

    env.store.set_unavailable(false);
    let page = env
        .admin
        .list_users(UserFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_subject_mutation_pushes_revalidation_tag() {
    let env = TestEnv::new();
    env.admin
        .list_subjects(SubjectFilter::default(), PageRequest::default())
        .await
        .unwrap();

    let created = env.admin.create_subject(subject_input("Data Structures")).await.unwrap();
    assert_eq!(created.unit, vec!["1"]);
    assert_eq!(env.revalidator.tags(), vec!["subjects"]);
    assert!(
        !env.cache
            .contains(&QueryKey::Subjects(SubjectFilter::default(), PageRequest::default()))
    );

    // Revalidation failures never fail the mutation
    env.revalidator.set_failing(true);
    env.admin
        .update_subject(&created.subject_id, subject_input("Data Structures II"))
        .await
        .unwrap();
    assert_eq!(env.revalidator.tags().len(), 2);
}

#[tokio::test]
async fn test_only_subject_rule_has_a_tag() {
    let env = TestEnv::new();
    env.add_user("u1", 1, "Asha", "student");
    env.admin.delete_user("u1").await.unwrap();
    assert!(env.revalidator.tags().is_empty());

    let tagged: Vec<Entity> = RULES
        .iter()
        .filter(|r| r.revalidate_tag.is_some())
        .map(|r| r.entity)
        .collect();
    assert_eq!(tagged, vec![Entity::Subject]);
}

#[tokio::test]
async fn test_registration_conflict_and_invalidation() {
    let env = TestEnv::new();
    env.add_user("u1", 1, "Asha", "student");
    env.admin
        .list_users(UserFilter::default(), PageRequest::default())
        .await
        .unwrap();

    let duplicate = NewUser {
        prn_no: "0000000001".into(),
        name: "Someone".into(),
        email: "other@example.com".into(),
        password: "longenough".into(),
        role: "student".into(),
    };
    let err = env.admin.register_user(duplicate).await.unwrap_err();
    assert!(matches!(err, AdminError::Conflict(_)));
    assert!(env.cache.contains(&users_key()));

    let fresh = NewUser {
        prn_no: "9876543210".into(),
        name: "Meera".into(),
        email: "meera@example.com".into(),
        password: "longenough".into(),
        role: "teacher".into(),
    };
    let user = env.admin.register_user(fresh).await.unwrap();
    assert_eq!(user.name, "Meera");
    assert!(!env.cache.contains(&users_key()));

    let stored = env.store.get("users", &user.id).unwrap();
    let hash = stored.string("password").unwrap();
    assert!(hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_csv_import_skips_only_rows_clashing_with_kept_rows() {
    let env = TestEnv::new();
    let csv = "prnNo,name,email,password,role\n\
               1111111111,Asha,a@x.io,pw,student\n\
               2222222222,Ravi,a@x.io,pw,student\n\
               2222222222,Ravi,c@x.io,pw,student\n";

    let outcome = env.admin.import_users_csv(csv).await.unwrap();
    assert_eq!(outcome.created_count, 2);
    assert_eq!(outcome.skipped, 1);
    assert!(outcome.failed.is_empty());

    let mut emails: Vec<String> = env
        .store
        .ids("users")
        .iter()
        .filter_map(|id| env.store.get("users", id)?.string("email"))
        .collect();
    emails.sort();
    assert_eq!(emails, vec!["a@x.io", "c@x.io"]);
}

#[tokio::test]
async fn test_manual_invalidation() {
    let env = TestEnv::new();
    env.admin
        .list_notes(NoteFilter::default(), PageRequest::default())
        .await
        .unwrap();
    env.admin.semester_options().await.unwrap();

    env.admin.invalidate(Some(Entity::Link)).await;
    assert!(env.cache.contains(&notes_key()));

    env.admin.invalidate(None).await;
    assert!(!env.cache.contains(&notes_key()));
    assert!(!env.cache.contains(&QueryKey::SemesterOptions));
    assert_eq!(env.functions.calls.load(Ordering::SeqCst), 0);
}
