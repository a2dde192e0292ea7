use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

use quire_core::domain::{Post, PostFields, Tag};
use quire_core::error::RepoError;
use quire_core::ports::{BaseRepository, PostRepository, TagRepository};

use crate::database::entity::{post, post_tag, tag};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresTagRepository};

fn post_model(id: i64, user_id: i64, slug: &str) -> post::Model {
    let now = chrono::Utc::now();
    post::Model {
        id,
        user_id,
        category_id: 1,
        title: "Hello".to_owned(),
        slug: slug.to_owned(),
        creator: "Bob".to_owned(),
        description: "x".to_owned(),
        image: None,
        date_creation: "2020-01-01".to_owned(),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn link(post_id: i64, tag_id: i64) -> post_tag::Model {
    post_tag::Model { post_id, tag_id }
}

fn fields(tags: &[i64]) -> PostFields {
    PostFields {
        title: "Hello".to_owned(),
        slug: "hello".to_owned(),
        category_id: 1,
        creator: "Bob".to_owned(),
        description: "x".to_owned(),
        image: None,
        date_creation: "2020-01-01".to_owned(),
        tag_ids: tags.iter().copied().collect(),
    }
}

fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

#[tokio::test]
async fn test_find_post_by_id_loads_tags() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(1, 5, "hello")]])
        .append_query_results([vec![link(1, 1), link(1, 2)]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let post: Post = repo.find_by_id(1).await.unwrap().unwrap();

    assert_eq!(post.title, "Hello");
    assert_eq!(post.user_id, 5);
    assert_eq!(post.tag_ids, BTreeSet::from([1, 2]));
}

#[tokio::test]
async fn test_find_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    assert!(repo.find_by_id(42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_paginate_reports_total_and_tags() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[BTreeMap::from([(
            "num_items",
            Value::BigInt(Some(31)),
        )])]])
        .append_query_results([vec![post_model(31, 5, "last")]])
        .append_query_results([vec![link(31, 4)]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let page = repo.paginate(Some(5), 2, 30).await.unwrap();

    assert_eq!(page.total, 31);
    assert_eq!(page.page, 2);
    assert_eq!(page.last_page(), 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].tag_ids, BTreeSet::from([4]));
}

#[tokio::test]
async fn test_create_attaches_tags() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(7, 5, "hello")]])
        .append_exec_results([exec(2)])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let post = repo.create(5, fields(&[1, 2])).await.unwrap();

    assert_eq!(post.id, 7);
    assert_eq!(post.user_id, 5);
    assert_eq!(post.tag_ids, BTreeSet::from([1, 2]));
}

#[tokio::test]
async fn test_delete_detaches_then_removes() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec(2), exec(1)])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    assert!(repo.delete(1).await.is_ok());
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec(0), exec(0)])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    assert!(matches!(repo.delete(1).await, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_existing_tag_ids() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[BTreeMap::from([("id", Value::BigInt(Some(1)))])]])
        .into_connection();

    let repo = PostgresTagRepository::new(Arc::new(db));

    let known = repo.existing_ids(&BTreeSet::from([1, 99])).await.unwrap();
    assert_eq!(known, BTreeSet::from([1]));
}

#[tokio::test]
async fn test_all_tags() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            tag::Model {
                id: 1,
                name: "rust".to_owned(),
            },
            tag::Model {
                id: 2,
                name: "web".to_owned(),
            },
        ]])
        .into_connection();

    let repo = PostgresTagRepository::new(Arc::new(db));

    let tags: Vec<Tag> = repo.all().await.unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[1].name, "web");
}

#[tokio::test]
async fn test_update_syncs_tags_within_transaction() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post_model(1, 5, "hello")]])
            .append_query_results([vec![link(1, 1), link(1, 2)]])
            .append_query_results([vec![post_model(1, 5, "hello")]])
            .append_exec_results([exec(2), exec(1)])
            .into_connection(),
    );

    let repo = PostgresPostRepository::new(Arc::clone(&db));
    let post = repo.update(1, fields(&[3])).await.unwrap();
    drop(repo);

    assert_eq!(post.tag_ids, BTreeSet::from([3]));

    let Ok(db) = Arc::try_unwrap(db) else {
        panic!("connection still shared");
    };
    let log = db.into_transaction_log();
    let statements: Vec<_> = log.iter().flat_map(|txn| txn.statements()).collect();

    let detach = statements
        .iter()
        .find(|stmt| stmt.sql.starts_with(r#"DELETE FROM "post_tag""#))
        .expect("detach statement");
    assert!(detach.sql.contains(r#""tag_id" IN"#));
    assert_eq!(
        detach.values.as_ref().map(|v| v.0.clone()),
        Some(vec![
            Value::BigInt(Some(1)),
            Value::BigInt(Some(1)),
            Value::BigInt(Some(2)),
        ])
    );

    let attach = statements
        .iter()
        .find(|stmt| stmt.sql.starts_with(r#"INSERT INTO "post_tag""#))
        .expect("attach statement");
    assert_eq!(
        attach.values.as_ref().map(|v| v.0.clone()),
        Some(vec![Value::BigInt(Some(1)), Value::BigInt(Some(3))])
    );

    let detach_at = statements.iter().position(|s| s.sql == detach.sql);
    let attach_at = statements.iter().position(|s| s.sql == attach.sql);
    assert!(detach_at < attach_at);
}
