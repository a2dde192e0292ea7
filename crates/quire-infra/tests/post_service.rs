use std::collections::BTreeSet;
use std::sync::Arc;

use quire_core::domain::{Category, Tag};
use quire_core::ports::BaseRepository;
use quire_core::{DomainError, PER_PAGE, PostInput, PostService};
use quire_infra::InMemoryStore;

fn store() -> Arc<InMemoryStore> {
    Arc::new(
        InMemoryStore::new()
            .with_categories([
                Category {
                    id: 1,
                    name: "News".to_string(),
                },
                Category {
                    id: 2,
                    name: "Guides".to_string(),
                },
            ])
            .with_tags((1..=3).map(|id| Tag {
                id,
                name: format!("tag-{id}"),
            })),
    )
}

fn service(store: &Arc<InMemoryStore>) -> PostService {
    PostService::new(store.clone(), store.clone(), store.clone())
}

fn hello() -> PostInput {
    PostInput {
        title: "Hello".to_string(),
        slug: "hello".to_string(),
        category_id: Some(1),
        creator: "Bob".to_string(),
        description: "x".to_string(),
        image: None,
        date_creation: "2020-01-01".to_string(),
        tags: vec![1, 2],
    }
}

async fn post_count(store: &InMemoryStore) -> usize {
    BaseRepository::<quire_core::domain::Post, i64>::all(store)
        .await
        .unwrap()
        .len()
}

fn validation_errors(result: Result<impl std::fmt::Debug, DomainError>) -> quire_core::FieldErrors {
    match result {
        Err(DomainError::Validation(errors)) => errors,
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_store_sets_owner_and_tags() {
    let store = store();
    let posts = service(&store);

    let post = posts.store(5, hello()).await.unwrap();

    assert_eq!(post.user_id, 5);
    assert_eq!(post.tag_ids, BTreeSet::from([1, 2]));

    let detail = posts.show(post.id).await.unwrap();
    assert_eq!(detail.post.slug, "hello");
    assert_eq!(detail.categories.len(), 2);
    assert_eq!(detail.tags.len(), 3);
}

#[tokio::test]
async fn test_store_missing_required_field_persists_nothing() {
    let store = store();
    let posts = service(&store);

    for strip in ["title", "slug", "category_id", "creator", "description", "date_creation"] {
        let mut input = hello();
        match strip {
            "title" => input.title.clear(),
            "slug" => input.slug.clear(),
            "category_id" => input.category_id = None,
            "creator" => input.creator.clear(),
            "description" => input.description.clear(),
            _ => input.date_creation.clear(),
        }

        let errors = validation_errors(posts.store(5, input).await);
        assert!(errors.has(strip), "expected an error on {strip}");
    }

    assert_eq!(post_count(&store).await, 0);
}

#[tokio::test]
async fn test_duplicate_slug_is_rejected() {
    let store = store();
    let posts = service(&store);
    posts.store(5, hello()).await.unwrap();

    let second = PostInput {
        title: "Another".to_string(),
        ..hello()
    };
    let errors = validation_errors(posts.store(7, second).await);

    assert_eq!(errors.first("slug"), Some("The slug has already been taken."));
    assert_eq!(post_count(&store).await, 1);
}

#[tokio::test]
async fn test_unknown_category_and_tags_are_rejected() {
    let store = store();
    let posts = service(&store);

    let input = PostInput {
        category_id: Some(99),
        tags: vec![1, 42],
        ..hello()
    };
    let errors = validation_errors(posts.store(5, input).await);

    assert_eq!(
        errors.first("category_id"),
        Some("The selected category id is invalid.")
    );
    assert_eq!(errors.first("tags"), Some("The selected tags is invalid."));
}

#[tokio::test]
async fn test_update_by_non_owner_is_forbidden() {
    let store = store();
    let posts = service(&store);
    let post = posts.store(5, hello()).await.unwrap();

    let attempt = PostInput {
        title: "Hijacked".to_string(),
        ..hello()
    };
    let result = posts.update(7, post.id, attempt).await;

    assert!(matches!(result, Err(DomainError::Forbidden)));
    let unchanged = posts.show(post.id).await.unwrap().post;
    assert_eq!(unchanged, post);
}

#[tokio::test]
async fn test_update_replaces_tag_set() {
    let store = store();
    let posts = service(&store);
    let post = posts.store(5, hello()).await.unwrap();

    let input = PostInput {
        tags: vec![3],
        ..hello()
    };
    let updated = posts.update(5, post.id, input).await.unwrap();

    assert_eq!(updated.tag_ids, BTreeSet::from([3]));
    assert_eq!(updated.user_id, 5);
    assert_eq!(
        posts.show(post.id).await.unwrap().post.tag_ids,
        BTreeSet::from([3])
    );
}

#[tokio::test]
async fn test_update_may_keep_own_slug_but_not_take_another() {
    let store = store();
    let posts = service(&store);
    let first = posts.store(5, hello()).await.unwrap();
    let second = posts
        .store(
            5,
            PostInput {
                slug: "second".to_string(),
                ..hello()
            },
        )
        .await
        .unwrap();

    let retitled = PostInput {
        title: "Hello, again".to_string(),
        ..hello()
    };
    assert!(posts.update(5, first.id, retitled).await.is_ok());

    let steal = PostInput {
        slug: "hello".to_string(),
        ..hello()
    };
    let errors = validation_errors(posts.update(5, second.id, steal).await);
    assert!(errors.has("slug"));
    assert_eq!(posts.show(second.id).await.unwrap().post.slug, "second");
}

#[tokio::test]
async fn test_invalid_update_leaves_record_unchanged() {
    let store = store();
    let posts = service(&store);
    let post = posts.store(5, hello()).await.unwrap();

    let input = PostInput {
        description: String::new(),
        ..hello()
    };
    validation_errors(posts.update(5, post.id, input).await);

    assert_eq!(posts.show(post.id).await.unwrap().post, post);
}

#[tokio::test]
async fn test_edit_requires_ownership() {
    let store = store();
    let posts = service(&store);
    let post = posts.store(5, hello()).await.unwrap();

    assert!(posts.edit(5, post.id).await.is_ok());
    assert!(matches!(
        posts.edit(7, post.id).await,
        Err(DomainError::Forbidden)
    ));
}

#[tokio::test]
async fn test_destroy_by_non_owner_is_forbidden() {
    let store = store();
    let posts = service(&store);
    let post = posts.store(5, hello()).await.unwrap();

    assert!(matches!(
        posts.destroy(7, post.id).await,
        Err(DomainError::Forbidden)
    ));
    assert!(posts.show(post.id).await.is_ok());
}

#[tokio::test]
async fn test_destroy_twice_is_not_found() {
    let store = store();
    let posts = service(&store);
    let post = posts.store(5, hello()).await.unwrap();

    posts.destroy(5, post.id).await.unwrap();

    assert!(matches!(
        posts.destroy(5, post.id).await,
        Err(DomainError::NotFound { id, .. }) if id == post.id
    ));
    assert!(matches!(
        posts.show(post.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_listings_paginate_at_thirty() {
    let store = store();
    let posts = service(&store);
    for i in 0..40 {
        let owner = if i < 32 { 5 } else { 7 };
        let input = PostInput {
            slug: format!("post-{i}"),
            ..hello()
        };
        posts.store(owner, input).await.unwrap();
    }

    let first = posts.list_all(1).await.unwrap();
    assert_eq!(first.items.len() as u64, PER_PAGE);
    assert_eq!(first.total, 40);
    assert_eq!(first.last_page(), 2);

    let mine = posts.list_owned_by(7, 1).await.unwrap();
    assert_eq!(mine.total, 8);
    assert!(mine.items.iter().all(|p| p.user_id == 7));

    let mine_page_two = posts.list_owned_by(5, 2).await.unwrap();
    assert_eq!(mine_page_two.items.len(), 2);
}

#[tokio::test]
async fn test_slugs_stay_unique_across_any_sequence() {
    let store = store();
    let posts = service(&store);
    let slugs = ["a", "b", "a", "c", "b"];

    for (i, slug) in slugs.iter().enumerate() {
        let input = PostInput {
            slug: slug.to_string(),
            ..hello()
        };
        let _ = posts.store(5, input).await;

        // Rename the first post onto each slug in turn.
        let rename = PostInput {
            slug: slugs[(i + 1) % slugs.len()].to_string(),
            ..hello()
        };
        let _ = posts.update(5, 1, rename).await;
    }

    let all = posts.list_all(1).await.unwrap();
    let distinct: BTreeSet<&str> = all.items.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(distinct.len(), all.items.len());
}
